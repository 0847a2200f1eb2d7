// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session construction
//!
//! A [`Builder`] accumulates [`SessionOption`]s and applies them in one of
//! three ways:
//!
//! - [`Builder::apply`] mutates an existing session in place
//! - [`Builder::make`] applies to a clone, leaving the original untouched
//! - [`Builder::build`] applies to a fresh, empty session
//!
//! [`Session::mutate`] returns a [`Mutator`], a builder bound to a clone of
//! the session.
//!
//! # Example
//!
//! ```rust,no_run
//! use teapot::interceptor::{bearer_auth, expect_success};
//! use teapot::{Configure, Session};
//!
//! # async fn run() {
//! let api = Session::builder()
//!     .on_request(bearer_auth("secret"))
//!     .on_response(expect_success())
//!     .build();
//!
//! let result = api.url("https://api.example.com/v1/items").get().await;
//! println!("{}", result.status_message());
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::Span;

use super::options::{self, SessionOption};
use super::session::Session;
use crate::cookie::Jar;
use crate::http::{ClientConfig, TlsConfig, TransportConfig};
use crate::interceptor::{RequestChain, RequestInterceptor, ResponseChain, ResponseInterceptor};

/// Option-accumulating configuration shared by [`Builder`] and [`Mutator`]
pub trait Configure: Sized {
    /// Append an option
    fn push(self, option: SessionOption) -> Self;

    /// Append a custom option
    fn option<F>(self, option: F) -> Self
    where
        F: Fn(&mut Session) + Send + Sync + 'static,
    {
        self.push(Arc::new(option))
    }

    /// Record executions inside `span`
    fn logger(self, span: Span) -> Self {
        self.push(options::logger(span))
    }

    /// Client configuration
    fn config(self, config: ClientConfig) -> Self {
        self.push(options::config(config))
    }

    /// Transport configuration
    fn transport(self, transport: TransportConfig) -> Self {
        self.push(options::transport(transport))
    }

    /// TLS configuration
    fn tls(self, tls: TlsConfig) -> Self {
        self.push(options::tls(tls))
    }

    /// Append headers to the snapshot
    fn add_headers(self, headers: HeaderMap) -> Self {
        self.push(options::add_headers(headers))
    }

    /// Replace the header snapshot
    fn set_headers(self, headers: HeaderMap) -> Self {
        self.push(options::set_headers(headers))
    }

    /// Use `jar` for cookies
    fn cookie_jar(self, jar: Arc<Jar>) -> Self {
        self.push(options::cookie_jar(jar))
    }

    /// Disable cookies
    fn no_cookie_jar(self) -> Self {
        self.push(options::no_cookie_jar())
    }

    /// Append a request interceptor
    fn on_request<I: RequestInterceptor + 'static>(self, interceptor: I) -> Self {
        self.push(options::on_request(Arc::new(interceptor)))
    }

    /// Append a response interceptor
    fn on_response<I: ResponseInterceptor + 'static>(self, interceptor: I) -> Self {
        self.push(options::on_response(Arc::new(interceptor)))
    }

    /// Replace all request interceptors
    fn replace_on_request(self, chain: RequestChain) -> Self {
        self.push(options::replace_on_request(chain))
    }

    /// Replace all response interceptors
    fn replace_on_response(self, chain: ResponseChain) -> Self {
        self.push(options::replace_on_response(chain))
    }
}

/// Ordered list of session options
#[derive(Clone, Default)]
pub struct Builder {
    options: Vec<SessionOption>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accumulated options
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Check if no option has been added
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Apply every option to `session` in place
    pub fn apply<'a>(&self, session: &'a mut Session) -> &'a mut Session {
        for option in &self.options {
            option(session);
        }
        session
    }

    /// Apply every option to a clone of `session`
    pub fn make(&self, session: &Session) -> Session {
        let mut next = session.clone();
        self.apply(&mut next);
        next
    }

    /// Apply every option to a new session
    pub fn build(&self) -> Session {
        let mut session = Session::new();
        self.apply(&mut session);
        session
    }
}

impl Configure for Builder {
    fn push(mut self, option: SessionOption) -> Self {
        self.options.push(option);
        self
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("options", &self.options.len())
            .finish()
    }
}

/// Builder bound to a copy of an existing session
#[derive(Debug)]
pub struct Mutator {
    base: Session,
    builder: Builder,
}

impl Mutator {
    pub(crate) fn new(base: Session) -> Self {
        Self {
            base,
            builder: Builder::new(),
        }
    }

    /// The modified session
    pub fn make(self) -> Session {
        let mut session = self.base;
        self.builder.apply(&mut session);
        session
    }
}

impl Configure for Mutator {
    fn push(mut self, option: SessionOption) -> Self {
        self.builder = self.builder.push(option);
        self
    }
}
