// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request/response interceptor pipeline
//!
//! Request interceptors run in registration order before a request is
//! sent; response interceptors run in registration order after the body
//! has been drained. The first interceptor returning an error stops its
//! chain and the error is reported on the
//! [`FetchResult`](crate::session::FetchResult).
//!
//! # Example
//!
//! ```rust,no_run
//! use teapot::interceptor::{self, RequestInterceptor};
//! use teapot::http::Request;
//!
//! struct Tenant(String);
//!
//! impl RequestInterceptor for Tenant {
//!     fn intercept(&self, request: &mut Request) -> teapot::Result<()> {
//!         request.set_header("x-tenant", &self.0)
//!     }
//! }
//!
//! let trace = interceptor::request_fn(|request| request.set_header("x-trace", "1"));
//! ```

mod builtin;

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result, Stage};
use crate::http::{Request, Response};

pub use builtin::{
    basic_auth, bearer_auth, expect_content_type, expect_status, expect_success, log_request,
    log_response, random_user_agent, set_header, set_user_agent, HeaderInjector, RequestLogger,
    USER_AGENTS,
};

/// Transforms or rejects an outbound request
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut Request) -> Result<()>;
}

/// Transforms or rejects a received response
pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, response: &mut Response) -> Result<()>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync,
{
    fn intercept(&self, request: &mut Request) -> Result<()> {
        self(request)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&mut Response) -> Result<()> + Send + Sync,
{
    fn intercept(&self, response: &mut Response) -> Result<()> {
        self(response)
    }
}

/// Pin a closure's signature as a request interceptor
pub fn request_fn<F>(f: F) -> F
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
{
    f
}

/// Pin a closure's signature as a response interceptor
pub fn response_fn<F>(f: F) -> F
where
    F: Fn(&mut Response) -> Result<()> + Send + Sync + 'static,
{
    f
}

/// Immutable, cheaply cloned list of interceptors.
///
/// Appending returns a new chain; sessions sharing the old chain are not
/// affected.
pub struct Chain<I: ?Sized> {
    interceptors: Arc<[Arc<I>]>,
}

/// Request interceptor chain
pub type RequestChain = Chain<dyn RequestInterceptor>;
/// Response interceptor chain
pub type ResponseChain = Chain<dyn ResponseInterceptor>;

impl<I: ?Sized> Chain<I> {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            interceptors: Arc::from(Vec::new()),
        }
    }

    /// Create a chain from an ordered list
    pub fn from_vec(interceptors: Vec<Arc<I>>) -> Self {
        Self {
            interceptors: Arc::from(interceptors),
        }
    }

    /// A new chain with `interceptor` appended
    pub fn with(&self, interceptor: Arc<I>) -> Self {
        let mut interceptors: Vec<Arc<I>> = self.interceptors.to_vec();
        interceptors.push(interceptor);
        Self::from_vec(interceptors)
    }

    /// Number of interceptors
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Whether both chains share the same list
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.interceptors, &other.interceptors)
    }
}

impl RequestChain {
    /// Run every interceptor in order, stopping at the first error
    pub fn run(&self, request: &mut Request) -> Result<()> {
        for (index, interceptor) in self.interceptors.iter().enumerate() {
            if let Err(err) = interceptor.intercept(request) {
                tracing::debug!(index, error = %err, url = %request.url, "request interceptor failed");
                return Err(Error::interceptor(Stage::Request, err));
            }
        }
        Ok(())
    }
}

impl ResponseChain {
    /// Run every interceptor in order, stopping at the first error
    pub fn run(&self, response: &mut Response) -> Result<()> {
        for (index, interceptor) in self.interceptors.iter().enumerate() {
            if let Err(err) = interceptor.intercept(response) {
                tracing::debug!(index, error = %err, url = %response.url, "response interceptor failed");
                return Err(Error::interceptor(Stage::Response, err));
            }
        }
        Ok(())
    }
}

impl<I: ?Sized> Clone for Chain<I> {
    fn clone(&self) -> Self {
        Self {
            interceptors: self.interceptors.clone(),
        }
    }
}

impl<I: ?Sized> Default for Chain<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> fmt::Debug for Chain<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.len()).finish()
    }
}
