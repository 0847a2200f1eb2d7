// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session options
//!
//! Each function returns a [`SessionOption`]. Scalar options overwrite,
//! header and interceptor options append unless the `set_`/`replace_`
//! variant is used. Options that change how the client is built detach the
//! session from its current client.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::Span;

use super::session::Session;
use crate::cookie::Jar;
use crate::http::{ClientConfig, TlsConfig, TransportConfig};
use crate::interceptor::{RequestChain, RequestInterceptor, ResponseChain, ResponseInterceptor};

/// A reusable, cloneable session modification
pub type SessionOption = Arc<dyn Fn(&mut Session) + Send + Sync>;

/// Record executions inside `span`
pub fn logger(span: Span) -> SessionOption {
    Arc::new(move |session: &mut Session| session.span = span.clone())
}

/// Client configuration
pub fn config(config: ClientConfig) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        session.fork_client();
        session.settings.config = config.clone();
    })
}

/// Transport configuration
pub fn transport(transport: TransportConfig) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        session.fork_client();
        session.settings.transport = Some(transport.clone());
    })
}

/// TLS configuration
pub fn tls(tls: TlsConfig) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        session.fork_client();
        session.settings.tls = Some(tls.clone());
    })
}

/// Append headers to the snapshot
pub fn add_headers(headers: HeaderMap) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        for (name, value) in headers.iter() {
            session.headers.append(name.clone(), value.clone());
        }
    })
}

/// Replace the header snapshot
pub fn set_headers(headers: HeaderMap) -> SessionOption {
    Arc::new(move |session: &mut Session| session.headers = headers.clone())
}

/// Use `jar` for cookies
pub fn cookie_jar(jar: Arc<Jar>) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        session.fork_client();
        session.settings.jar = Some(jar.clone());
        session.settings.config.no_cookie_jar = false;
    })
}

/// Disable cookies
pub fn no_cookie_jar() -> SessionOption {
    Arc::new(|session: &mut Session| {
        session.fork_client();
        session.settings.config.no_cookie_jar = true;
    })
}

/// Append a request interceptor
pub fn on_request(interceptor: Arc<dyn RequestInterceptor>) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        session.on_request = session.on_request.with(interceptor.clone());
    })
}

/// Append a response interceptor
pub fn on_response(interceptor: Arc<dyn ResponseInterceptor>) -> SessionOption {
    Arc::new(move |session: &mut Session| {
        session.on_response = session.on_response.with(interceptor.clone());
    })
}

/// Replace all request interceptors
pub fn replace_on_request(chain: RequestChain) -> SessionOption {
    Arc::new(move |session: &mut Session| session.on_request = chain.clone())
}

/// Replace all response interceptors
pub fn replace_on_response(chain: ResponseChain) -> SessionOption {
    Arc::new(move |session: &mut Session| session.on_response = chain.clone())
}
