// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer
//!
//! Builds one pooled [`Client`] per root configuration and provides the
//! request and response types interceptors operate on.

mod client;
mod config;
mod request;
mod response;

pub use client::{Client, ClientSettings, HostLimiter};
pub use config::{
    ClientConfig, TlsConfig, TlsSettings, TlsVersion, TransportConfig, TransportSettings,
    DEFAULT_MAX_CONNS_PER_HOST, DEFAULT_MAX_IDLE_CONNS, DEFAULT_MAX_IDLE_CONNS_PER_HOST,
};
pub use request::Request;
pub use response::Response;

pub(crate) use client::millis;
pub(crate) use request::form_encode;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("teapot/", env!("CARGO_PKG_VERSION"));

/// Common HTTP headers
pub mod headers {
    pub const ACCEPT: &str = "accept";
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const USER_AGENT: &str = "user-agent";
}
