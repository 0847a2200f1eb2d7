// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Teapot - Composable HTTP Sessions
//!
//! An HTTP client library built around immutable-looking sessions that share
//! one pooled client, with a cookie jar that tolerates cookie names real
//! servers send but strict parsers reject.
//!
//! ## Features
//!
//! - Lenient cookie jar: nonconforming names are mapped to opaque tokens
//! - Strict mode: standard cookie handling, invalid names dropped
//! - Sessions: cheap copy-on-write request descriptions sharing one client
//! - Interceptors: ordered request and response hooks with short-circuit
//! - Layered configuration: client, transport and TLS settings
//! - Per-host connection limits
//! - Cookie import from JSON exports
//!
//! ## Example
//!
//! ```rust,no_run
//! use teapot::interceptor::{expect_status, set_user_agent};
//! use teapot::{Configure, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::builder()
//!         .on_request(set_user_agent("teapot-example/1.0"))
//!         .on_response(expect_status(200))
//!         .build();
//!
//!     let result = session.url("https://example.com").get().await;
//!     println!("{}", result.status_message());
//!
//!     let result = result.into_result()?;
//!     println!("{} bytes", result.content().len());
//!
//!     Ok(())
//! }
//! ```

pub mod cookie;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod logging;
pub mod session;

// Re-exports for convenience

// Errors
pub use error::{Error, ErrorKind, Result, Stage};

// Cookies
pub use cookie::{CookieLoader, Jar, JarBuilder, JarError, JsonCookieLoader};

// HTTP client and configuration
pub use http::{Client, ClientConfig, Request, Response, TlsConfig, TlsVersion, TransportConfig};

// Interceptors
pub use interceptor::{RequestChain, RequestInterceptor, ResponseChain, ResponseInterceptor};

// Sessions
pub use session::{Builder, Configure, FetchResult, Mutator, Session, SessionOption};

// Logging
pub use logging::{LogConfig, LogFormat, LogLevel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
