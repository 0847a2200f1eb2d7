// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for teapot
//!
//! Every failure a caller can observe is an [`Error`]. Errors are grouped
//! into broad [`ErrorKind`]s so callers can react to the class of failure
//! (bad input, network trouble, a rejecting interceptor) without matching
//! every variant.

use std::fmt;

use thiserror::Error;

use crate::cookie::JarError;

/// Result type alias for teapot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which interceptor chain raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request interceptors, run before the request is sent
    Request,
    /// Response interceptors, run after the body has been drained
    Response,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Request => f.write_str("request"),
            Stage::Response => f.write_str("response"),
        }
    }
}

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed URL, header or body detected while building a request
    Construction,
    /// Network, TLS, timeout or cancellation failure while executing
    Transport,
    /// Raised by a request or response interceptor
    Interceptor,
    /// Malformed target handed to the cookie jar
    JarInput,
    /// Invalid configuration value
    ConfigValidation,
    /// Failure while importing persisted cookies
    CookieImport,
    /// Anything else
    Other,
}

/// Main error type for teapot
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Request executed without a URL
    #[error("No URL was set on the session")]
    MissingUrl,

    /// Header name or value could not be encoded
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Timeout error
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        url: Option<String>,
    },

    /// Request cancelled through its cancellation token
    #[error("Request to {url} was cancelled")]
    Cancelled { url: String },

    /// An interceptor aborted the chain
    #[error("{stage} interceptor failed: {source}")]
    Interceptor {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// Unexpected response status
    #[error("unexpected HTTP status code: '{status}'{}", expected_suffix(.expected))]
    Status { status: u16, expected: Option<u16> },

    /// Unexpected response content type
    #[error("unsupported HTTP content type: '{content_type}'{}", expected_suffix(.expected))]
    ContentType {
        content_type: String,
        expected: Option<String>,
    },

    /// User agent could not be used as a header value
    #[error("invalid user agent: '{0}'")]
    UserAgent(String),

    /// Cookie jar input error
    #[error("Cookie jar error: {0}")]
    Jar(#[from] JarError),

    /// Cookie handling error
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// No persisted cookies matched the requested hosts
    #[error("No cookies found{}", hosts_suffix(.hosts))]
    NoCookiesFound { hosts: Vec<String> },

    /// A cookie loader was used before a jar was attached
    #[error("No cookie jar attached")]
    NoJar,

    /// Configuration error
    #[error("Invalid configuration for '{field}': '{value}' ({reason})")]
    Config {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn expected_suffix<T: fmt::Display>(expected: &Option<T>) -> String {
    match expected {
        Some(e) => format!(" (expected '{}')", e),
        None => String::new(),
    }
}

fn hosts_suffix(hosts: &[String]) -> String {
    if hosts.is_empty() {
        String::new()
    } else {
        format!(" for: {:?}", hosts)
    }
}

impl Error {
    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error with URL
    pub fn timeout_with_url(
        operation: impl Into<String>,
        duration_ms: u64,
        url: impl Into<String>,
    ) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
            url: Some(url.into()),
        }
    }

    /// Wrap an error raised inside an interceptor chain
    pub fn interceptor(stage: Stage, source: Error) -> Self {
        Error::Interceptor {
            stage,
            source: Box::new(source),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Url(_)
            | Error::MissingUrl
            | Error::InvalidHeader { .. }
            | Error::Serialization(_) => ErrorKind::Construction,
            Error::Http(_) | Error::Timeout { .. } | Error::Cancelled { .. } => {
                ErrorKind::Transport
            }
            Error::Interceptor { .. }
            | Error::Status { .. }
            | Error::ContentType { .. }
            | Error::UserAgent(_) => ErrorKind::Interceptor,
            Error::Jar(_) => ErrorKind::JarInput,
            Error::Config { .. } => ErrorKind::ConfigValidation,
            Error::Cookie(_) | Error::NoCookiesFound { .. } | Error::NoJar | Error::Io(_) => {
                ErrorKind::CookieImport
            }
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// The error an interceptor originally returned, or `self`
    pub fn root(&self) -> &Error {
        match self {
            Error::Interceptor { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self.root() {
            Error::Timeout { url: Some(u), .. } => Some(u),
            Error::Cancelled { url } => Some(url),
            Error::Http(e) => e.url().map(|u| u.as_str()),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::MissingUrl.kind(), ErrorKind::Construction);
        assert_eq!(
            Error::timeout_with_url("fetch", 100, "https://example.com").kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            Error::config("log_level", "loud", "unknown level").kind(),
            ErrorKind::ConfigValidation
        );
        assert_eq!(Error::NoJar.kind(), ErrorKind::CookieImport);
    }

    #[test]
    fn test_interceptor_root() {
        let err = Error::interceptor(
            Stage::Response,
            Error::Status {
                status: 404,
                expected: Some(200),
            },
        );

        assert_eq!(err.kind(), ErrorKind::Interceptor);
        assert_eq!(err.status_code(), Some(404));
        assert!(matches!(err.root(), Error::Status { .. }));
        assert_eq!(
            err.to_string(),
            "response interceptor failed: unexpected HTTP status code: '404' (expected '200')"
        );
    }

    #[test]
    fn test_timeout_error() {
        let err = Error::timeout_with_url("response headers", 5000, "https://example.com");

        assert!(err.is_timeout());
        assert!(err.is_transport());
        assert_eq!(err.url(), Some("https://example.com"));
    }

    #[test]
    fn test_no_cookies_message() {
        assert_eq!(Error::NoCookiesFound { hosts: vec![] }.to_string(), "No cookies found");
        assert_eq!(
            Error::NoCookiesFound {
                hosts: vec!["example.com".into()]
            }
            .to_string(),
            "No cookies found for: [\"example.com\"]"
        );
    }
}
