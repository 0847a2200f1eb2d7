// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Stock interceptors

use base64::Engine;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};

use super::{RequestInterceptor, ResponseInterceptor};
use crate::error::{Error, Result};
use crate::http::{headers, Request, Response};

/// Desktop browser user agents rotated by [`random_user_agent`]
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.2; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Set the User-Agent header
pub fn set_user_agent(user_agent: &str) -> impl RequestInterceptor {
    let user_agent = user_agent.to_string();
    move |request: &mut Request| -> Result<()> {
        let value = HeaderValue::from_str(&user_agent)
            .map_err(|_| Error::UserAgent(user_agent.clone()))?;
        request.headers.insert(USER_AGENT, value);
        Ok(())
    }
}

/// Set a User-Agent picked at random from [`USER_AGENTS`] on every request
pub fn random_user_agent() -> impl RequestInterceptor {
    |request: &mut Request| -> Result<()> {
        let ua = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        request.headers.insert(USER_AGENT, HeaderValue::from_static(ua));
        Ok(())
    }
}

/// Set a header, replacing existing values
pub fn set_header(name: impl Into<String>, value: impl Into<String>) -> HeaderInjector {
    HeaderInjector::new().header(name, value)
}

/// Send `Authorization: Bearer <token>`
pub fn bearer_auth(token: impl Into<String>) -> HeaderInjector {
    HeaderInjector::new().bearer_token(token)
}

/// Send `Authorization: Basic <base64(user:pass)>`
pub fn basic_auth(username: &str, password: &str) -> HeaderInjector {
    HeaderInjector::new().basic_auth(username, password)
}

/// Log every outbound request
pub fn log_request() -> RequestLogger {
    RequestLogger::default()
}

/// Log every received response
pub fn log_response() -> RequestLogger {
    RequestLogger::default()
}

/// Reject responses whose status is not `status`
pub fn expect_status(status: u16) -> impl ResponseInterceptor {
    move |response: &mut Response| -> Result<()> {
        if response.status_code() != status {
            return Err(Error::Status {
                status: response.status_code(),
                expected: Some(status),
            });
        }
        Ok(())
    }
}

/// Reject responses without a 2xx status
pub fn expect_success() -> impl ResponseInterceptor {
    |response: &mut Response| -> Result<()> {
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status_code(),
                expected: None,
            });
        }
        Ok(())
    }
}

/// Reject responses whose media type is not `content_type`.
/// Parameters such as `charset` are ignored.
pub fn expect_content_type(content_type: &str) -> impl ResponseInterceptor {
    let expected = content_type.to_lowercase();
    move |response: &mut Response| -> Result<()> {
        let actual = response.content_type().unwrap_or("");
        let media = actual.split(';').next().unwrap_or("").trim().to_lowercase();
        if media != expected {
            return Err(Error::ContentType {
                content_type: actual.to_string(),
                expected: Some(expected.clone()),
            });
        }
        Ok(())
    }
}

/// Injects fixed headers, optionally only for some domains
#[derive(Debug, Clone, Default)]
pub struct HeaderInjector {
    /// Headers to inject into every request
    headers: Vec<(String, String)>,
    /// Domains to inject into (empty = all)
    domains: Vec<String>,
}

impl HeaderInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bearer token
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.header(headers::AUTHORIZATION, format!("Bearer {}", token.into()))
    }

    /// Add basic auth
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        self.header(headers::AUTHORIZATION, format!("Basic {}", encoded))
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Restrict to hosts equal to or under one of `domains`
    pub fn for_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    fn applies_to(&self, request: &Request) -> bool {
        if self.domains.is_empty() {
            return true;
        }

        request
            .host()
            .map(|host| {
                self.domains
                    .iter()
                    .any(|d| host == d || host.ends_with(&format!(".{}", d)))
            })
            .unwrap_or(false)
    }
}

impl RequestInterceptor for HeaderInjector {
    fn intercept(&self, request: &mut Request) -> Result<()> {
        if !self.applies_to(request) {
            return Ok(());
        }

        for (name, value) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_header(name.as_str(), e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_header(name.as_str(), e))?;
            request.headers.insert(header, value);
        }
        Ok(())
    }
}

/// Logs requests and responses through `tracing`
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    /// Log request bodies
    pub log_bodies: bool,
    /// Only log URLs containing this string
    pub url_filter: Option<String>,
}

impl RequestLogger {
    fn matches(&self, url: &url::Url) -> bool {
        self.url_filter
            .as_ref()
            .map_or(true, |filter| url.as_str().contains(filter))
    }
}

impl RequestInterceptor for RequestLogger {
    fn intercept(&self, request: &mut Request) -> Result<()> {
        if !self.matches(&request.url) {
            return Ok(());
        }

        tracing::info!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            "Request"
        );

        if self.log_bodies {
            if let Some(ref body) = request.body {
                tracing::debug!(body = ?String::from_utf8_lossy(body), "Request body");
            }
        }
        Ok(())
    }
}

impl ResponseInterceptor for RequestLogger {
    fn intercept(&self, response: &mut Response) -> Result<()> {
        if !self.matches(&response.url) {
            return Ok(());
        }

        tracing::info!(
            url = %response.url,
            status = %response.status,
            time_ms = response.response_time_ms,
            redirected = response.redirected,
            "Response"
        );
        Ok(())
    }
}
