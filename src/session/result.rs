// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Outcome of one request execution

use std::fmt::Write;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::http::{Request, Response};

/// Request, response, drained body and error of one execution.
///
/// Which parts are populated tells how far the execution got: a
/// construction error leaves everything but `error` empty, a transport
/// error keeps the request, a body or response interceptor error keeps
/// the response as well.
///
/// The whole body is held in memory; not meant for large downloads.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub request: Option<Request>,
    pub response: Option<Response>,
    pub body: Bytes,
    pub error: Option<Error>,
}

impl FetchResult {
    pub(crate) fn failed(request: Option<Request>, response: Option<Response>, error: Error) -> Self {
        Self {
            request,
            response,
            body: Bytes::new(),
            error: Some(error),
        }
    }

    /// Whether the execution completed without error
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The error, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Status code, 0 when no response was received
    pub fn status_code(&self) -> u16 {
        self.response.as_ref().map_or(0, Response::status_code)
    }

    /// One-line summary: `<status>  <method>  <url>`
    pub fn status_message(&self) -> String {
        let response = match self.response {
            Some(ref response) => response,
            None => return "-  -  -".to_string(),
        };

        match self.request {
            Some(ref request) => format!(
                "{}  {}  {}",
                response.status_line(),
                request.method,
                request.url
            ),
            None => format!("{}  -  -", response.status_line()),
        }
    }

    /// Raw body bytes
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, invalid UTF-8 replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    /// Final URL of the response, or the request URL
    pub fn location(&self) -> Option<&url::Url> {
        self.response
            .as_ref()
            .map(|r| &r.url)
            .or_else(|| self.request.as_ref().map(|r| &r.url))
    }

    /// Convert into a `Result`, keeping the value only on success
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Multi-line human readable dump of request, response and body
    pub fn dump(&self) -> String {
        let mut dump = String::new();

        if let Some(ref request) = self.request {
            let _ = write!(dump, "\n{} {}", request.method, request.url);
            for (name, value) in request.headers.iter() {
                let _ = write!(dump, "\n\t{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
            }
        }
        if let Some(ref response) = self.response {
            let _ = write!(
                dump,
                "\n{}\n{} {}",
                response.protocol(),
                response.status_line(),
                response.url
            );
            for (name, value) in response.headers.iter() {
                let _ = write!(dump, "\n\t{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
            }
        }
        if let Some(ref error) = self.error {
            let _ = write!(dump, "\nERROR: {}", error);
        }
        let _ = write!(dump, "\nBODY: {}", self.text());
        dump
    }
}
