// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Outbound HTTP request

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::error::{Error, Result};

/// HTTP request as seen by request interceptors
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request without headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set a header, replacing existing values
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_header(name, e))?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e))?;
        self.headers.insert(header, value);
        Ok(())
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the host
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Get the body length
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }

    /// Build the equivalent reqwest request on `client`
    pub(crate) fn to_reqwest(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut builder = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());

        if let Some(ref body) = self.body {
            builder = builder.body(body.clone());
        }
        builder
    }
}

/// Encode pairs as `application/x-www-form-urlencoded`
pub(crate) fn form_encode<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencode(k.as_ref()), urlencode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            ' ' => result.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new(Method::GET, Url::parse("https://example.com/path").unwrap())
    }

    #[test]
    fn test_set_header() {
        let mut req = request();
        req.set_header("x-custom", "value").unwrap();
        req.set_header("x-custom", "other").unwrap();

        assert_eq!(req.header("x-custom"), Some("other"));
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.host(), Some("example.com"));
    }

    #[test]
    fn test_invalid_header() {
        let mut req = request();
        let err = req.set_header("bad header", "v").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
        assert!(req.set_header("x-ok", "line\nbreak").is_err());
    }

    #[test]
    fn test_form_encode() {
        assert_eq!(
            form_encode(&[("q", "a b"), ("lang", "fi/sv"), ("ä", "1")]),
            "q=a+b&lang=fi%2Fsv&%C3%A4=1"
        );
    }
}
