// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Standards-conformant cookie storage
//!
//! [`MemoryStorage`] follows RFC 6265 closely, including its cookie-name
//! grammar: a cookie whose name is not an RFC 2616 token is dropped
//! without any error. Real servers routinely send such names, which is
//! why [`Jar`](super::Jar) normally sits in front of the storage.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use super::record::{domain_matches, Cookie};

/// Backing store the jar delegates to
pub trait CookieStorage: Send + Sync + fmt::Debug {
    /// Store cookies received from `target`. Invalid cookies are dropped.
    fn store(&self, target: &Url, cookies: Vec<Cookie>);

    /// Cookies that would be sent to `target`
    fn matching(&self, target: &Url) -> Vec<Cookie>;

    /// Number of stored cookies
    fn len(&self) -> usize;

    /// Check if the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    cookie: Cookie,
    host_only: bool,
}

/// Thread-safe in-memory cookie storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Entry>>>,
}

impl MemoryStorage {
    /// Create a new empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    fn insert(&self, entry: Entry) {
        let mut bucket = self.cookies.entry(entry.cookie.domain.clone()).or_default();
        bucket.retain(|e| e.cookie.name != entry.cookie.name || e.cookie.path != entry.cookie.path);
        bucket.push(entry);
    }

    fn remove(&self, domain: &str, path: &str, name: &str) {
        if let Some(mut bucket) = self.cookies.get_mut(domain) {
            bucket.retain(|e| e.cookie.name != name || e.cookie.path != path);
        }
    }

    fn remove_expired(&self) {
        for mut bucket in self.cookies.iter_mut() {
            bucket.value_mut().retain(|e| !e.cookie.is_expired());
        }
    }
}

impl CookieStorage for MemoryStorage {
    fn store(&self, target: &Url, cookies: Vec<Cookie>) {
        let host = match target.host_str() {
            Some(h) if !h.is_empty() => h.to_lowercase(),
            _ => return,
        };

        for mut cookie in cookies {
            if !is_valid_name(&cookie.name) {
                tracing::trace!(name = %cookie.name, "dropping cookie with invalid name");
                continue;
            }

            let host_only = cookie.domain.is_empty();
            if host_only {
                cookie.domain = host.clone();
            } else {
                cookie.domain = cookie.domain.trim_start_matches('.').to_lowercase();
                let is_ip = host.parse::<IpAddr>().is_ok()
                    || host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>().is_ok();
                if (is_ip && cookie.domain != host) || !domain_matches(&host, &cookie.domain) {
                    tracing::trace!(
                        name = %cookie.name,
                        domain = %cookie.domain,
                        host = %host,
                        "dropping cookie for foreign domain"
                    );
                    continue;
                }
            }

            if !cookie.path.starts_with('/') {
                cookie.path = default_path(target.path());
            }

            if cookie.is_expired() {
                self.remove(&cookie.domain, &cookie.path, &cookie.name);
                continue;
            }

            self.insert(Entry { cookie, host_only });
        }
    }

    fn matching(&self, target: &Url) -> Vec<Cookie> {
        self.remove_expired();

        let host = target.host_str().unwrap_or("").to_lowercase();
        let mut result = Vec::new();

        for bucket in self.cookies.iter() {
            for entry in bucket.value().iter() {
                if entry.host_only && entry.cookie.domain != host {
                    continue;
                }
                if entry.cookie.matches(target) {
                    result.push(entry.cookie.clone());
                }
            }
        }

        // Longer paths first, as user agents send them
        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        result
    }

    fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }
}

/// RFC 6265 cookie-name grammar: an RFC 2616 token
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            (0x21..0x7f).contains(&b)
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                        | b'{'
                        | b'}'
                )
        })
}

/// RFC 6265 §5.1.4 default-path
fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => request_path[..i].to_string(),
    }
}
