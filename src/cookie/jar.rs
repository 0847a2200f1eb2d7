// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Lenient cookie jar
//!
//! A standards-conformant store silently ignores any cookie whose name
//! breaks the RFC 6265 grammar. Plenty of real servers send such names and
//! still expect them back, and the silent drop is very hard to diagnose.
//! [`Jar`] stores every cookie under a generated token name that the store
//! accepts, and translates the token back when cookies are read.
//!
//! Like the store it wraps, the jar never returns errors. Bad input is
//! reported to an error handler and, optionally, an error channel.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::header::HeaderValue;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use super::mapping::NameMapping;
use super::record::Cookie;
use super::storage::{CookieStorage, MemoryStorage};

/// Input rejected by the jar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JarError {
    /// Target URL lacks a scheme or a host
    #[error("empty input: target '{target}' has no {missing} ({cookies} cookies)")]
    IncompleteTarget {
        target: String,
        missing: &'static str,
        cookies: usize,
    },
}

/// Error handler hook.
///
/// Returning `true` marks the error as handled. Returning `false`
/// escalates it to the jar's error channel, if one is registered. The
/// offending call stores nothing in either case.
pub type ErrorHandler = Arc<dyn Fn(&JarError) -> bool + Send + Sync>;

/// Cookie jar scoped by scheme and host
pub struct Jar {
    strict: bool,
    storage: Arc<dyn CookieStorage>,
    names: Mutex<NameMapping>,
    handler: Option<ErrorHandler>,
    errors: Option<UnboundedSender<JarError>>,
}

impl Jar {
    /// Create a lenient jar over a fresh [`MemoryStorage`]
    pub fn new() -> Self {
        JarBuilder::new().build()
    }

    /// Start configuring a jar
    pub fn builder() -> JarBuilder {
        JarBuilder::new()
    }

    /// Whether cookie names pass through untouched
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Store cookies received from `target`
    pub fn set_cookies(&self, target: &Url, cookies: Vec<Cookie>) {
        self.store_cookies(target, cookies);
    }

    /// Cookies for the scheme and host of `target`, under their original names
    pub fn cookies(&self, target: &Url) -> Vec<Cookie> {
        self.lookup(target)
    }

    /// Number of cookies held by the underlying storage
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the jar is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of cookie names that have been given a token
    pub fn mapped_names(&self) -> usize {
        self.names.lock().len()
    }

    /// Token currently standing in for `name`, if any
    pub fn token_for(&self, name: &str) -> Option<String> {
        self.names.lock().existing_token(name).map(str::to_string)
    }

    fn store_cookies(&self, target: &Url, cookies: Vec<Cookie>) {
        if let Err(err) = check_target(target, cookies.len()) {
            self.report(err);
            return;
        }

        let cleaned: Vec<Cookie> = if self.strict {
            cookies
        } else {
            let mut names = self.names.lock();
            cookies
                .into_iter()
                .map(|mut cookie| {
                    cookie.name = names.token_for(&cookie.name);
                    cookie
                })
                .collect()
        };

        if cleaned.is_empty() {
            tracing::debug!(url = %target, "no cookies to set");
        }

        self.storage.store(target, cleaned);
    }

    fn lookup(&self, target: &Url) -> Vec<Cookie> {
        if check_target(target, 0).is_err() {
            tracing::error!(url = %target, "cookie lookup without scheme or host");
            return Vec::new();
        }

        let mut query = target.clone();
        query.set_path("/");
        query.set_query(None);
        query.set_fragment(None);

        let mut cookies = self.storage.matching(&query);
        if cookies.is_empty() {
            tracing::debug!(
                url = %query,
                strict = self.strict,
                stored = self.storage.len(),
                "no cookies found for target"
            );
            return cookies;
        }

        let names = self.names.lock();
        for cookie in cookies.iter_mut() {
            if let Some(original) = names.original(&cookie.name) {
                cookie.name = original.to_string();
            }
        }
        cookies
    }

    fn report(&self, err: JarError) {
        tracing::error!(error = %err, "cookie jar rejected input");

        let handled = match &self.handler {
            Some(handler) => handler(&err),
            None => self.default_error_handler(&err),
        };

        if !handled {
            tracing::warn!(error = %err, "cookie jar error escalated");
            if let Some(ref tx) = self.errors {
                let _ = tx.send(err);
            }
        }
    }

    fn default_error_handler(&self, err: &JarError) -> bool {
        if let Some(ref tx) = self.errors {
            let _ = tx.send(err.clone());
        }
        true
    }
}

impl Default for Jar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Jar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jar")
            .field("strict", &self.strict)
            .field("storage", &self.storage)
            .field("mapped_names", &self.mapped_names())
            .field("custom_handler", &self.handler.is_some())
            .field("error_channel", &self.errors.is_some())
            .finish()
    }
}

impl reqwest::cookie::CookieStore for Jar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies = cookie_headers
            .filter_map(|value| value.to_str().ok())
            .filter_map(Cookie::parse)
            .collect();
        self.store_cookies(url, cookies);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .lookup(url)
            .iter()
            .map(Cookie::to_header_value)
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

fn check_target(target: &Url, cookies: usize) -> Result<(), JarError> {
    let missing = if target.scheme().is_empty() {
        Some("scheme")
    } else if target.host_str().map_or(true, str::is_empty) {
        Some("host")
    } else {
        None
    };

    match missing {
        Some(missing) => Err(JarError::IncompleteTarget {
            target: target.to_string(),
            missing,
            cookies,
        }),
        None => Ok(()),
    }
}

/// Builder for [`Jar`]
#[derive(Default)]
pub struct JarBuilder {
    strict: bool,
    storage: Option<Arc<dyn CookieStorage>>,
    handler: Option<ErrorHandler>,
    errors: Option<UnboundedSender<JarError>>,
}

impl JarBuilder {
    /// Create a builder for a lenient jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass cookie names through unmodified
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Use an existing storage instead of a fresh [`MemoryStorage`]
    pub fn storage(mut self, storage: Arc<dyn CookieStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Install an error handler
    pub fn handle_errors<F>(mut self, handler: F) -> Self
    where
        F: Fn(&JarError) -> bool + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Register a channel receiving jar errors
    pub fn error_channel(mut self, tx: UnboundedSender<JarError>) -> Self {
        self.errors = Some(tx);
        self
    }

    /// Build a jar. Every call returns an independent name mapping.
    pub fn build(&self) -> Jar {
        let storage = match self.storage {
            Some(ref storage) => storage.clone(),
            None => {
                tracing::debug!("new in-memory cookie storage created");
                Arc::new(MemoryStorage::new())
            }
        };

        Jar {
            strict: self.strict,
            storage,
            names: Mutex::new(NameMapping::new()),
            handler: self.handler.clone(),
            errors: self.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::cookie::CookieStore;
    use tokio::sync::mpsc;

    use super::*;

    fn example() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_valid_name_round_trip() {
        let jar = Jar::new();
        jar.set_cookies(&example(), vec![Cookie::new("valid_name", "v1")]);

        let cookies = jar.cookies(&example());
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "valid_name");
        assert_eq!(cookies[0].value, "v1");
    }

    #[test]
    fn test_nonconforming_name_round_trip() {
        let jar = Jar::new();
        jar.set_cookies(&example(), vec![Cookie::new("bad name", "v2")]);

        let cookies = jar.cookies(&example());
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "bad name");
        assert_eq!(cookies[0].value, "v2");
    }

    #[test]
    fn test_token_reused_across_calls() {
        let jar = Jar::new();
        jar.set_cookies(&example(), vec![Cookie::new("bad name", "1")]);
        let first = jar.token_for("bad name").unwrap();

        jar.set_cookies(&example(), vec![Cookie::new("bad name", "2")]);
        let second = jar.token_for("bad name").unwrap();

        assert_eq!(first, second);
        assert_eq!(jar.mapped_names(), 1);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.cookies(&example())[0].value, "2");
    }

    #[test]
    fn test_strict_mode_drops_invalid_names() {
        let jar = Jar::builder().strict().build();
        jar.set_cookies(
            &example(),
            vec![Cookie::new("bad name", "x"), Cookie::new("good", "y")],
        );

        let cookies = jar.cookies(&example());
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "good");
        assert_eq!(jar.mapped_names(), 0);
    }

    #[test]
    fn test_missing_host_reaches_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let jar = Jar::builder()
            .handle_errors(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                true
            })
            .build();

        let target = Url::parse("file:///tmp/cookies").unwrap();
        jar.set_cookies(&target, vec![Cookie::new("a", "1")]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(jar.is_empty());
        assert!(jar.cookies(&target).is_empty());
    }

    #[test]
    fn test_default_handler_forwards_to_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let jar = Jar::builder().error_channel(tx).build();

        jar.set_cookies(&Url::parse("data:text/plain,hi").unwrap(), vec![]);

        let err = rx.try_recv().unwrap();
        assert!(matches!(err, JarError::IncompleteTarget { missing: "host", .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unhandled_error_escalates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let jar = Jar::builder().handle_errors(|_| false).error_channel(tx).build();

        jar.set_cookies(&Url::parse("file:///x").unwrap(), vec![Cookie::new("a", "1")]);

        assert!(rx.try_recv().is_ok());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_lookup_ignores_path() {
        let jar = Jar::new();
        jar.set_cookies(&example(), vec![Cookie::new("a", "1")]);

        let deep = Url::parse("https://example.com/some/deep/path?q=1").unwrap();
        assert_eq!(jar.cookies(&deep).len(), 1);
    }

    #[test]
    fn test_shared_storage() {
        let storage: Arc<dyn CookieStorage> = Arc::new(MemoryStorage::new());
        let jar = Jar::builder().storage(storage.clone()).build();

        jar.set_cookies(&example(), vec![Cookie::new("a", "1")]);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_reqwest_cookie_store() {
        let jar = Jar::new();
        let url = Url::parse("https://example.com/login").unwrap();
        let headers = [
            HeaderValue::from_static("bad name=v1; Path=/"),
            HeaderValue::from_static("sid=abc; Path=/; HttpOnly"),
        ];

        CookieStore::set_cookies(&jar, &mut headers.iter(), &url);

        let header = CookieStore::cookies(&jar, &url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("bad name=v1"));
        assert!(header.contains("sid=abc"));
    }

    #[test]
    fn test_out_of_range_max_age_is_stored() {
        let jar = Jar::new();
        let url = example();
        let headers = [HeaderValue::from_static("sid=1; Max-Age=9223372036854775807")];

        CookieStore::set_cookies(&jar, &mut headers.iter(), &url);

        let cookies = jar.cookies(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "sid");
    }

    #[test]
    fn test_past_netscape_expires_deletes() {
        let jar = Jar::new();
        let url = example();

        let login = [HeaderValue::from_static("sid=abc; Path=/")];
        CookieStore::set_cookies(&jar, &mut login.iter(), &url);
        assert_eq!(jar.cookies(&url).len(), 1);

        let logout = [HeaderValue::from_static(
            "sid=deleted; expires=Thu, 01-Jan-1970 00:00:01 GMT; Path=/",
        )];
        CookieStore::set_cookies(&jar, &mut logout.iter(), &url);
        assert!(jar.cookies(&url).is_empty());
    }
}
