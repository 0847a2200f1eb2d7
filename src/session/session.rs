// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Copy-on-write request session
//!
//! Every fluent call returns a new [`Session`] and leaves the original
//! untouched. Terminal verbs consume the session, run the interceptor
//! pipeline, execute the request and drain the body into a
//! [`FetchResult`].
//!
//! Clones share the lazily built [`Client`] (and with it the cookie jar
//! and connection pool) and the interceptor lists; headers and pending
//! request fields are private to each clone.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use super::builder::{Builder, Mutator};
use super::result::FetchResult;
use crate::cookie::Jar;
use crate::error::{Error, Result};
use crate::http::{form_encode, millis, Client, ClientSettings, Request, Response};
use crate::interceptor::{RequestChain, ResponseChain};

/// Construction error kept until the session is executed
#[derive(Debug, Clone)]
enum Deferred {
    Url(url::ParseError),
    Header { name: String, reason: String },
    Body(String),
}

impl From<Deferred> for Error {
    fn from(deferred: Deferred) -> Self {
        match deferred {
            Deferred::Url(err) => Error::Url(err),
            Deferred::Header { name, reason } => Error::InvalidHeader { name, reason },
            Deferred::Body(reason) => {
                Error::Serialization(<serde_json::Error as serde::ser::Error>::custom(reason))
            }
        }
    }
}

/// Lazily built client shared by clones of a session
pub(crate) type ClientSlot = Arc<Mutex<Option<Client>>>;

/// Reusable, composable request session
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) span: Span,
    pub(crate) settings: ClientSettings,
    pub(crate) slot: ClientSlot,
    pub(crate) headers: HeaderMap,
    pub(crate) on_request: RequestChain,
    pub(crate) on_response: ResponseChain,
    method: Method,
    url: Option<Url>,
    body: Option<Bytes>,
    deferred: Option<Deferred>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            span: Span::none(),
            settings: ClientSettings::default(),
            slot: ClientSlot::default(),
            headers: HeaderMap::new(),
            on_request: RequestChain::new(),
            on_response: ResponseChain::new(),
            method: Method::GET,
            url: None,
            body: None,
            deferred: None,
            timeout: None,
            cancel: None,
        }
    }
}

impl Session {
    /// An empty session with default client settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring a new session
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Configure a copy of this session
    pub fn mutate(&self) -> Mutator {
        Mutator::new(self.clone())
    }

    /// Target URL. A parse error is reported when the session executes.
    pub fn url(&self, location: &str) -> Session {
        let mut next = self.clone();
        match Url::parse(location) {
            Ok(url) => {
                next.url = Some(url);
                if matches!(next.deferred, Some(Deferred::Url(_))) {
                    next.deferred = None;
                }
            }
            Err(err) => {
                next.url = None;
                if matches!(next.deferred, None | Some(Deferred::Url(_))) {
                    next.deferred = Some(Deferred::Url(err));
                }
            }
        }
        next
    }

    /// Target URL, already parsed
    pub fn url_parsed(&self, url: Url) -> Session {
        let mut next = self.clone();
        next.url = Some(url);
        if matches!(next.deferred, Some(Deferred::Url(_))) {
            next.deferred = None;
        }
        next
    }

    /// Replace the header snapshot
    pub fn headers(&self, headers: HeaderMap) -> Session {
        let mut next = self.clone();
        next.headers = headers;
        next
    }

    /// Set one header. An invalid name or value is reported when the
    /// session executes.
    pub fn header(&self, name: &str, value: &str) -> Session {
        let mut next = self.clone();
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| e.to_string())
            .and_then(|n| HeaderValue::from_str(value).map(|v| (n, v)).map_err(|e| e.to_string()));

        match parsed {
            Ok((name, value)) => {
                next.headers.insert(name, value);
            }
            Err(reason) => next.defer(Deferred::Header {
                name: name.to_string(),
                reason,
            }),
        }
        next
    }

    /// Request body
    pub fn body(&self, body: impl Into<Bytes>) -> Session {
        let mut next = self.clone();
        next.body = Some(body.into());
        next
    }

    /// JSON request body. A serialization error is reported when the
    /// session executes.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Session {
        let mut next = self.clone();
        match serde_json::to_vec(value) {
            Ok(body) => {
                next.body = Some(Bytes::from(body));
                next.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Err(err) => next.defer(Deferred::Body(err.to_string())),
        }
        next
    }

    /// URL-encoded form body
    pub fn form<K: AsRef<str>, V: AsRef<str>>(&self, pairs: &[(K, V)]) -> Session {
        let mut next = self.clone();
        next.body = Some(Bytes::from(form_encode(pairs)));
        next.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        next
    }

    /// Time limit for the whole execution, body included
    pub fn timeout(&self, timeout: Duration) -> Session {
        let mut next = self.clone();
        next.timeout = Some(timeout);
        next
    }

    /// Abort the execution when `token` is cancelled
    pub fn cancel_on(&self, token: CancellationToken) -> Session {
        let mut next = self.clone();
        next.cancel = Some(token);
        next
    }

    /// The shared client, built on first use
    pub fn client(&self) -> Result<Client> {
        let mut slot = self.slot.lock();
        if let Some(ref client) = *slot {
            return Ok(client.clone());
        }

        let client = Client::build(&self.settings)?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// The cookie jar in use, if jars are enabled
    pub fn jar(&self) -> Option<Arc<Jar>> {
        match self.client() {
            Ok(client) => client.jar().cloned(),
            Err(_) => self.settings.jar.clone(),
        }
    }

    /// Headers sent with every request of this session
    pub fn header_snapshot(&self) -> &HeaderMap {
        &self.headers
    }

    /// Target URL, if set and valid
    pub fn location(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Detach from the shared client so that changed client inputs take
    /// effect. A jar the old client already created is carried over.
    pub(crate) fn fork_client(&mut self) {
        if self.settings.jar.is_none() {
            self.settings.jar = self
                .slot
                .lock()
                .as_ref()
                .and_then(|client| client.jar().cloned());
        }
        self.slot = ClientSlot::default();
    }

    fn defer(&mut self, deferred: Deferred) {
        if self.deferred.is_none() {
            self.deferred = Some(deferred);
        }
    }

    /// Execute with an arbitrary method
    pub async fn request(mut self, method: Method) -> FetchResult {
        self.method = method;
        self.fetch().await
    }

    /// Execute a HEAD request
    pub async fn head(self) -> FetchResult {
        self.request(Method::HEAD).await
    }

    /// Execute a GET request
    pub async fn get(self) -> FetchResult {
        self.request(Method::GET).await
    }

    /// Execute a POST request
    pub async fn post(self) -> FetchResult {
        self.request(Method::POST).await
    }

    /// Execute a PUT request
    pub async fn put(self) -> FetchResult {
        self.request(Method::PUT).await
    }

    /// Execute a PATCH request
    pub async fn patch(self) -> FetchResult {
        self.request(Method::PATCH).await
    }

    /// Execute a DELETE request
    pub async fn delete(self) -> FetchResult {
        self.request(Method::DELETE).await
    }

    /// Execute an OPTIONS request
    pub async fn options(self) -> FetchResult {
        self.request(Method::OPTIONS).await
    }

    async fn fetch(self) -> FetchResult {
        let span = tracing::debug_span!(
            parent: &self.span,
            "fetch",
            method = %self.method,
            url = tracing::field::Empty
        );
        if let Some(ref url) = self.url {
            span.record("url", url.as_str());
        }

        self.execute().instrument(span).await
    }

    async fn execute(self) -> FetchResult {
        if let Some(deferred) = self.deferred.clone() {
            let err = Error::from(deferred);
            tracing::debug!(error = %err, "request construction failed");
            return FetchResult::failed(None, None, err);
        }
        let url = match self.url.clone() {
            Some(url) => url,
            None => return FetchResult::failed(None, None, Error::MissingUrl),
        };

        let mut request = Request::new(self.method.clone(), url);
        request.body = self.body.clone();

        if let Err(err) = self.on_request.run(&mut request) {
            return FetchResult::failed(Some(request), None, err);
        }

        merge_missing(&mut request.headers, &self.headers);

        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(error = %err, "HTTP client construction failed");
                return FetchResult::failed(Some(request), None, err);
            }
        };

        let deadline = self.timeout.map(|t| tokio::time::Instant::now() + t);
        let started = Instant::now();

        let permit = match self
            .guard(&request.url, deadline, async {
                Ok::<_, Error>(client.acquire(&request.url).await)
            })
            .await
        {
            Ok(permit) => permit,
            Err(err) => return FetchResult::failed(Some(request), None, err),
        };

        let received = match self.guard(&request.url, deadline, client.send(&request)).await {
            Ok(received) => received,
            Err(err) => {
                tracing::debug!(error = %err, "request failed");
                return FetchResult::failed(Some(request), None, err);
            }
        };
        let mut response =
            Response::from_reqwest(&received, &request.url, millis(started.elapsed()));

        // Drain fully so the connection goes back to the pool
        let body = match self
            .guard(&request.url, deadline, async move {
                received.bytes().await.map_err(Error::from)
            })
            .await
        {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(error = %err, status = response.status_code(), "reading body failed");
                return FetchResult::failed(Some(request), Some(response), err);
            }
        };
        drop(permit);

        let error = self.on_response.run(&mut response).err();

        tracing::debug!(
            status = response.status_code(),
            bytes = body.len(),
            elapsed_ms = millis(started.elapsed()),
            "request complete"
        );

        FetchResult {
            request: Some(request),
            response: Some(response),
            body,
            error,
        }
    }

    /// Bound `fut` by the session deadline and cancellation token
    async fn guard<T, F>(&self, url: &Url, deadline: Option<tokio::time::Instant>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limited = async {
            match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::timeout_with_url(
                        "request",
                        self.timeout.map_or(0, millis),
                        url.as_str(),
                    )),
                },
                None => fut.await,
            }
        };

        match self.cancel {
            Some(ref token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled { url: url.to_string() }),
                result = limited => result,
            },
            None => limited.await,
        }
    }
}

/// Copy every header of `defaults` that `target` does not already have
fn merge_missing(target: &mut HeaderMap, defaults: &HeaderMap) {
    for name in defaults.keys() {
        if target.contains_key(name) {
            continue;
        }
        for value in defaults.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::{ErrorKind, Stage};
    use crate::interceptor::{expect_status, request_fn};
    use crate::session::Configure;

    async fn serve(route: &str, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_cloned_sessions_fetch_independently() {
        let server = MockServer::start().await;
        for (route, body) in [("/a", "first"), ("/b", "second")] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }

        let base = Session::new();
        let first = base.url(&format!("{}/a", server.uri())).get().await;
        let second = base.url(&format!("{}/b", server.uri())).get().await;

        assert!(first.is_ok() && second.is_ok());
        assert_ne!(
            first.request.as_ref().unwrap().url,
            second.request.as_ref().unwrap().url
        );
        assert_eq!(first.text(), "first");
        assert_eq!(second.text(), "second");
        assert_eq!(first.status_code(), 200);
        assert!(base.location().is_none());
    }

    #[tokio::test]
    async fn test_request_interceptors_run_in_order_and_short_circuit() {
        let server = serve("/", "ok").await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let third_calls = Arc::new(AtomicUsize::new(0));

        let (s1, s2, calls) = (seen.clone(), seen.clone(), third_calls.clone());
        let session = Session::builder()
            .on_request(request_fn(move |_| {
                s1.lock().push("first");
                Ok(())
            }))
            .on_request(request_fn(move |_| {
                s2.lock().push("second");
                Err(Error::other("blocked"))
            }))
            .on_request(request_fn(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .build();

        let result = session.url(&server.uri()).get().await;

        assert_eq!(*seen.lock(), vec!["first", "second"]);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
        assert!(result.request.is_some());
        assert!(result.response.is_none());
        let err = result.error.unwrap();
        assert!(matches!(err, Error::Interceptor { stage: Stage::Request, .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_headers_only_fill_gaps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-a", "interceptor"))
            .and(header("x-b", "session"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::builder()
            .on_request(request_fn(|request| request.set_header("x-a", "interceptor")))
            .build()
            .header("x-a", "session")
            .header("x-b", "session");

        let result = session.url(&server.uri()).get().await;
        assert_eq!(result.status_code(), 200);
        assert_eq!(
            result.request.unwrap().header("x-a"),
            Some("interceptor")
        );
    }

    #[tokio::test]
    async fn test_deferred_construction_errors() {
        let result = Session::new().url("not a url").get().await;
        assert!(result.request.is_none());
        assert!(matches!(result.error, Some(Error::Url(_))));

        let result = Session::new().get().await;
        assert!(matches!(result.error, Some(Error::MissingUrl)));

        let result = Session::new()
            .header("bad header", "x")
            .url("https://example.com")
            .get()
            .await;
        assert!(matches!(result.error, Some(Error::InvalidHeader { .. })));

        let mut bad_keys = BTreeMap::new();
        bad_keys.insert(vec![1u8], 1u8);
        let result = Session::new()
            .url("https://example.com")
            .json(&bad_keys)
            .post()
            .await;
        assert_eq!(result.error.unwrap().kind(), ErrorKind::Construction);
    }

    #[tokio::test]
    async fn test_later_url_clears_url_error() {
        let server = serve("/", "ok").await;
        let result = Session::new().url("::bad::").url(&server.uri()).get().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_response_interceptor_error_keeps_body() {
        let server = serve("/", "payload").await;

        let result = Session::builder()
            .on_response(expect_status(201))
            .build()
            .url(&server.uri())
            .get()
            .await;

        assert_eq!(result.text(), "payload");
        assert_eq!(result.status_code(), 200);
        let err = result.error.unwrap();
        assert!(matches!(err, Error::Interceptor { stage: Stage::Response, .. }));
        assert_eq!(err.status_code(), Some(200));
    }

    #[test]
    fn test_header_isolation() {
        let base = Session::new().header("x-base", "1");
        let derived = base.header("x-derived", "2");

        assert!(base.header_snapshot().get("x-derived").is_none());
        assert_eq!(derived.header_snapshot()["x-base"], "1");
        assert_eq!(derived.header_snapshot()["x-derived"], "2");
    }

    #[tokio::test]
    async fn test_post_json_and_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/json"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"name": "teapot"})))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/form"))
            .and(body_string("a=1&b=two+words"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let session = Session::new();
        let json = session
            .url(&format!("{}/json", server.uri()))
            .json(&serde_json::json!({"name": "teapot"}))
            .post()
            .await;
        let form = session
            .url(&format!("{}/form", server.uri()))
            .form(&[("a", "1"), ("b", "two words")])
            .put()
            .await;

        assert_eq!(json.status_code(), 201);
        assert_eq!(form.status_code(), 204);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let result = Session::new()
            .url(&server.uri())
            .timeout(Duration::from_millis(50))
            .get()
            .await;

        let err = result.error.unwrap();
        assert!(err.is_timeout());
        assert!(result.request.is_some());
        assert!(result.response.is_none());
    }

    #[tokio::test]
    async fn test_cancellation() {
        let server = serve("/", "ok").await;
        let token = CancellationToken::new();
        token.cancel();

        let result = Session::new().url(&server.uri()).cancel_on(token).get().await;
        assert!(matches!(result.error, Some(Error::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_nonconforming_cookie_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "bad name=v1; Path=/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/check"))
            .and(header("cookie", "bad name=v1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = Session::new();
        let login = session.url(&format!("{}/login", server.uri())).get().await;
        let check = session.url(&format!("{}/check", server.uri())).get().await;

        assert!(login.is_ok());
        assert_eq!(check.status_code(), 200);

        let jar = session.jar().unwrap();
        let cookies = jar.cookies(&Url::parse(&server.uri()).unwrap());
        assert_eq!(cookies[0].name, "bad name");
        assert_eq!(jar.mapped_names(), 1);
    }

    #[tokio::test]
    async fn test_truncated_body_keeps_response() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\ncontent-type: text/plain\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let result = Session::new()
            .url(&format!("http://{}/", addr))
            .timeout(Duration::from_secs(5))
            .get()
            .await;
        server.await.unwrap();

        assert!(result.request.is_some());
        let response = result.response.as_ref().unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_length(), Some(100));
        assert!(result.content().is_empty());
        assert!(result.error.unwrap().is_transport());
    }

    #[tokio::test]
    async fn test_transport_error_keeps_request() {
        let result = Session::new()
            .url("http://127.0.0.1:9/")
            .timeout(Duration::from_secs(5))
            .get()
            .await;

        assert!(result.request.is_some());
        assert!(result.response.is_none());
        assert!(result.error.unwrap().is_transport());
    }
}
