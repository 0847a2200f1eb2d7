// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pooled HTTP client construction

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use reqwest::header::{HeaderValue, USER_AGENT};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use super::config::{ClientConfig, TlsConfig, TlsSettings, TransportConfig, TransportSettings};
use super::request::Request;
use super::DEFAULT_USER_AGENT;
use crate::cookie::Jar;
use crate::error::{Error, Result};

/// Everything a client is built from
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    pub config: ClientConfig,
    pub transport: Option<TransportConfig>,
    pub tls: Option<TlsConfig>,
    /// Jar to install; one is created when absent unless jars are disabled
    pub jar: Option<Arc<Jar>>,
}

impl ClientSettings {
    /// Resolve the transport settings: transport defaults, then pool
    /// defaults, then the client config, then the transport config
    pub fn resolve_transport(&self) -> TransportSettings {
        let mut transport = TransportSettings::default().with_pool_defaults();
        self.config.transport_config().apply(&mut transport);
        if let Some(ref config) = self.transport {
            config.apply(&mut transport);
        }
        transport
    }

    /// Resolve the TLS settings: TLS 1.2 minimum and verification on,
    /// then the client config, then the TLS config
    pub fn resolve_tls(&self) -> TlsSettings {
        let mut tls = TlsSettings::default();
        self.config.tls_config().apply(&mut tls);
        if let Some(ref config) = self.tls {
            config.apply(&mut tls);
        }
        tls
    }
}

/// Pooled HTTP client shared by every session of one root configuration
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    transport: TransportSettings,
    tls: TlsSettings,
    jar: Option<Arc<Jar>>,
    limiter: HostLimiter,
}

impl Client {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::build(&ClientSettings::default())
    }

    /// Build a client
    pub fn build(settings: &ClientSettings) -> Result<Self> {
        let config = &settings.config;
        let transport = settings.resolve_transport();
        let tls = settings.resolve_tls();
        let headers = config.header_map()?;

        let user_agent = match headers.get(USER_AGENT) {
            Some(value) => value.clone(),
            None => {
                let ua = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
                HeaderValue::from_str(ua).map_err(|_| Error::UserAgent(ua.to_string()))?
            }
        };

        let jar = if config.no_cookie_jar {
            None
        } else {
            Some(match settings.jar {
                Some(ref jar) => jar.clone(),
                None => {
                    tracing::debug!("creating cookie jar for new client");
                    Arc::new(Jar::new())
                }
            })
        };

        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .min_tls_version(tls.min_version.to_reqwest())
            .danger_accept_invalid_certs(tls.insecure_skip_verify)
            .pool_idle_timeout(transport.idle_conn_timeout)
            .pool_max_idle_per_host(transport.idle_per_host())
            .tcp_keepalive(transport.tcp_keepalive);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = transport.tls_handshake_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if !transport.compression {
            builder = builder.no_gzip().no_brotli();
        }
        if transport.http1_only {
            builder = builder.http1_only();
        }
        if let Some(ref proxy) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy.as_str())
                    .map_err(|e| Error::config("proxy", proxy, e.to_string()))?,
            );
        }
        if let Some(ref jar) = jar {
            builder = builder.cookie_provider(jar.clone());
        }

        let inner = builder.build()?;

        tracing::debug!(
            max_idle_conns = transport.max_idle_conns,
            idle_per_host = transport.idle_per_host(),
            max_conns_per_host = transport.max_conns_per_host,
            min_tls = %tls.min_version,
            insecure = tls.insecure_skip_verify,
            cookies = jar.is_some(),
            "HTTP client built"
        );

        Ok(Self {
            inner,
            limiter: HostLimiter::new(transport.max_conns_per_host),
            transport,
            tls,
            jar,
        })
    }

    /// Resolved transport settings
    pub fn transport(&self) -> &TransportSettings {
        &self.transport
    }

    /// Resolved TLS settings
    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    /// The installed cookie jar, if jars are enabled
    pub fn jar(&self) -> Option<&Arc<Jar>> {
        self.jar.as_ref()
    }

    /// The underlying reqwest client
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Wait for a connection slot to the request's host
    pub async fn acquire(&self, url: &Url) -> Option<OwnedSemaphorePermit> {
        self.limiter.acquire(url).await
    }

    /// Send a request and wait for the response headers
    pub async fn send(&self, request: &Request) -> Result<reqwest::Response> {
        let pending = request.to_reqwest(&self.inner).send();

        match self.transport.response_header_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(response) => Ok(response?),
                Err(_) => Err(Error::timeout_with_url(
                    "response headers",
                    millis(limit),
                    request.url.as_str(),
                )),
            },
            None => Ok(pending.await?),
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Tracked hosts before idle entries are swept
const HOST_SWEEP_THRESHOLD: usize = 256;

/// Caps concurrent requests per `host:port`.
///
/// Semaphores are created on first use. Once more than
/// [`HOST_SWEEP_THRESHOLD`] hosts are tracked, hosts with no permit held
/// or awaited are dropped before a new one is added.
#[derive(Debug, Clone)]
pub struct HostLimiter {
    limit: usize,
    hosts: Arc<DashMap<String, Arc<Semaphore>>>,
}

impl HostLimiter {
    /// `limit` of 0 means unlimited
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            hosts: Arc::new(DashMap::new()),
        }
    }

    /// Configured limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait for a slot. `None` when unlimited.
    pub async fn acquire(&self, url: &Url) -> Option<OwnedSemaphorePermit> {
        if self.limit == 0 {
            return None;
        }

        let key = format!(
            "{}:{}",
            url.host_str().unwrap_or(""),
            url.port_or_known_default().unwrap_or(0)
        );
        if self.hosts.len() >= HOST_SWEEP_THRESHOLD && !self.hosts.contains_key(&key) {
            self.sweep();
        }
        let semaphore = self
            .hosts
            .entry(key)
            .or_insert_with(|| Arc::new(Semaphore::new(self.limit)))
            .clone();

        semaphore.acquire_owned().await.ok()
    }

    /// Number of hosts with a semaphore
    pub fn tracked_hosts(&self) -> usize {
        self.hosts.len()
    }

    /// Drop hosts with no permit held or awaited
    pub fn sweep(&self) {
        // Held permits and pending acquisitions each own a reference
        self.hosts
            .retain(|_, semaphore| Arc::strong_count(semaphore) > 1);
    }
}
