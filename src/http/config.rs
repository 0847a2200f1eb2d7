// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client configuration
//!
//! [`ClientConfig`], [`TransportConfig`] and [`TlsConfig`] are declarative
//! and serializable. They are resolved once, when a client is built, onto
//! [`TransportSettings`] and [`TlsSettings`]: a field only overrides the
//! resolved value when it is explicitly set (non-zero count, `Some`
//! duration, `true` flag).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Idle connections kept across all hosts unless configured
pub const DEFAULT_MAX_IDLE_CONNS: usize = 100;
/// Idle connections kept per host unless configured
pub const DEFAULT_MAX_IDLE_CONNS_PER_HOST: usize = 100;
/// Concurrent connections per host unless configured
pub const DEFAULT_MAX_CONNS_PER_HOST: usize = 100;

/// Minimum TLS protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TlsVersion {
    #[default]
    Tls12,
    Tls13,
}

impl TlsVersion {
    pub(crate) fn to_reqwest(self) -> reqwest::tls::Version {
        match self {
            TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
            TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsVersion::Tls12 => f.write_str("1.2"),
            TlsVersion::Tls13 => f.write_str("1.3"),
        }
    }
}

impl FromStr for TlsVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let version = s
            .trim()
            .to_lowercase()
            .trim_start_matches("tlsv")
            .trim_start_matches("tls")
            .trim()
            .to_string();

        match version.as_str() {
            "1.2" | "12" => Ok(TlsVersion::Tls12),
            "1.3" | "13" => Ok(TlsVersion::Tls13),
            "1.0" | "1.1" | "10" | "11" => Err(Error::config(
                "tls_min_version",
                s,
                "versions below TLS 1.2 are not supported",
            )),
            _ => Err(Error::config("tls_min_version", s, "unknown TLS version")),
        }
    }
}

impl TryFrom<String> for TlsVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TlsVersion> for String {
    fn from(version: TlsVersion) -> Self {
        version.to_string()
    }
}

/// TLS options layered onto [`TlsSettings`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Accept any server certificate and host name
    pub insecure_skip_verify: bool,
    /// Minimum acceptable protocol version
    pub min_version: Option<TlsVersion>,
}

impl TlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Pin the minimum protocol version
    pub fn min_version(mut self, version: TlsVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Override the fields of `settings` this config sets
    pub fn apply(&self, settings: &mut TlsSettings) {
        if self.insecure_skip_verify {
            settings.insecure_skip_verify = true;
        }
        if let Some(version) = self.min_version {
            settings.min_version = version;
        }
    }
}

/// Resolved TLS settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsSettings {
    pub insecure_skip_verify: bool,
    pub min_version: TlsVersion,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            min_version: TlsVersion::Tls12,
        }
    }
}

/// Transport options layered onto [`TransportSettings`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Time allowed to connect, TLS handshake included
    #[serde(with = "duration_ms")]
    pub tls_handshake_timeout: Option<Duration>,
    /// Time allowed between sending the request and receiving headers
    #[serde(with = "duration_ms")]
    pub response_header_timeout: Option<Duration>,
    /// How long an idle pooled connection is kept
    #[serde(with = "duration_ms")]
    pub idle_conn_timeout: Option<Duration>,
    /// TCP keep-alive interval
    #[serde(with = "duration_ms")]
    pub tcp_keepalive: Option<Duration>,
    pub max_idle_conns: usize,
    pub max_idle_conns_per_host: usize,
    pub max_conns_per_host: usize,
    /// Never reuse a connection
    pub disable_keep_alives: bool,
    /// Do not negotiate gzip or brotli
    pub disable_compression: bool,
    /// Never negotiate HTTP/2
    pub http1_only: bool,
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the fields of `settings` this config sets
    pub fn apply(&self, settings: &mut TransportSettings) {
        if self.tls_handshake_timeout.is_some() {
            settings.tls_handshake_timeout = self.tls_handshake_timeout;
        }
        if self.response_header_timeout.is_some() {
            settings.response_header_timeout = self.response_header_timeout;
        }
        if self.idle_conn_timeout.is_some() {
            settings.idle_conn_timeout = self.idle_conn_timeout;
        }
        if self.tcp_keepalive.is_some() {
            settings.tcp_keepalive = self.tcp_keepalive;
        }
        if self.max_idle_conns != 0 {
            settings.max_idle_conns = self.max_idle_conns;
        }
        if self.max_idle_conns_per_host != 0 {
            settings.max_idle_conns_per_host = self.max_idle_conns_per_host;
        }
        if self.max_conns_per_host != 0 {
            settings.max_conns_per_host = self.max_conns_per_host;
        }
        if self.disable_keep_alives {
            settings.keep_alive = false;
        }
        if self.disable_compression {
            settings.compression = false;
        }
        if self.http1_only {
            settings.http1_only = true;
        }
    }
}

/// Resolved transport settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub tls_handshake_timeout: Option<Duration>,
    pub response_header_timeout: Option<Duration>,
    pub idle_conn_timeout: Option<Duration>,
    pub tcp_keepalive: Option<Duration>,
    /// 0 = unlimited
    pub max_idle_conns: usize,
    pub max_idle_conns_per_host: usize,
    /// 0 = unlimited
    pub max_conns_per_host: usize,
    pub keep_alive: bool,
    pub compression: bool,
    pub http1_only: bool,
}

impl Default for TransportSettings {
    /// The transport's own defaults, before pool defaults are applied
    fn default() -> Self {
        Self {
            tls_handshake_timeout: Some(Duration::from_secs(10)),
            response_header_timeout: None,
            idle_conn_timeout: Some(Duration::from_secs(90)),
            tcp_keepalive: Some(Duration::from_secs(30)),
            max_idle_conns: 100,
            max_idle_conns_per_host: 2,
            max_conns_per_host: 0,
            keep_alive: true,
            compression: true,
            http1_only: false,
        }
    }
}

impl TransportSettings {
    /// Raise the connection pool limits to the crate defaults
    pub fn with_pool_defaults(mut self) -> Self {
        self.max_idle_conns = DEFAULT_MAX_IDLE_CONNS;
        self.max_idle_conns_per_host = DEFAULT_MAX_IDLE_CONNS_PER_HOST;
        self.max_conns_per_host = DEFAULT_MAX_CONNS_PER_HOST;
        self
    }

    /// Idle connections kept per host, bounded by the total idle limit.
    /// Zero when keep-alives are disabled.
    pub fn idle_per_host(&self) -> usize {
        if !self.keep_alive {
            return 0;
        }
        if self.max_idle_conns == 0 {
            self.max_idle_conns_per_host
        } else {
            self.max_idle_conns_per_host.min(self.max_idle_conns)
        }
    }
}

/// Construction-time client configuration, immutable once a client is built
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User-Agent sent with every request. A `user-agent` entry in
    /// `headers` takes precedence.
    pub user_agent: Option<String>,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Overall per-request timeout, body included
    #[serde(with = "duration_ms")]
    pub timeout: Option<Duration>,
    #[serde(with = "duration_ms")]
    pub tls_handshake_timeout: Option<Duration>,
    pub insecure_skip_verify: bool,
    pub tls_min_version: Option<TlsVersion>,
    #[serde(with = "duration_ms")]
    pub response_header_timeout: Option<Duration>,
    #[serde(with = "duration_ms")]
    pub idle_conn_timeout: Option<Duration>,
    pub max_idle_conns: usize,
    pub max_idle_conns_per_host: usize,
    pub max_conns_per_host: usize,
    /// Do not create or use a cookie jar
    pub no_cookie_jar: bool,
    /// Proxy URL for all schemes
    pub proxy: Option<String>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document. Durations are given in milliseconds.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(version) = value.get("tls_min_version").and_then(|v| v.as_str()) {
            version.parse::<TlsVersion>()?;
        }

        let config: Self = serde_json::from_value(value)?;
        config.header_map()?;
        if let Some(ref proxy) = config.proxy {
            url::Url::parse(proxy).map_err(|e| Error::config("proxy", proxy, e.to_string()))?;
        }
        Ok(config)
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Route every request through a proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Skip certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Disable the cookie jar
    pub fn no_cookie_jar(mut self) -> Self {
        self.no_cookie_jar = true;
        self
    }

    /// Default headers as a validated [`HeaderMap`]
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config("headers", name, e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config("headers", value, e.to_string()))?;
            map.insert(header, value);
        }
        Ok(map)
    }

    /// The transport fields of this config
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls_handshake_timeout: self.tls_handshake_timeout,
            response_header_timeout: self.response_header_timeout,
            idle_conn_timeout: self.idle_conn_timeout,
            max_idle_conns: self.max_idle_conns,
            max_idle_conns_per_host: self.max_idle_conns_per_host,
            max_conns_per_host: self.max_conns_per_host,
            ..TransportConfig::default()
        }
    }

    /// The TLS fields of this config
    pub fn tls_config(&self) -> TlsConfig {
        TlsConfig {
            insecure_skip_verify: self.insecure_skip_verify,
            min_version: self.tls_min_version,
        }
    }
}

/// `Option<Duration>` as integer milliseconds
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.filter(|ms| *ms > 0).map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_zero_values_keep_defaults() {
        let mut settings = TransportSettings::default().with_pool_defaults();
        TransportConfig {
            max_idle_conns: 0,
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.max_idle_conns, DEFAULT_MAX_IDLE_CONNS);
        assert_eq!(settings.idle_conn_timeout, Some(Duration::from_secs(90)));
        assert!(settings.keep_alive);
    }

    #[test]
    fn test_set_values_override() {
        let mut settings = TransportSettings::default().with_pool_defaults();
        TransportConfig {
            max_idle_conns: 10,
            max_conns_per_host: 4,
            idle_conn_timeout: Some(Duration::from_secs(5)),
            disable_compression: true,
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.max_idle_conns, 10);
        assert_eq!(settings.max_conns_per_host, 4);
        assert_eq!(settings.idle_conn_timeout, Some(Duration::from_secs(5)));
        assert!(!settings.compression);
        assert_eq!(settings.idle_per_host(), 10);
    }

    #[test]
    fn test_idle_per_host() {
        let mut settings = TransportSettings::default().with_pool_defaults();
        assert_eq!(settings.idle_per_host(), 100);

        settings.max_idle_conns = 0;
        settings.max_idle_conns_per_host = 7;
        assert_eq!(settings.idle_per_host(), 7);

        settings.keep_alive = false;
        assert_eq!(settings.idle_per_host(), 0);
    }

    #[test]
    fn test_tls_apply() {
        let mut settings = TlsSettings::default();
        TlsConfig::new().apply(&mut settings);
        assert_eq!(settings, TlsSettings::default());

        TlsConfig::new()
            .insecure(true)
            .min_version(TlsVersion::Tls13)
            .apply(&mut settings);
        assert!(settings.insecure_skip_verify);
        assert_eq!(settings.min_version, TlsVersion::Tls13);
    }

    #[test]
    fn test_tls_version_parsing() {
        assert_eq!("1.2".parse::<TlsVersion>().unwrap(), TlsVersion::Tls12);
        assert_eq!("TLSv1.3".parse::<TlsVersion>().unwrap(), TlsVersion::Tls13);

        let err = "1.0".parse::<TlsVersion>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidation);
        assert!("ssl3".parse::<TlsVersion>().is_err());

        let version: TlsVersion = serde_json::from_str(r#""TLSv1.3""#).unwrap();
        assert_eq!(version, TlsVersion::Tls13);
        assert_eq!(serde_json::to_string(&TlsVersion::Tls12).unwrap(), r#""1.2""#);
    }

    #[test]
    fn test_client_config_from_json() {
        let config = ClientConfig::from_json(
            r#"{
                "user_agent": "probe/1.0",
                "headers": {"x-team": "red"},
                "timeout": 2500,
                "tls_min_version": "1.3",
                "max_conns_per_host": 8
            }"#,
        )
        .unwrap();

        assert_eq!(config.user_agent.as_deref(), Some("probe/1.0"));
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.tls_config().min_version, Some(TlsVersion::Tls13));
        assert_eq!(config.transport_config().max_conns_per_host, 8);
        assert_eq!(config.header_map().unwrap()["x-team"], "red");
        assert!(config.response_header_timeout.is_none());
    }

    #[test]
    fn test_client_config_rejects_bad_values() {
        let err = ClientConfig::from_json(r#"{"headers": {"bad header": "x"}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidation);

        let err = ClientConfig::from_json(r#"{"proxy": "not a url"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidation);

        let err = ClientConfig::from_json(r#"{"tls_min_version": "1.0"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidation);
        assert!(matches!(err, Error::Config { ref field, .. } if field == "tls_min_version"));

        let err = ClientConfig::from_json(r#"{"tls_min_version": "2.0"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidation);

        let err = ClientConfig::from_json(r#"{"timeout": "soon"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }
}
