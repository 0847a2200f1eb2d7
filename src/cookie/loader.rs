// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Importing persisted cookies into a jar

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::jar::Jar;
use super::record::{Cookie, SameSite};
use crate::error::{Error, Result};

/// Producer pushing externally persisted cookies into a [`Jar`]
#[async_trait]
pub trait CookieLoader: Send + Sync {
    /// Attach the jar cookies are loaded into
    fn set_jar(&mut self, jar: Arc<Jar>);

    /// The attached jar
    fn jar(&self) -> Option<Arc<Jar>>;

    /// Copy the cookies for each key from the attached jar into `jar`
    fn to_jar(&self, jar: &Jar, keys: &[Url]) {
        if let Some(source) = self.jar() {
            for key in keys {
                jar.set_cookies(key, source.cookies(key));
            }
        }
    }

    /// Load cookies for `hosts` (all hosts when empty) into the attached jar
    async fn load(&mut self, hosts: &[String]) -> Result<()>;
}

/// A cookie as persisted by a browser profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCookie {
    pub host: String,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "root_path")]
    pub path: String,
    /// Unix epoch seconds, 0 for a session cookie
    #[serde(default)]
    pub expiry: i64,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// 0 = none, 1 = lax, 2 = strict
    #[serde(default)]
    pub same_site: i64,
}

fn root_path() -> String {
    "/".to_string()
}

impl PersistedCookie {
    /// The URL the cookie is set against: `https://host` when secure,
    /// `http://host` otherwise
    pub fn target(&self) -> Result<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.host.trim_start_matches('.');
        Ok(Url::parse(&format!("{}://{}/", scheme, host))?)
    }

    /// Convert into a jar cookie. A leading dot on the host makes it a
    /// domain cookie, otherwise it is host-only.
    pub fn to_cookie(&self) -> Cookie {
        let domain = if self.host.starts_with('.') {
            self.host.trim_start_matches('.').to_string()
        } else {
            String::new()
        };

        Cookie::new(self.name.clone(), self.value.clone())
            .domain(domain)
            .path(self.path.clone())
            .expires_at_epoch(self.expiry)
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(SameSite::from_code(self.same_site))
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Records(Vec<PersistedCookie>),
}

/// Loads a JSON array of [`PersistedCookie`] records
#[derive(Debug, Clone)]
pub struct JsonCookieLoader {
    source: Source,
    jar: Option<Arc<Jar>>,
}

impl JsonCookieLoader {
    /// Read records from a JSON file on every [`load`](CookieLoader::load)
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            jar: None,
        }
    }

    /// Use records already in memory
    pub fn from_records(records: Vec<PersistedCookie>) -> Self {
        Self {
            source: Source::Records(records),
            jar: None,
        }
    }

    /// Attach a jar, builder style
    pub fn with_jar(mut self, jar: Arc<Jar>) -> Self {
        self.jar = Some(jar);
        self
    }

    async fn records(&self) -> Result<Vec<PersistedCookie>> {
        match self.source {
            Source::File(ref path) => {
                tracing::debug!(path = %path.display(), "loading persisted cookies");
                let raw = tokio::fs::read(path).await?;
                Ok(serde_json::from_slice(&raw)?)
            }
            Source::Records(ref records) => Ok(records.clone()),
        }
    }
}

#[async_trait]
impl CookieLoader for JsonCookieLoader {
    fn set_jar(&mut self, jar: Arc<Jar>) {
        self.jar = Some(jar);
    }

    fn jar(&self) -> Option<Arc<Jar>> {
        self.jar.clone()
    }

    async fn load(&mut self, hosts: &[String]) -> Result<()> {
        let jar = self.jar.clone().ok_or(Error::NoJar)?;

        let wanted: HashSet<&str> = hosts
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();

        let records: Vec<PersistedCookie> = self
            .records()
            .await?
            .into_iter()
            .filter(|r| wanted.is_empty() || wanted.contains(r.host.as_str()))
            .collect();

        if records.is_empty() {
            return Err(Error::NoCookiesFound {
                hosts: hosts.to_vec(),
            });
        }
        tracing::debug!(count = records.len(), "persisted cookies found");

        let mut grouped: BTreeMap<String, (Url, Vec<Cookie>)> = BTreeMap::new();
        for record in &records {
            if record.host.is_empty() {
                return Err(Error::Cookie(format!("no host on cookie '{}'", record.name)));
            }
            let target = record.target()?;
            grouped
                .entry(target.to_string())
                .or_insert_with(|| (target, Vec::new()))
                .1
                .push(record.to_cookie());
        }

        for (key, (target, cookies)) in grouped {
            let count = cookies.len();
            jar.set_cookies(&target, cookies);

            if jar.cookies(&target).is_empty() {
                return Err(Error::Cookie(format!(
                    "empty cookie jar after setting {} cookies for '{}'",
                    count, key
                )));
            }
        }

        tracing::debug!(count = records.len(), "persisted cookies loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn record(host: &str, name: &str, secure: bool) -> PersistedCookie {
        PersistedCookie {
            host: host.to_string(),
            name: name.to_string(),
            value: "v".to_string(),
            path: "/".to_string(),
            expiry: 0,
            secure,
            http_only: false,
            same_site: 0,
        }
    }

    #[test]
    fn test_record_target() {
        assert_eq!(
            record("example.com", "a", true).target().unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            record(".example.com", "a", false).target().unwrap().as_str(),
            "http://example.com/"
        );
        assert_eq!(record(".example.com", "a", false).to_cookie().domain, "example.com");
        assert_eq!(record("example.com", "a", false).to_cookie().domain, "");
    }

    #[tokio::test]
    async fn test_load_without_jar() {
        let mut loader = JsonCookieLoader::from_records(vec![record("example.com", "a", true)]);
        assert!(matches!(loader.load(&[]).await, Err(Error::NoJar)));
    }

    #[tokio::test]
    async fn test_load_filters_hosts() {
        let jar = Arc::new(Jar::new());
        let mut loader = JsonCookieLoader::from_records(vec![
            record("example.com", "bad name", true),
            record("other.com", "b", false),
        ])
        .with_jar(jar.clone());

        loader.load(&["example.com".to_string()]).await.unwrap();

        let cookies = jar.cookies(&Url::parse("https://example.com").unwrap());
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "bad name");
        assert!(jar.cookies(&Url::parse("http://other.com").unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_load_no_matches() {
        let mut loader = JsonCookieLoader::from_records(vec![record("example.com", "a", true)])
            .with_jar(Arc::new(Jar::new()));

        let err = loader.load(&["nowhere.test".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::NoCookiesFound { ref hosts } if hosts.len() == 1));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"host": "example.com", "name": "sid", "value": "abc", "secure": true, "httpOnly": true, "sameSite": 1}},
                {{"host": ".example.com", "name": "pref", "value": "dark"}}
            ]"#
        )
        .unwrap();

        let jar = Arc::new(Jar::new());
        let mut loader = JsonCookieLoader::from_path(file.path());
        loader.set_jar(jar.clone());
        loader.load(&[]).await.unwrap();

        let secure = jar.cookies(&Url::parse("https://example.com").unwrap());
        assert_eq!(secure.len(), 2);
        let sid = secure.iter().find(|c| c.name == "sid").unwrap();
        assert!(sid.http_only);
        assert_eq!(sid.same_site, SameSite::Lax);

        let plain = jar.cookies(&Url::parse("http://example.com").unwrap());
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].name, "pref");
    }

    #[test]
    fn test_to_jar_copies_cookies() {
        let source = Arc::new(Jar::new());
        let url = Url::parse("https://example.com").unwrap();
        source.set_cookies(&url, vec![Cookie::new("bad name", "1")]);

        let loader = JsonCookieLoader::from_records(vec![]).with_jar(source);
        let target = Jar::new();
        loader.to_jar(&target, &[url.clone()]);

        assert_eq!(target.cookies(&url)[0].name, "bad name");
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut loader = JsonCookieLoader::from_records(vec![record("", "a", false)])
            .with_jar(Arc::new(Jar::new()));

        let result = tokio_test::block_on(loader.load(&[]));
        assert!(matches!(result, Err(Error::Cookie(_))));
    }
}
