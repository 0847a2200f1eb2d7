// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie record and lenient `Set-Cookie` parsing

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain attribute (empty = host-only cookie)
    pub domain: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: SameSite,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    /// Cookie sent with all requests
    #[default]
    None,
    /// Cookie sent with same-site and top-level navigations
    Lax,
    /// Cookie only sent with same-site requests
    Strict,
}

impl SameSite {
    /// Map the integer encoding used by browser cookie databases
    /// (0 = none, 1 = lax, 2 = strict). Unknown values mean `None`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => SameSite::Lax,
            2 => SameSite::Strict,
            _ => SameSite::None,
        }
    }
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            same_site: SameSite::default(),
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set http_only flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set same_site attribute
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set expiration from unix epoch seconds. Zero means a session cookie.
    pub fn expires_at_epoch(mut self, secs: i64) -> Self {
        self.expires = if secs == 0 {
            None
        } else {
            Utc.timestamp_opt(secs, 0).single()
        };
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp <= Utc::now())
    }

    /// Parse a Set-Cookie header value.
    ///
    /// Parsing is lenient about the name: anything before the first `=`
    /// is accepted, including characters RFC 6265 forbids. Validation is
    /// left to the storage.
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));
        let mut max_age = false;

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" => cookie.domain = val.trim_start_matches('.').to_lowercase(),
                    "path" => {
                        if val.starts_with('/') {
                            cookie.path = val.to_string();
                        }
                    }
                    "expires" => {
                        // Max-Age wins when both are present
                        if !max_age {
                            if let Some(dt) = parse_cookie_date(val) {
                                cookie.expires = Some(dt);
                            }
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            cookie.expires = Some(max_age_expiry(secs));
                            max_age = true;
                        }
                    }
                    "samesite" => {
                        cookie.same_site = match val.to_lowercase().as_str() {
                            "strict" => SameSite::Strict,
                            "lax" => SameSite::Lax,
                            _ => SameSite::None,
                        };
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Check if the cookie would be sent to the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !domain_matches(host, &self.domain) {
            return false;
        }

        if !path_matches(url.path(), &self.path) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Expiry for a `Max-Age` of `secs`. Zero or negative means already
/// expired; values past chrono's range clamp to the latest representable
/// time.
fn max_age_expiry(secs: i64) -> DateTime<Utc> {
    if secs <= 0 {
        return DateTime::<Utc>::MIN_UTC;
    }
    chrono::Duration::try_seconds(secs)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Cookie-date forms seen in the wild, after the weekday and zone are
/// stripped: RFC 1123, the dashed Netscape form and its two-digit-year
/// variant (RFC 850).
const COOKIE_DATE_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%y %H:%M:%S",
    "%d %b %y %H:%M:%S",
];

/// Parse an `Expires` value. Unparseable dates yield `None`.
fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // asctime: `Thu Jan  1 00:00:01 1970`
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(naive) = NaiveDateTime::parse_from_str(&collapsed, "%a %b %d %H:%M:%S %Y") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    let without_weekday = match collapsed.split_once(", ") {
        Some((_, rest)) => rest,
        None => collapsed.as_str(),
    };
    let without_zone = without_weekday
        .strip_suffix(" GMT")
        .or_else(|| without_weekday.strip_suffix(" UTC"))
        .unwrap_or(without_weekday);

    COOKIE_DATE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(without_zone, format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// RFC 6265 §5.1.3 domain matching
pub(crate) fn domain_matches(host: &str, domain: &str) -> bool {
    if domain.is_empty() {
        return true;
    }

    let host = host.to_lowercase();
    let domain = domain.trim_start_matches('.').to_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// RFC 6265 §5.1.4 path matching
pub(crate) fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if cookie_path.is_empty() || request_path == cookie_path {
        return true;
    }
    if !request_path.starts_with(cookie_path) {
        return false;
    }
    cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')
}
