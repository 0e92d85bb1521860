//! Cookie storage owned by the client.
//!
//! `reqwest` hands every `Set-Cookie` header it sees to this jar (redirect hops
//! included) and asks it for the `Cookie` header on each request. Cookies are
//! scoped to the host, path and scheme they were set for, so a redirect to
//! another site never carries the session along. Unlike the built-in jar this
//! one keeps the raw `expires` attribute around, which is what the session
//! validity check needs.

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, NaiveDateTime, Utc};
use cookie::Cookie;
use log::debug;
use parking_lot::RwLock;
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;

/// Drupal names its session cookie `SSESS<hash>`.
pub const SESSION_COOKIE_PREFIX: &str = "SSESS";

// The timezone abbreviation is split off before parsing, see `parse_cookie_expiry`.
const EXPIRES_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S";

/// Name, domain and path identify a cookie; a second one with the same triple replaces it.
type CookieKey = (String, String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    /// Lowercased host or `Domain` attribute, without a leading dot.
    pub domain: String,
    /// Set without a `Domain` attribute: only sent back to exactly `domain`.
    pub host_only: bool,
    pub path: String,
    pub secure: bool,
    /// Raw `expires` attribute, e.g. `Wed, 21-Oct-2026 07:28:00 GMT`.
    pub expires: Option<String>,
    pub max_age: Option<i64>,
}

impl StoredCookie {
    /// Parses a `Set-Cookie` header value received in the response to `url`.
    ///
    /// Returns `None` for malformed headers and for cookies that claim a
    /// domain the responding host does not belong to.
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let cookie = Cookie::parse(header).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();

        let (domain, host_only) = match cookie.domain() {
            Some(domain) if !domain.is_empty() => {
                let domain = domain.trim_start_matches('.').to_ascii_lowercase();
                if !domain_matches(&host, &domain) {
                    debug!("Cookie {} for {domain} rejected from {host}", cookie.name());
                    return None;
                }
                (domain, false)
            }
            _ => (host, true),
        };
        let path = match cookie.path() {
            Some(path) if path.starts_with('/') => path.to_string(),
            _ => default_path(url),
        };

        Some(Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain,
            host_only,
            path,
            secure: cookie.secure().unwrap_or(false),
            expires: raw_attribute(header, "expires"),
            max_age: cookie.max_age().map(|max_age| max_age.whole_seconds()),
        })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires.as_deref().and_then(parse_cookie_expiry)
    }

    /// A cookie sent with a lifetime that already ran out is the server's way of deleting it.
    fn is_removal(&self, now: DateTime<Utc>) -> bool {
        self.max_age.is_some_and(|max_age| max_age <= 0)
            || self.expires_at().is_some_and(|expires| expires <= now)
    }

    /// Whether a request to `url` should carry this cookie.
    pub fn applies_to(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host_fits = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };

        host_fits && path_matches(url.path(), &self.path) && (!self.secure || url.scheme() == "https")
    }

    fn key(&self) -> CookieKey {
        (self.name.clone(), self.domain.clone(), self.path.clone())
    }
}

/// `host` is `domain` itself or one of its subdomains. IP addresses only match exactly.
fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    host.parse::<IpAddr>().is_err()
        && host
            .strip_suffix(domain)
            .is_some_and(|subdomain| subdomain.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    match request_path.strip_prefix(cookie_path) {
        Some(rest) => rest.is_empty() || cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// Directory of the request path: `/user/login` gives `/user`, `/` and `/login` give `/`.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(end) => path[..end].to_string(),
    }
}

fn raw_attribute(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .skip(1)
        .filter_map(|attribute| attribute.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().to_string())
}

/// Parses a cookie expiry of the form `Wed, 21-Oct-2026 07:28:00 GMT`.
///
/// Only `GMT` and `UTC` are accepted as zone; both mean UTC.
pub fn parse_cookie_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = raw.trim().rsplit_once(' ')?;
    if !matches!(zone, "GMT" | "UTC") {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, EXPIRES_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// True only when a session cookie is present and the latest expiry among the
/// session cookies lies strictly after `now`.
///
/// A session cookie whose expiry is missing or can't be parsed counts as expired.
pub fn session_is_valid(cookies: &[StoredCookie], now: DateTime<Utc>) -> bool {
    cookies
        .iter()
        .filter(|cookie| cookie.name.starts_with(SESSION_COOKIE_PREFIX))
        .filter_map(StoredCookie::expires_at)
        .max()
        .is_some_and(|expires| expires > now)
}

#[derive(Debug, Default)]
pub struct SessionJar {
    cookies: RwLock<HashMap<CookieKey, StoredCookie>>,
}

impl SessionJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, cookie: StoredCookie) {
        let mut cookies = self.cookies.write();
        if cookie.is_removal(Utc::now()) {
            debug!("Cookie {} removed by server", cookie.name);
            cookies.remove(&cookie.key());
        } else {
            debug!("Cookie {} stored for {}{}", cookie.name, cookie.domain, cookie.path);
            cookies.insert(cookie.key(), cookie);
        }
    }

    /// Every stored cookie, ordered by name, domain and path.
    pub fn snapshot(&self) -> Vec<StoredCookie> {
        let mut cookies: Vec<StoredCookie> = self.cookies.read().values().cloned().collect();
        cookies.sort_by_key(StoredCookie::key);
        cookies
    }

    pub fn session_is_valid(&self, now: DateTime<Utc>) -> bool {
        session_is_valid(&self.snapshot(), now)
    }

    pub fn clear(&self) {
        self.cookies.write().clear();
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            if let Some(cookie) = StoredCookie::parse(raw, url) {
                self.store(cookie);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = self.cookies.read();
        let mut matching: Vec<&StoredCookie> = cookies
            .values()
            .filter(|cookie| cookie.applies_to(url))
            .collect();
        if matching.is_empty() {
            return None;
        }
        // More specific paths first, then by name so the header is stable.
        matching.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.name.cmp(&b.name))
        });

        let header = matching
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}
