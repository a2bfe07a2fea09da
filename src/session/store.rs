//! Session cookie storage.
//!
//! # Responsibilities
//! - Attach stored cookies to outgoing requests (implicit credentials)
//! - Store `Set-Cookie` headers from responses, per host
//! - Clear every session cookie when the session is declared dead
//!
//! # Design Decisions
//! - The client depends only on the [`SessionStore`] capability
//! - Cookie values are never logged
//! - A cookie sent with `Max-Age<=0` or a past `Expires` removes the stored one

use cookie::time::OffsetDateTime;
use cookie::Cookie;
use dashmap::DashMap;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use tracing::{debug, trace, warn};
use url::Url;

/// Capability the HTTP client needs from session storage.
pub trait SessionStore: Send + Sync {
    /// Drop every locally stored session cookie.
    fn clear_all_session_cookies(&self);

    /// Whether any session cookie is stored for the host of `url`.
    fn has_session(&self, url: &Url) -> bool;
}

/// Per-host cookie jar used as the transport's cookie provider.
#[derive(Debug, Default)]
pub struct SessionCookieJar {
    cookies: DashMap<String, DashMap<String, Cookie<'static>>>,
}

impl SessionCookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cookies stored for the host of `url`.
    pub fn len_for(&self, url: &Url) -> usize {
        self.cookies
            .get(&host_key(url))
            .map(|map| map.len())
            .unwrap_or(0)
    }

    /// Store a cookie for the host of `url`.
    pub fn insert(&self, url: &Url, name: impl Into<String>, value: impl Into<String>) {
        let cookie = Cookie::new(name.into(), value.into());
        self.cookies
            .entry(host_key(url))
            .or_default()
            .insert(cookie.name().to_string(), cookie);
    }

    fn store(&self, host: String, cookie: Cookie<'static>) {
        let map = self.cookies.entry(host).or_default();
        if is_removal(&cookie) {
            trace!(name = cookie.name(), "Cookie removed by server");
            map.remove(cookie.name());
        } else {
            trace!(name = cookie.name(), "Cookie stored");
            map.insert(cookie.name().to_string(), cookie);
        }
    }
}

fn host_key(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_ascii_lowercase()
}

fn is_removal(cookie: &Cookie<'_>) -> bool {
    if let Some(max_age) = cookie.max_age() {
        if max_age.is_zero() || max_age.is_negative() {
            return true;
        }
    }
    matches!(cookie.expires_datetime(), Some(at) if at <= OffsetDateTime::now_utc())
}

impl SessionStore for SessionCookieJar {
    fn clear_all_session_cookies(&self) {
        let hosts = self.cookies.len();
        self.cookies.clear();
        debug!(hosts, "Session cookies cleared");
    }

    fn has_session(&self, url: &Url) -> bool {
        self.len_for(url) > 0
    }
}

impl CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let host = host_key(url);
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                warn!("Ignoring non-ASCII Set-Cookie header");
                continue;
            };
            match Cookie::parse(raw.to_string()) {
                Ok(cookie) => self.store(host.clone(), cookie),
                Err(e) => warn!(error = %e, "Failed to parse Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let map = self.cookies.get(&host_key(url))?;
        if map.is_empty() {
            return None;
        }

        let header = map
            .iter()
            .map(|entry| format!("{}={}", entry.value().name(), entry.value().value()))
            .collect::<Vec<_>>()
            .join("; ");

        match HeaderValue::from_str(&header) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Failed to build Cookie header");
                None
            }
        }
    }
}
