//! One-shot flash messages carried in a cookie across a redirect.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "neutronote_flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    /// `success` or `error`.
    pub category: String,
    pub message: String,
}

fn decode(jar: &CookieJar) -> Vec<FlashMessage> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    URL_SAFE_NO_PAD
        .decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| {
            debug!("discarding unreadable flash cookie");
            Vec::new()
        })
}

fn removal() -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE).path("/").build()
}

/// Queue a message for the next rendered page.
pub fn push(jar: CookieJar, category: &str, message: impl Into<String>) -> CookieJar {
    let mut messages = decode(&jar);
    messages.push(FlashMessage {
        category: category.to_string(),
        message: message.into(),
    });
    let Ok(json) = serde_json::to_vec(&messages) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, URL_SAFE_NO_PAD.encode(json)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn error(jar: CookieJar, message: impl Into<String>) -> CookieJar {
    push(jar, "error", message)
}

pub fn success(jar: CookieJar, message: impl Into<String>) -> CookieJar {
    push(jar, "success", message)
}

/// Take all queued messages, clearing the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let messages = decode(&jar);
    if messages.is_empty() && jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }
    (jar.remove(removal()), messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_take() {
        let jar = error(CookieJar::new(), "Please enter a run number.");
        let jar = success(jar, "Notebook configured for IPTS-1");
        let (_jar, messages) = take(jar);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].category, "error");
        assert_eq!(messages[1].message, "Notebook configured for IPTS-1");
    }

    #[test]
    fn test_take_empty_jar() {
        let (_jar, messages) = take(CookieJar::new());
        assert!(messages.is_empty());
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "%%%"));
        let (jar, messages) = take(jar);
        assert!(messages.is_empty());
        assert!(jar.get(FLASH_COOKIE).is_none());
    }
}
