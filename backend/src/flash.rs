//! One-shot notices that survive a single redirect.
//!
//! Messages ride in a `flash` cookie as URL-safe base64 of the
//! newline-joined texts, so they never hit cookie-value escaping rules.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::engine::{general_purpose, Engine as _};

pub const FLASH_COOKIE: &str = "flash";

fn decode(value: &str) -> Vec<String> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map(|text| {
            text.lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn encode(messages: &[String]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(messages.join("\n"))
}

/// Queues `message` on top of whatever is already pending.
pub fn push(jar: CookieJar, message: impl Into<String>) -> CookieJar {
    let mut messages = jar
        .get(FLASH_COOKIE)
        .map(|cookie| decode(cookie.value()))
        .unwrap_or_default();
    messages.push(message.into());

    jar.add(
        Cookie::build((FLASH_COOKIE, encode(&messages)))
            .path("/")
            .http_only(true),
    )
}

/// Drains pending messages; the returned jar clears the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    match jar.get(FLASH_COOKIE).map(|cookie| decode(cookie.value())) {
        Some(messages) => {
            let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
            (jar, messages)
        }
        None => (jar, Vec::new()),
    }
}
