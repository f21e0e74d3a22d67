//! One-shot notices carried across a redirect in a cookie.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const FLASH_COOKIE: &str = "flash";

/// Redirect back to the referring page (or `/`) with `notice` attached.
pub fn redirect_with_notice(headers: &HeaderMap, notice: &str) -> Response {
    let location = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/");
    log::info!("Redirecting to {} with notice '{}'", location, notice);

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        urlencoding::encode(notice)
    );

    let mut response = StatusCode::FOUND.into_response();
    let response_headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(location) {
        response_headers.insert(header::LOCATION, value);
    } else {
        response_headers.insert(header::LOCATION, HeaderValue::from_static("/"));
    }
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response_headers.insert(header::SET_COOKIE, value);
    }
    response
}

/// The pending notice in the request cookies, if any.
pub fn take_notice(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|v| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value that removes the notice.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("flash=; Path=/; Max-Age=0")
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
