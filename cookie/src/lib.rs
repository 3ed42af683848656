use cookie::Cookie;
use http::{header, HeaderMap, HeaderName, HeaderValue};

mod builder;
mod config;

pub use config::{CookieConfig, SameSitePolicy};
pub use cookie;

/// Value added to `Cache-Control` whenever a session cookie is written.
pub const CACHE_CONTROL_NO_CACHE_SET_COOKIE: &str = r#"no-cache="Set-Cookie""#;
/// Value added to `Vary` whenever a session cookie is written.
pub const VARY_COOKIE: &str = "Cookie";

/// Extract cookies from request headers
pub fn cookies_from_request(headers: &HeaderMap) -> impl Iterator<Item = Cookie<'static>> + '_ {
    headers
        .get_all(header::COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| Cookie::parse_encoded(cookie.trim().to_owned()).ok())
}

/// Finds the first request cookie called `name`.
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<Cookie<'static>> {
    cookies_from_request(headers).find(|cookie| cookie.name() == name)
}

/// Appends a `Set-Cookie` header for `cookie`.
pub fn set_cookie(cookie: &Cookie<'_>, headers: &mut HeaderMap) {
    match HeaderValue::try_from(cookie.encoded().to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(cookie = cookie.name(), "cookie is not a valid header value");
        }
    }
}

/// Appends `name: value` unless that exact pair is already present.
pub fn add_header_if_missing(headers: &mut HeaderMap, name: HeaderName, value: &'static str) {
    if headers.get_all(&name).iter().any(|existing| existing == value) {
        return;
    }
    headers.append(name, HeaderValue::from_static(value));
}

/// Writes the session cookie along with the headers that keep shared caches
/// from storing it.
pub fn write_session_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    set_cookie(cookie, headers);
    add_header_if_missing(
        headers,
        header::CACHE_CONTROL,
        CACHE_CONTROL_NO_CACHE_SET_COOKIE,
    );
    add_header_if_missing(headers, header::VARY, VARY_COOKIE);
}
