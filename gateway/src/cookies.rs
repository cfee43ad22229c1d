use std::time::Duration;

use hyper::Uri;
use hyper::header::{COOKIE, HeaderMap, HeaderValue, InvalidHeaderValue};
use tracing::{debug, warn};

/// Extract cookie value by name
pub fn get_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name.trim() == cookie_name).then(|| value.trim().to_string())
        })
        .or_else(|| {
            debug!("Cookie not found: {}", cookie_name);
            None
        })
}

fn build_cookie(
    name: &str,
    value: &str,
    max_age: Duration,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        name,
        value,
        max_age.as_secs()
    );

    if secure {
        cookie.push_str("; Secure");
    }

    cookie.push_str("; SameSite=Strict");

    HeaderValue::from_str(&cookie).inspect_err(|e| {
        warn!("Failed to create cookie header for {}: {}", name, e);
    })
}

/// `Set-Cookie` value carrying a fresh session token. The cookie lives as
/// long as the session does.
pub fn session_cookie(
    name: &str,
    token: &str,
    ttl: Duration,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    debug!("Setting session cookie {} for {:?}", name, ttl);
    build_cookie(name, token, ttl, secure)
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    debug!("Clearing cookie: {}", name);
    build_cookie(name, "", Duration::ZERO, secure)
}

/// The `token` query parameter of an email link, decoded.
pub fn token_from_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
