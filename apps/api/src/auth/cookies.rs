//! The refresh token cookie.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::Config;

pub const REFRESH_COOKIE: &str = "refresh_token";

fn attributes(config: &Config, max_age_secs: i64) -> String {
    let mut attrs = format!("Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if config.secure_cookies() {
        attrs.push_str(&format!("; Domain={}; Secure", config.cookie_domain));
    }
    attrs
}

/// `Set-Cookie` value that stores `token` for the refresh lifetime.
pub fn refresh_cookie(config: &Config, token: &str) -> HeaderValue {
    let value = format!(
        "{REFRESH_COOKIE}={token}; {}",
        attributes(config, config.refresh_token_hours * 3600)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value that removes the refresh cookie.
pub fn clear_refresh_cookie(config: &Config) -> HeaderValue {
    let value = format!("{REFRESH_COOKIE}=; {}", attributes(config, 0));
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Reads the refresh token from the request's `Cookie` headers.
pub fn read_refresh_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_refresh_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=abc.def.ghi; lang=en"),
        );
        assert_eq!(read_refresh_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(read_refresh_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("refresh_token="));
        assert_eq!(read_refresh_token(&headers), None);
    }

    #[test]
    fn test_cookie_flags_on_localhost() {
        let config = Config::for_tests();
        let cookie = refresh_cookie(&config, "tok");
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("refresh_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=172800"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_cookie_secure_off_localhost() {
        let mut config = Config::for_tests();
        config.cookie_domain = "resume.example.com".into();
        let cookie = clear_refresh_cookie(&config);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Domain=resume.example.com; Secure"));
    }
}
