//! Session and refresh cookies, and token extraction from requests.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue};

use treenode_core::config::{AuthConfig, CookieConfig};

/// Cookie carrying the credential token.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh";

/// Builds `Set-Cookie` values for the two session cookies.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    domain: String,
    secure: bool,
    refresh_path: String,
    credential_max_age: i64,
    refresh_max_age: i64,
}

impl SessionCookies {
    /// Creates the builder from configuration.
    pub fn new(cookies: &CookieConfig, auth: &AuthConfig) -> Self {
        Self {
            domain: cookies.domain.clone(),
            secure: cookies.secure,
            refresh_path: cookies.refresh_path.clone(),
            credential_max_age: auth.credential_ttl_seconds,
            refresh_max_age: auth.refresh_ttl_seconds,
        }
    }

    /// `session` cookie for a credential token, sent on every path.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build(SESSION_COOKIE_NAME, token, "/", self.credential_max_age)
    }

    /// `refresh` cookie for a refresh token, sent only to the refresh path.
    pub fn refresh_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build(REFRESH_COOKIE_NAME, token, &self.refresh_path, self.refresh_max_age)
    }

    /// Expire both cookies.
    pub fn clear_cookies(&self) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
        Ok([
            self.build(SESSION_COOKIE_NAME, "", "/", 0)?,
            self.build(REFRESH_COOKIE_NAME, "", &self.refresh_path, 0)?,
        ])
    }

    fn build(
        &self,
        name: &str,
        value: &str,
        path: &str,
        max_age: i64,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{name}={value}; Domain={}; Path={path}; HttpOnly; SameSite=Strict; Max-Age={max_age}",
            self.domain
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Credential token from `Authorization: Bearer`, else the `session` cookie.
pub fn extract_credential_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, SESSION_COOKIE_NAME))
}

/// Refresh token from the `refresh` cookie.
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, REFRESH_COOKIE_NAME)
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies() -> SessionCookies {
        SessionCookies::new(&CookieConfig::default(), &AuthConfig::with_secret(""))
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = cookies().session_cookie("abc.def.ghi").unwrap();
        let cookie = cookie.to_str().unwrap();

        assert!(cookie.starts_with("session=abc.def.ghi; "));
        assert!(cookie.contains("Domain=localhost"));
        assert!(cookie.contains("Path=/;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_refresh_cookie_is_path_scoped() {
        let cookie = cookies().refresh_cookie("r.r.r").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.contains("Path=/auth/refresh;"));
        assert!(cookie.contains("Max-Age=129600"));
    }

    #[test]
    fn test_clear_cookies_expire_both() {
        let [session, refresh] = cookies().clear_cookies().unwrap();
        assert!(session.to_str().unwrap().starts_with("session=; "));
        assert!(session.to_str().unwrap().contains("Max-Age=0"));
        assert!(refresh.to_str().unwrap().contains("Path=/auth/refresh"));
    }

    #[test]
    fn test_insecure_cookie_omits_secure() {
        let config = CookieConfig {
            secure: false,
            ..CookieConfig::default()
        };
        let cookies = SessionCookies::new(&config, &AuthConfig::with_secret(""));
        let cookie = cookies.session_cookie("t").unwrap();
        assert!(!cookie.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("session=from-cookie"));
        assert_eq!(extract_credential_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=s.s.s; refresh=r.r.r"));
        assert_eq!(extract_credential_token(&headers).as_deref(), Some("s.s.s"));
        assert_eq!(extract_refresh_token(&headers).as_deref(), Some("r.r.r"));
        assert_eq!(extract_refresh_token(&HeaderMap::new()), None);
    }
}
