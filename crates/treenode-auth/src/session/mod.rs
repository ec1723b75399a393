//! Session authentication, cookies and client origin resolution.

pub mod authenticator;
pub mod cookies;
pub mod origin;

pub use authenticator::{LoginResult, SessionAuthenticator};
pub use cookies::{
    REFRESH_COOKIE_NAME, SESSION_COOKIE_NAME, SessionCookies, extract_credential_token,
    extract_refresh_token,
};
pub use origin::resolve_origin;
