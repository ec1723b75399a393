//! Shared fixtures for authentication integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};

use treenode_auth::{PasswordHasher, SessionAuthenticator};
use treenode_auth::store::{MemoryStore, UserStore};
use treenode_core::config::{
    AppConfig, AuthConfig, CookieConfig, DatabaseConfig, LockoutConfig, LoggingConfig,
    MaintenanceConfig,
};
use treenode_core::traits::ManualClock;
use treenode_entity::user::{User, UserRole};

/// Base64 of `0123456789abcdef0123456789abcdef`.
pub const SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

pub const PASSWORD: &str = "Corr3ctHorse";
pub const ORIGIN: &str = "203.0.113.5";
pub const OTHER_ORIGIN: &str = "198.51.100.9";

/// An authenticator over the in-memory store with a frozen clock.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub auth: SessionAuthenticator,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let start = DateTime::from_timestamp(1_750_000_000, 0).unwrap_or_else(Utc::now);
        let clock = ManualClock::new(start);
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let auth = SessionAuthenticator::with_store(&config, store.clone(), Arc::new(clock.clone()))
            .expect("valid test configuration");

        Self {
            store,
            clock,
            auth,
            config,
        }
    }

    /// Store a user with [`PASSWORD`].
    pub async fn create_user(&self, email: &str, confirmed: bool) -> User {
        let hash = PasswordHasher::new().hash_password(PASSWORD).unwrap();
        let username = email.split('@').next().unwrap_or(email);
        let mut user = User::new(username, email, hash, UserRole::User);
        user.email_confirmed = confirmed;
        self.store.insert_user(user.clone()).await;
        user
    }

    /// Current stored state of a user.
    pub async fn reload(&self, user: &User) -> User {
        self.store.find_by_id(user.id).await.unwrap().unwrap()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: "postgres://treenode@localhost/treenode_test".into(),
            max_connections: 1,
            min_connections: 0,
            connect_timeout_seconds: 1,
            idle_timeout_seconds: 1,
        },
        auth: AuthConfig::with_secret(SECRET),
        lockout: LockoutConfig::default(),
        cookies: CookieConfig::default(),
        maintenance: MaintenanceConfig::default(),
        logging: LoggingConfig::default(),
    }
}
