//! Username/password accounts and bearer tokens.
//!
//! # Example
//!
//! ```no_run
//! use slidecast::auth::{AuthService, Credentials, TokenIssuer, UserStore};
//!
//! let auth = AuthService::new(UserStore::open("slidecast.db")?, TokenIssuer::random(3600)?);
//! let creds = Credentials::new("alice", "correct horse");
//! auth.signup(&creds)?;
//! let login = auth.login(&creds)?;
//! let claims = auth.authenticate(&login.token)?;
//! assert_eq!(claims.sub, "alice");
//! # Ok::<(), slidecast::Error>(())
//! ```

mod password;
mod token;
mod users;

pub use password::PasswordHasher;
pub use token::{Claims, TokenIssuer};
pub use users::{User, UserStore};

use crate::error::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Signup and login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

/// Signup, login and token verification over a [`UserStore`].
#[derive(Debug)]
pub struct AuthService {
    users: UserStore,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    /// Verified against when the username is unknown
    dummy_hash: OnceLock<String>,
}

impl AuthService {
    pub fn new(users: UserStore, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher: PasswordHasher::default(),
            tokens,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Use a different password hasher (e.g. a cheaper cost in tests).
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self.dummy_hash = OnceLock::new();
        self
    }

    /// Register a new user.
    pub fn signup(&self, credentials: &Credentials) -> Result<()> {
        let username = normalize_username(&credentials.username)?;
        require_password(&credentials.password)?;

        if self.users.exists(&username)? {
            return Err(Error::UsernameTaken);
        }
        let hash = self.hasher.hash(&credentials.password)?;
        self.users.insert(&username, &hash)?;
        info!("registered user {}", username);
        Ok(())
    }

    /// Check credentials and issue a token.
    pub fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let username = normalize_username(&credentials.username)
            .map_err(|_| Error::InvalidCredentials)?;

        let Some(user) = self.users.find_by_username(&username)? else {
            // Same hashing work as a wrong password.
            self.hasher.verify(&credentials.password, self.dummy_hash());
            return Err(Error::InvalidCredentials);
        };
        if !self.hasher.verify(&credentials.password, &user.password_hash) {
            debug!("wrong password for {}", username);
            return Err(Error::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username)?;
        info!("user {} logged in", user.username);
        Ok(LoginResponse {
            token,
            username: user.username,
        })
    }

    fn dummy_hash(&self) -> &str {
        self.dummy_hash
            .get_or_init(|| self.hasher.hash("").unwrap_or_default())
    }

    /// Verify a raw token.
    pub fn authenticate(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token)
    }

    /// Verify an `Authorization` header value of the form `Bearer <token>`.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Claims> {
        let token = header
            .and_then(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingToken)?;
        self.authenticate(token)
    }
}

/// Trim and NFC-normalize a username so visually equal names collide.
fn normalize_username(raw: &str) -> Result<String> {
    let username: String = raw.trim().nfc().collect();
    if username.is_empty() {
        return Err(Error::InvalidInput("Username is required".to_string()));
    }
    Ok(username)
}

fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}
