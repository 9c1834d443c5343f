//! HS256-signed bearer tokens (JWT).

use crate::error::{Error, Result};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::{Deserialize, Serialize};

const RANDOM_SECRET_LEN: usize = 32;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// Issues and verifies tokens with one shared secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("token secret must not be empty".to_string()));
        }
        if ttl_secs <= 0 {
            return Err(Error::Config("token lifetime must be positive".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        })
    }

    /// Issuer with a random secret; its tokens die with the process.
    pub fn random(ttl_secs: i64) -> Result<Self> {
        let mut secret = [0u8; RANDOM_SECRET_LEN];
        OsRng
            .try_fill_bytes(&mut secret)
            .map_err(|e| Error::Internal(format!("failed to generate token secret: {e}")))?;
        Self::new(&secret, ttl_secs)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, username: &str) -> Result<String> {
        self.issue_at(username, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, username: &str, now: i64) -> Result<String> {
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify signature and algorithm, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| {
                let reason = match e.kind() {
                    ErrorKind::InvalidSignature => "bad signature",
                    ErrorKind::InvalidAlgorithm => "unsupported algorithm",
                    _ => "malformed",
                };
                Error::InvalidToken(reason.to_string())
            },
        )?;
        if now >= data.claims.exp {
            return Err(Error::InvalidToken("expired".to_string()));
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
