//! Server configuration.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Default token lifetime, one day.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Default total multipart upload limit, 100 MiB.
pub const DEFAULT_UPLOAD_LIMIT: usize = 100 * 1024 * 1024;

/// Settings for the HTTP server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,

    /// Directory holding the slide images
    pub slides_dir: PathBuf,

    /// URL prefix the slide directory is served under
    pub public_path: String,

    /// SQLite user database
    pub database: PathBuf,

    /// HMAC secret for bearer tokens; random per process when `None`
    pub token_secret: Option<String>,

    /// Token lifetime in seconds
    pub token_ttl_secs: i64,

    /// Require a bearer token for upload and state endpoints
    pub require_auth: bool,

    /// Total multipart payload limit in bytes
    pub upload_limit: usize,

    /// Raster scale for converted presentations
    pub scale: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            slides_dir: PathBuf::from("slides"),
            public_path: "/slides".to_string(),
            database: PathBuf::from("slidecast.db"),
            token_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            require_auth: false,
            upload_limit: DEFAULT_UPLOAD_LIMIT,
            scale: 1.0,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_slides_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.slides_dir = dir.into();
        self
    }

    /// Set the public URL prefix. A leading `/` is added and trailing ones dropped.
    pub fn with_public_path(mut self, path: impl AsRef<str>) -> Self {
        let trimmed = path.as_ref().trim().trim_matches('/');
        self.public_path = format!("/{}", trimmed);
        self
    }

    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = path.into();
        self
    }

    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token_secret = Some(secret.into());
        self
    }

    pub fn with_token_ttl(mut self, secs: i64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    pub fn with_require_auth(mut self, require: bool) -> Self {
        self.require_auth = require;
        self
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = bytes;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(Error::Config("bind address must not be empty".to_string()));
        }
        if self.public_path == "/" {
            return Err(Error::Config(
                "public path must not be the site root".to_string(),
            ));
        }
        if matches!(self.token_secret.as_deref(), Some("")) {
            return Err(Error::Config("token secret must not be empty".to_string()));
        }
        if self.token_ttl_secs <= 0 {
            return Err(Error::Config("token lifetime must be positive".to_string()));
        }
        if self.upload_limit == 0 {
            return Err(Error::Config("upload limit must be positive".to_string()));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::Config(format!("invalid raster scale {}", self.scale)));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("slides_dir", &self.slides_dir)
            .field("public_path", &self.public_path)
            .field("database", &self.database)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("require_auth", &self.require_auth)
            .field("upload_limit", &self.upload_limit)
            .field("scale", &self.scale)
            .finish()
    }
}
