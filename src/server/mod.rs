//! HTTP front end.
//!
//! Routes:
//!
//! - `POST /api/upload`: multipart `files`, replaces the slide set
//! - `GET /api/current-state`: slide listing
//! - `POST /api/auth/signup`, `POST /api/auth/login`
//! - static slide images under the configured public path

mod error;
mod handlers;

pub use handlers::UploadForm;

use crate::auth::{AuthService, TokenIssuer, UserStore};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::render::{OoxmlRasterizer, RasterOptions, SlideRasterizer};
use crate::store::SlideStore;
use actix_cors::Cors;
use actix_files::Files;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};

/// Shared state behind every request.
pub struct AppState {
    pub store: SlideStore,
    pub rasterizer: Box<dyn SlideRasterizer>,
    pub auth: AuthService,
    pub require_auth: bool,
    pub public_path: String,
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(
        store: SlideStore,
        rasterizer: impl SlideRasterizer + 'static,
        auth: AuthService,
    ) -> Self {
        let defaults = ServerConfig::default();
        Self {
            store,
            rasterizer: Box::new(rasterizer),
            auth,
            require_auth: defaults.require_auth,
            public_path: defaults.public_path,
            upload_limit: defaults.upload_limit,
        }
    }

    pub fn with_require_auth(mut self, require: bool) -> Self {
        self.require_auth = require;
        self
    }

    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_path = path.into();
        self
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = bytes;
        self
    }

    /// Open the store and user database named by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let store = SlideStore::open(&config.slides_dir)?;
        let users = UserStore::open(&config.database)?;
        let tokens = match &config.token_secret {
            Some(secret) => TokenIssuer::new(secret.as_bytes(), config.token_ttl_secs)?,
            None => {
                warn!("no token secret configured; tokens will not survive a restart");
                TokenIssuer::random(config.token_ttl_secs)?
            }
        };
        let rasterizer = OoxmlRasterizer::new(RasterOptions::new().with_scale(config.scale));

        Ok(Self::new(store, rasterizer, AuthService::new(users, tokens))
            .with_require_auth(config.require_auth)
            .with_public_path(config.public_path.clone())
            .with_upload_limit(config.upload_limit))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("require_auth", &self.require_auth)
            .field("public_path", &self.public_path)
            .finish_non_exhaustive()
    }
}

/// Register routes and shared state on an [`App`].
pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let multipart = MultipartFormConfig::default()
            .total_limit(state.upload_limit)
            .memory_limit(state.upload_limit);
        let slides = Files::new(&state.public_path, state.store.root());

        cfg.app_data(state)
            .app_data(multipart)
            .service(
                web::scope("/api")
                    .route("/upload", web::post().to(handlers::upload))
                    .route("/current-state", web::get().to(handlers::current))
                    .route("/auth/signup", web::post().to(handlers::signup))
                    .route("/auth/login", web::post().to(handlers::login)),
            )
            .service(slides);
    }
}

/// Serve until the process is stopped.
pub async fn run(config: ServerConfig) -> Result<()> {
    let state = web::Data::new(AppState::from_config(&config)?);
    info!(
        "listening on {} (slides under {}, auth {})",
        config.bind,
        config.public_path,
        if config.require_auth { "required" } else { "optional" }
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(Cors::permissive())
            .configure(configure(state.clone()))
    })
    .bind(&config.bind)?
    .run()
    .await?;

    info!("server stopped");
    Ok(())
}

/// [`run`] on a fresh actix system, for synchronous callers.
pub fn serve_blocking(config: ServerConfig) -> Result<()> {
    actix_web::rt::System::new().block_on(run(config))
}
