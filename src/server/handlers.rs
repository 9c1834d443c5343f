//! Route handlers.

use super::AppState;
use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::state::current_state;
use crate::upload::{process_upload, UploadedFile};
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::MultipartForm;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;

/// Multipart body of an upload: any number of `files` parts.
#[derive(MultipartForm)]
pub struct UploadForm {
    files: Vec<TempFile>,
}

/// Run `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| Error::Internal(format!("worker failed: {e}")))?
}

fn authorize(state: &AppState, req: &HttpRequest) -> Result<()> {
    if !state.require_auth {
        return Ok(());
    }
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let claims = state.auth.authenticate_header(header)?;
    debug!("request by {}", claims.sub);
    Ok(())
}

/// `POST /api/upload`
pub async fn upload(
    state: web::Data<AppState>,
    req: HttpRequest,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<HttpResponse> {
    authorize(&state, &req)?;

    let mut files = Vec::with_capacity(form.files.len());
    for part in form.files {
        let data = tokio::fs::read(part.file.path()).await?;
        files.push(UploadedFile {
            name: part.file_name,
            data,
        });
    }

    let outcome = blocking(move || {
        process_upload(&state.store, state.rasterizer.as_ref(), &files)
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// `GET /api/current-state`
pub async fn current(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    authorize(&state, &req)?;
    let snapshot = blocking(move || current_state(&state.store)).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// `POST /api/auth/signup`
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse> {
    let credentials = body.into_inner();
    blocking(move || state.auth.signup(&credentials)).await?;
    Ok(HttpResponse::Ok().body("User registered successfully"))
}

/// `POST /api/auth/login`
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse> {
    let credentials = body.into_inner();
    let response = blocking(move || state.auth.login(&credentials)).await?;
    Ok(HttpResponse::Ok().json(response))
}
