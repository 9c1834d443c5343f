//! HTTP mapping for [`Error`].

use crate::error::Error;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NoFiles | Error::InvalidInput(_) | Error::UsernameTaken => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::MissingToken | Error::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = if status.is_server_error() {
            error!("request failed: {}", self);
            format!("Backend Error: {}", self)
        } else {
            self.to_string()
        };
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}
