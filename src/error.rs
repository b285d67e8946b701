use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use resvg::usvg::Error as SvgError;
use rusqlite::Error as SqliteError;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Database error: {0}")]
    Database(#[from] SqliteError),

    #[error("SVG error: {0}")]
    Svg(#[from] SvgError),

    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Blocking task was cancelled")]
    Blocking,

    #[error("Render error: {0}")]
    Render(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Generic error: {0}")]
    Generic(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(_: BlockingError) -> Self {
        AppError::Blocking
    }
}
