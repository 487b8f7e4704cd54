//! Error types for the application

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Reference palette is empty")]
    EmptyPalette,

    #[error("Malformed palette row at line {line}: {reason}")]
    MalformedPaletteRow { line: u64, reason: String },

    #[error("Failed to read palette table: {0}")]
    PaletteTable(#[from] csv::Error),

    #[error("Coordinate ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBoundsCoordinate {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    #[error("Invalid form data: {0}")]
    InvalidForm(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::OutOfBoundsCoordinate { .. }
            | AppError::ImageDecode(_)
            | AppError::InvalidForm(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::EmptyPalette
            | AppError::MalformedPaletteRow { .. }
            | AppError::PaletteTable(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, message).into_response()
    }
}
