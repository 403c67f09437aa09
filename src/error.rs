use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read people file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse people file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("No slide contains a person matching {0}")]
    SlideNotFound(String),
    #[error("Unknown tag type: {0}")]
    UnknownTagType(String),
    #[error(transparent)]
    Reload(#[from] DatasetError),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::SlideNotFound(_) => "SLIDE_NOT_FOUND",
            Self::UnknownTagType(_) => "INVALID_TAG_TYPE",
            Self::Reload(_) => "RELOAD_FAILED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::SlideNotFound(_) => StatusCode::NOT_FOUND,
            Self::UnknownTagType(_) => StatusCode::BAD_REQUEST,
            Self::Reload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({
                "error": {
                    "code": self.code(),
                    "message": self.to_string(),
                }
            })),
        )
            .into_response()
    }
}
