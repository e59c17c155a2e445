use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gateway::{DataError, ErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ApiError {
    #[error("{0}")]
    Data(#[from] DataError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Data(e) => match e.kind() {
                ErrorKind::MissingParameter => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::UpstreamFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DataError::missing_symbol(), StatusCode::BAD_REQUEST),
            (
                DataError::InvalidParameter("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DataError::NotFound("No options available for NOOPT".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DataError::SymbolNotFound("ZZZZ".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DataError::Network("timeout".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DataError::Parse("bad json".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }
}
