mod categories;
mod questions;
mod quizzes;

pub use categories::category_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Every failure a handler can report. The first three render as the
/// `{success, error, message}` envelope, store failures on read paths as a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest,
    #[error("resource not found")]
    NotFound,
    #[error("unprocessable entity")]
    Unprocessable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Database(error) = &self {
            tracing::error!("Unhandled store failure: {error}");
            return status.into_response();
        }
        let body = json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Successful body: the payload's fields next to `"success": true`.
#[derive(Serialize, Debug)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

pub type ApiResponse<T> = Result<Json<Success<T>>, ApiError>;

pub fn success<T: Serialize>(body: T) -> ApiResponse<T> {
    Ok(Json(Success {
        success: true,
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_envelope() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": 404, "message": "resource not found"})
        );
    }

    #[tokio::test]
    async fn bad_request_and_unprocessable_envelopes() {
        let response = ApiError::BadRequest.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "bad request");

        let response = ApiError::Unprocessable.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": 422, "message": "unprocessable entity"})
        );
    }

    #[tokio::test]
    async fn store_failure_is_bare_500() {
        let response = ApiError::from(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn success_flattens_body() {
        #[derive(Serialize)]
        struct Deleted {
            deleted: i64,
        }
        let Json(body) = success(Deleted { deleted: 4 }).unwrap();
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "deleted": 4})
        );
    }
}
