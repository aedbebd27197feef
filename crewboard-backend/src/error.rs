use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use crewboard_shared::error::CrewboardError;
use sea_orm::DbErr;
use tracing::error;

#[derive(Debug)]
pub struct WebError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: String) -> Self {
        let code = match status {
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::BAD_REQUEST => "VALIDATION_ERROR",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            _ => "INTERNAL_ERROR",
        };
        WebError {
            status,
            code,
            message,
        }
    }

    pub fn not_found(message: String) -> Self {
        WebError::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: String) -> Self {
        WebError::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": self.message,
            "code": self.code,
        });
        let mut response = axum::response::Response::new(body.to_string().into());
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

impl From<CrewboardError> for WebError {
    fn from(err: CrewboardError) -> Self {
        let (status, code, message) = match err {
            CrewboardError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            CrewboardError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            CrewboardError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            CrewboardError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            CrewboardError::Upload(msg) => {
                error!(error = %msg, "Object storage failure");
                (StatusCode::BAD_GATEWAY, "UPLOAD_ERROR", msg)
            }
            CrewboardError::Database(msg) | CrewboardError::Configuration(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };
        WebError {
            status,
            code,
            message,
        }
    }
}

impl From<DbErr> for WebError {
    fn from(err: DbErr) -> Self {
        CrewboardError::from(err).into()
    }
}

impl From<serde_json::Error> for WebError {
    fn from(err: serde_json::Error) -> Self {
        WebError::bad_request(format!("Failed to parse request: {err}"))
    }
}

impl From<PathRejection> for WebError {
    fn from(rejection: PathRejection) -> Self {
        WebError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        WebError::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        WebError::bad_request(rejection.body_text())
    }
}
