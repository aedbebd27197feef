use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrewboardError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Upload error: {0}")]
    Upload(String),
}

impl From<std::io::Error> for CrewboardError {
    fn from(err: std::io::Error) -> Self {
        CrewboardError::Upload(err.to_string())
    }
}

impl From<sea_orm::DbErr> for CrewboardError {
    fn from(err: sea_orm::DbErr) -> Self {
        CrewboardError::Database(err.to_string())
    }
}
