pub mod auth;
pub mod cli;
pub mod clock;
pub mod comment;
pub mod entity;
pub mod error;
pub mod extract;
pub mod logging;
pub mod middleware;
pub mod migration;
pub mod objectstore;
pub mod openapi;
pub mod project;
pub mod service;
pub mod storage;
pub mod verification;
#[cfg(test)]
mod tests;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{header, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use crewboard_shared::error::CrewboardError;
use crewboard_shared::AddrInfo;
use sea_orm::DatabaseConnection;
use std::{borrow::Cow, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tower::{BoxError, ServiceBuilder};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::error;

use crate::{
    auth::JwtConfig,
    cli::{db_path_default, CliOpts},
    clock::{Clock, SystemClock},
    comment::{delete_comment, get_comments, post_comment, update_comment},
    logging::logging_layer,
    objectstore::{download_file, DbObjectStorage, ObjectStorage},
    project::{
        delete_favorite, delete_project, get_favorite_projects, get_hot_projects,
        get_my_projects, get_project, get_projects, post_favorite, post_project, update_project,
    },
    service::{CommentService, ProjectService},
};

pub type SharedState = Arc<RwLock<AppState>>;

/// Largest multipart submission accepted for a project
pub const UPLOAD_LIMIT_BYTES: usize = 20 * 1024 * 1024;

pub struct AppState {
    pub conn: DatabaseConnection,
    pub storage: Arc<dyn ObjectStorage>,
    pub clock: Arc<dyn Clock>,
    pub jwt: JwtConfig,
}

impl AppState {
    pub async fn new(cli: &CliOpts) -> Result<Self, CrewboardError> {
        let jwt = JwtConfig::new(cli.jwt_secret.clone(), cli.jwt_expiry_mins)?;
        let db_path = cli.db_path.clone().unwrap_or(db_path_default().into());
        let conn = storage::new(&db_path).await.map_err(|err| {
            CrewboardError::Database(format!("Failed to open {}: {:?}", db_path.display(), err))
        })?;
        let public_url = cli
            .public_url
            .clone()
            .unwrap_or_else(|| AddrInfo::from_env().as_url());
        let storage = Arc::new(DbObjectStorage::new(conn.clone(), &public_url));

        Ok(Self::with_parts(conn, storage, Arc::new(SystemClock), jwt))
    }

    pub fn with_parts(
        conn: DatabaseConnection,
        storage: Arc<dyn ObjectStorage>,
        clock: Arc<dyn Clock>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            conn,
            storage,
            clock,
            jwt,
        }
    }

    pub fn projects(&self) -> ProjectService<'_> {
        ProjectService::new(&self.conn, self.storage.as_ref(), self.clock.as_ref())
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(&self.conn, self.clock.as_ref())
    }
}

pub fn build_app<T>(shared_state: &SharedState) -> Router<T> {
    // Build our application by composing routes
    let router = Router::new()
        .route(
            "/api/v1/projects",
            get(get_projects)
                .post(post_project)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/api/v1/projects/hot", get(get_hot_projects))
        .route("/api/v1/projects/favorites", get(get_favorite_projects))
        .route("/api/v1/projects/mine", get(get_my_projects))
        .route(
            "/api/v1/projects/{id}",
            get(get_project)
                .put(update_project)
                .patch(update_project)
                .delete(delete_project)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/v1/projects/{id}/favorite",
            post(post_favorite).delete(delete_favorite),
        )
        .route(
            "/api/v1/comments/{project_id}",
            get(get_comments)
                .post(post_comment)
                .patch(update_comment)
                .delete(delete_comment),
        )
        .route("/api/v1/files/{id}", get(download_file))
        .merge(openapi::api_route());

    router
        // Add middleware to all routes
        .layer(
            ServiceBuilder::new()
                // Handle errors from middleware
                .layer(middleware::corslayer())
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    |response: &Response<Body>| {
                        if response.status() == StatusCode::OK {
                            "private, no-transform max-age=0".parse().ok()
                        } else {
                            None
                        }
                    },
                ))
                .layer(HandleErrorLayer::new(handle_error))
                .load_shed()
                .concurrency_limit(1024)
                .timeout(Duration::from_secs(10))
                .layer(logging_layer()),
        )
        .with_state(shared_state.clone())
}

async fn handle_error(error: BoxError) -> impl IntoResponse {
    if error.is::<tower::timeout::error::Elapsed>() {
        return (StatusCode::REQUEST_TIMEOUT, Cow::from("request timed out"));
    }

    if error.is::<tower::load_shed::error::Overloaded>() {
        let msg = "service is overloaded, try again later";
        error!("{}", msg);
        return (StatusCode::SERVICE_UNAVAILABLE, Cow::from(msg));
    }

    let msg = format!("Unhandled internal error: {error}");
    error!("{}", msg);
    (StatusCode::INTERNAL_SERVER_ERROR, Cow::from(msg))
}

#[tokio::test]
async fn test_handle_error() {
    let err = tower::timeout::error::Elapsed::new();
    let res = handle_error(Box::new(err)).await.into_response();
    let expected = (StatusCode::REQUEST_TIMEOUT, Cow::from("request timed out")).into_response();

    assert_eq!(res.status(), expected.status());

    let err = tower::load_shed::error::Overloaded::new();
    let res = handle_error(Box::new(err)).await.into_response();
    let expected = (
        StatusCode::SERVICE_UNAVAILABLE,
        Cow::from("service is overloaded, try again later"),
    )
        .into_response();

    assert_eq!(res.status(), expected.status());
}
