use axum::extract::{Multipart, State};
use axum::Json;
use crewboard_shared::project::{
    HotListQuery, PageRequest, ProjectDetail, ProjectRequest, ProjectSearch, ProjectSummary,
};
use crewboard_shared::response::{CommonApiResponse, PageApiResponse};
use tracing::{debug, error};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::WebError;
use crate::extract::{ApiPath, ApiQuery};
use crate::objectstore::UploadedFile;
use crate::SharedState;

pub const METADATA_FIELD: &str = "metadata";
pub const FILE_FIELD: &str = "file";

/// Pull the JSON metadata and the optional file out of a project submission.
async fn read_submission(
    mut multipart: Multipart,
) -> Result<(ProjectRequest, Option<UploadedFile>), WebError> {
    let mut metadata = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {:?}", e);
        WebError::bad_request(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        debug!("Processing field: {}", field_name);

        match field_name.as_str() {
            METADATA_FIELD => {
                let text = field.text().await.map_err(|e| {
                    WebError::bad_request(format!("Failed to read metadata: {}", e))
                })?;
                metadata = Some(serde_json::from_str::<ProjectRequest>(&text)?);
            }
            FILE_FIELD => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await.map_err(|e| {
                    error!("Failed to read file data: {:?}", e);
                    WebError::bad_request(format!("Failed to read file data: {}", e))
                })?;
                debug!(
                    "File name: {}, content type: {}, {} bytes",
                    filename,
                    content_type,
                    data.len()
                );
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {
                debug!("Ignoring unknown multipart field: {}", field_name);
            }
        }
    }

    let metadata = metadata
        .ok_or_else(|| WebError::bad_request(format!("Missing {METADATA_FIELD} field")))?;
    Ok((metadata, file))
}

/// Create a project from a multipart submission
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body(content = ProjectRequest, content_type = "multipart/form-data", description = "`metadata` JSON and an optional `file`"),
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 400, description = "Malformed submission"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn post_project(
    State(state): State<SharedState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let (request, file) = read_submission(multipart).await?;
    let state = state.read().await;
    let message = state
        .projects()
        .create(request, file, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(ProjectSearch),
    responses((status = 200, body = PageApiResponse<ProjectSummary>))
)]
pub async fn get_projects(
    State(state): State<SharedState>,
    ApiQuery(search): ApiQuery<ProjectSearch>,
) -> Result<Json<PageApiResponse<ProjectSummary>>, WebError> {
    let page = state.read().await.projects().find_list(&search).await?;
    Ok(Json(page.into()))
}

/// Pulls a project's details, counting the view.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, body = CommonApiResponse<ProjectDetail>),
        (status = 404, description = "Project not found"),
    )
)]
pub async fn get_project(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<SharedState>,
) -> Result<Json<CommonApiResponse<ProjectDetail>>, WebError> {
    match state.read().await.projects().find_by_id(id).await? {
        Some(detail) => Ok(Json(CommonApiResponse::ok(detail))),
        None => Err(WebError::not_found(format!("Project {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/hot",
    params(HotListQuery),
    responses((status = 200, body = CommonApiResponse<Vec<ProjectSummary>>))
)]
pub async fn get_hot_projects(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<HotListQuery>,
) -> Result<Json<CommonApiResponse<Vec<ProjectSummary>>>, WebError> {
    let projects = state
        .read()
        .await
        .projects()
        .find_hot_list(query.size)
        .await?;
    Ok(Json(CommonApiResponse::ok(projects)))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/favorites",
    params(PageRequest),
    responses(
        (status = 200, body = PageApiResponse<ProjectSummary>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_favorite_projects(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiQuery(paging): ApiQuery<PageRequest>,
) -> Result<Json<PageApiResponse<ProjectSummary>>, WebError> {
    let page = state
        .read()
        .await
        .projects()
        .find_favorite_list(user.user_id, paging)
        .await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/mine",
    params(PageRequest),
    responses(
        (status = 200, body = PageApiResponse<ProjectSummary>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_my_projects(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiQuery(paging): ApiQuery<PageRequest>,
) -> Result<Json<PageApiResponse<ProjectSummary>>, WebError> {
    let page = state
        .read()
        .await
        .projects()
        .find_my_list(user.user_id, paging)
        .await?;
    Ok(Json(page.into()))
}

/// Replace a project's contents, only the owner may do this
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body(content = ProjectRequest, content_type = "multipart/form-data", description = "`metadata` JSON and an optional replacement `file`"),
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 403, description = "Caller doesn't own the project"),
        (status = 404, description = "Project not found"),
    )
)]
pub async fn update_project(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let (request, file) = read_submission(multipart).await?;
    let state = state.read().await;
    let message = state
        .projects()
        .update(id, request, file, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}

/// DELETE handler, removes the project and its stored file
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 404, description = "No such project owned by the caller"),
    )
)]
pub async fn delete_project(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let message = state
        .read()
        .await
        .projects()
        .delete(id, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/favorite",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 404, description = "Project not found"),
    )
)]
pub async fn post_favorite(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let message = state
        .read()
        .await
        .projects()
        .add_favorite(id, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}/favorite",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, body = CommonApiResponse<String>))
)]
pub async fn delete_favorite(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let message = state
        .read()
        .await
        .projects()
        .remove_favorite(id, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}
