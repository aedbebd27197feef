use axum::extract::State;
use axum::Json;
use crewboard_shared::comment::{CommentTarget, CommentUpdate, CommentView};
use crewboard_shared::project::PageRequest;
use crewboard_shared::response::{CommonApiResponse, SliceApiResponse};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::WebError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::SharedState;

/// Post a comment, the body is the raw comment text
#[utoipa::path(
    post,
    path = "/api/v1/comments/{project_id}",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 404, description = "Project not found"),
    )
)]
pub async fn post_comment(
    ApiPath(project_id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
    content: String,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let state = state.read().await;
    let message = state
        .comments()
        .post(project_id, &content, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/{project_id}",
    params(("project_id" = Uuid, Path, description = "Project id"), PageRequest),
    responses((status = 200, body = SliceApiResponse<CommentView>))
)]
pub async fn get_comments(
    ApiPath(project_id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    ApiQuery(paging): ApiQuery<PageRequest>,
) -> Result<Json<SliceApiResponse<CommentView>>, WebError> {
    let slice = state
        .read()
        .await
        .comments()
        .list(project_id, paging)
        .await?;
    Ok(Json(slice.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/{project_id}",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = CommentUpdate,
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 403, description = "Caller didn't write the comment"),
        (status = 404, description = "Comment not found"),
    )
)]
pub async fn update_comment(
    ApiPath(project_id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(update): ApiJson<CommentUpdate>,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let state = state.read().await;
    let message = state
        .comments()
        .update(project_id, update, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{project_id}",
    params(("project_id" = Uuid, Path, description = "Project id"), CommentTarget),
    responses(
        (status = 200, body = CommonApiResponse<String>),
        (status = 403, description = "Caller didn't write the comment"),
        (status = 404, description = "Comment not found"),
    )
)]
pub async fn delete_comment(
    ApiPath(project_id): ApiPath<Uuid>,
    State(state): State<SharedState>,
    user: AuthUser,
    ApiQuery(target): ApiQuery<CommentTarget>,
) -> Result<Json<CommonApiResponse<String>>, WebError> {
    let state = state.read().await;
    let message = state
        .comments()
        .delete(project_id, target.comment_id, user.user_id)
        .await?;
    Ok(Json(CommonApiResponse::ok(message)))
}
