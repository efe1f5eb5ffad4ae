/// To-do list endpoints
///
/// All routes require a bearer token. Any member may read a list; only the
/// owner may change its roster or title, or delete it.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use todolist_shared::{
    auth::context::RequestContext,
    models::{ListId, TodoListProjection},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub member_email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
}

/// `POST /v1/todolists`, returns `201 Created`
pub async fn create_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<TodoListProjection>)> {
    req.validate()?;

    let list = state.lists.create_list(&ctx, &req.title).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// `GET /v1/todolists`, every list the caller belongs to
pub async fn list_lists(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Vec<TodoListProjection>>> {
    Ok(Json(state.lists.list_lists_for_user(&ctx).await?))
}

pub async fn get_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(list_id): Path<ListId>,
) -> ApiResult<Json<TodoListProjection>> {
    Ok(Json(state.lists.get_list(&ctx, list_id).await?))
}

/// `POST /v1/todolists/:id/members`
///
/// # Errors
///
/// - `400 Bad Request`: Already a member
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Unknown list or email
pub async fn add_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(list_id): Path<ListId>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<TodoListProjection>> {
    req.validate()?;

    let list = state
        .lists
        .add_member(&ctx, list_id, &req.member_email)
        .await?;
    Ok(Json(list))
}

/// `DELETE /v1/todolists/:id/members/:email`
///
/// The owner can never be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((list_id, member_email)): Path<(ListId, String)>,
) -> ApiResult<Json<TodoListProjection>> {
    let list = state
        .lists
        .remove_member(&ctx, list_id, &member_email)
        .await?;
    Ok(Json(list))
}

pub async fn update_title(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(list_id): Path<ListId>,
    Json(req): Json<UpdateTitleRequest>,
) -> ApiResult<Json<TodoListProjection>> {
    req.validate()?;

    let list = state.lists.update_title(&ctx, list_id, &req.title).await?;
    Ok(Json(list))
}

/// `DELETE /v1/todolists/:id`, deletes the list with all its tasks
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(list_id): Path<ListId>,
) -> ApiResult<StatusCode> {
    state.lists.delete_list(&ctx, list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
