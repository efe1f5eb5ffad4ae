/// Task endpoints
///
/// All routes require a bearer token and membership of the task's list.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use todolist_shared::{
    auth::context::RequestContext,
    models::{ListId, TaskId, TaskProjection, TaskUpdate},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub list_id: ListId,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Full replacement of a task's mutable fields
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    pub list_id: ListId,
}

/// `POST /v1/tasks`, returns `201 Created`
pub async fn add_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskProjection>)> {
    req.validate()?;

    let task = state
        .tasks
        .add_task(&ctx, req.list_id, &req.title, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /v1/tasks?list_id=`
pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<TasksQuery>,
) -> ApiResult<Json<Vec<TaskProjection>>> {
    Ok(Json(state.tasks.get_tasks(&ctx, query.list_id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(task_id): Path<TaskId>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskProjection>> {
    req.validate()?;

    let update = TaskUpdate {
        title: req.title,
        description: req.description,
        completed: req.completed,
    };
    Ok(Json(state.tasks.update_task(&ctx, task_id, update).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    state.tasks.delete_task(&ctx, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
