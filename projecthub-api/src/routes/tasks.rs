/// Task endpoints (all authenticated)
///
/// - `GET /api/tasks` - The caller's tasks
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks/:id` - One task
/// - `PUT /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Delete a task
/// - `GET /api/tasks/project/:project_id` - Tasks in one of the caller's projects
///
/// Every task in a response carries `project_name` (null without a project).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    routes::projects::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use projecthub_shared::{
    auth::middleware::Identity,
    models::{
        patch::optional_date,
        project::Project,
        task::{CreateTask, Task, TaskPatch, TITLE_REQUIRED},
        ItemStatus, TaskPriority,
    },
};
use serde::{Deserialize, Serialize};

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,

    /// Defaults to `pending`
    pub status: Option<ItemStatus>,

    /// Defaults to `medium`
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "optional_date")]
    pub due_date: Option<NaiveDate>,

    /// Must be one of the caller's projects
    pub project_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: &'static str,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct ProjectTasksResponse {
    pub project_id: i64,
    pub project_name: String,
    pub tasks: Vec<Task>,
}

/// List the caller's tasks, by due date
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = Task::list_by_user(&state.db, identity.id).await?;

    Ok(Json(TaskListResponse { tasks }))
}

/// Get one task
///
/// # Errors
///
/// - `404 not_found`: missing or not owned
pub async fn get_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<TaskDetailResponse>> {
    let task = Task::find_by_id_and_user(&state.db, id, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tarea no encontrada".to_string()))?;

    Ok(Json(TaskDetailResponse { task }))
}

/// Create a task owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Authorization: Bearer <token>
///
/// { "title": "Write copy", "priority": "high", "due_date": "2025-03-01", "project_id": 4 }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: title missing or empty
/// - `404 not_found`: `project_id` is not one of the caller's projects
pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let title = match req.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => return Err(ApiError::invalid_field("title", TITLE_REQUIRED)),
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: identity.id,
            title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            due_date: req.due_date,
            project_id: req.project_id,
        },
    )
    .await?;

    tracing::info!(task_id = task.id, user_id = identity.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Tarea creada exitosamente",
            task,
        }),
    ))
}

/// Partially update a task
///
/// `"project_id": null` detaches the task from its project.
///
/// # Errors
///
/// - `400 validation_error`: title cleared, or status/priority set to null
/// - `404 not_found`: task not owned, or new project not owned
pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(id): AppPath<i64>,
    AppJson(patch): AppJson<TaskPatch>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::update(&state.db, id, identity.id, &patch).await?;

    Ok(Json(TaskResponse {
        message: "Tarea actualizada exitosamente",
        task,
    }))
}

/// Delete a task
///
/// # Errors
///
/// - `404 not_found`: missing or not owned
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !Task::delete(&state.db, id, identity.id).await? {
        return Err(ApiError::NotFound("Tarea no encontrada".to_string()));
    }

    tracing::info!(task_id = id, user_id = identity.id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Tarea eliminada exitosamente",
    }))
}

/// Tasks in one of the caller's projects
///
/// # Errors
///
/// - `404 not_found`: project missing or not owned
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(project_id): AppPath<i64>,
) -> ApiResult<Json<ProjectTasksResponse>> {
    let project = Project::find_by_id_and_user(&state.db, project_id, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Proyecto no encontrado".to_string()))?;

    let tasks = Task::list_by_project(&state.db, project.id, identity.id).await?;

    Ok(Json(ProjectTasksResponse {
        project_id: project.id,
        project_name: project.name,
        tasks,
    }))
}
