/// Project endpoints (all authenticated)
///
/// - `GET /api/projects` - The caller's projects, newest first
/// - `POST /api/projects` - Create a project
/// - `GET /api/projects/:id` - One project with its tasks
/// - `PUT /api/projects/:id` - Partial update
/// - `DELETE /api/projects/:id` - Delete a project and its tasks
///
/// A project owned by someone else answers exactly like a missing one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use projecthub_shared::{
    auth::middleware::Identity,
    models::{
        patch::optional_date,
        project::{CreateProject, Project, ProjectPatch, NAME_REQUIRED},
        task::Task,
        ItemStatus,
    },
};
use serde::{Deserialize, Serialize};

const PROJECT_NOT_FOUND: &str = "Proyecto no encontrado";

/// Create project request
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,

    /// Defaults to `pending`
    pub status: Option<ItemStatus>,

    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub project: Project,

    /// The project's tasks, by due date
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub message: &'static str,
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// List the caller's projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ProjectListResponse>> {
    let projects = Project::list_by_user(&state.db, identity.id).await?;

    Ok(Json(ProjectListResponse { projects }))
}

/// Get one project and its tasks
///
/// # Errors
///
/// - `404 not_found`: missing or not owned
pub async fn get_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let project = Project::find_by_id_and_user(&state.db, id, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

    let tasks = Task::list_by_project(&state.db, project.id, identity.id).await?;

    Ok(Json(ProjectDetailResponse { project, tasks }))
}

/// Create a project owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/projects
/// Authorization: Bearer <token>
///
/// { "name": "P1", "description": "...", "start_date": "2025-01-01" }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: name missing or empty
pub async fn create_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let name = match req.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ApiError::invalid_field("name", NAME_REQUIRED)),
    };

    let project = Project::create(
        &state.db,
        CreateProject {
            user_id: identity.id,
            name,
            description: req.description,
            status: req.status.unwrap_or_default(),
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, user_id = identity.id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            message: "Proyecto creado exitosamente",
            project,
        }),
    ))
}

/// Partially update a project
///
/// Only fields present in the body are changed; `null` clears nullable
/// fields.
///
/// # Errors
///
/// - `400 validation_error`: name cleared, or status set to null
/// - `404 not_found`: missing or not owned
pub async fn update_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(id): AppPath<i64>,
    AppJson(patch): AppJson<ProjectPatch>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = Project::update(&state.db, id, identity.id, &patch).await?;

    Ok(Json(ProjectResponse {
        message: "Proyecto actualizado exitosamente",
        project,
    }))
}

/// Delete a project and every task filed under it
///
/// # Errors
///
/// - `404 not_found`: missing or not owned
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !Project::delete_with_tasks(&state.db, id, identity.id).await? {
        return Err(ApiError::NotFound(PROJECT_NOT_FOUND.to_string()));
    }

    tracing::info!(project_id = id, user_id = identity.id, "Project deleted");

    Ok(Json(MessageResponse {
        message: "Proyecto eliminado exitosamente",
    }))
}
