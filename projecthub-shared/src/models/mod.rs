/// Database models for ProjectHub
///
/// # Models
///
/// - `user`: user accounts
/// - `project`: projects owned by a user
/// - `task`: tasks owned by a user, optionally filed under one of their projects
/// - `status`: status and priority enumerations
/// - `patch`: partial-update plumbing shared by projects and tasks
///
/// Project and task queries always filter on `user_id`; there is no way to
/// read or write another user's rows through this module.
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::models::project::Project;
/// use projecthub_shared::models::task::Task;
/// use projecthub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let projects = Project::list_by_user(&pool, 1).await?;
/// let tasks = Task::list_by_user(&pool, 1).await?;
/// # Ok(())
/// # }
/// ```

pub mod patch;
pub mod project;
pub mod status;
pub mod task;
pub mod user;

pub use patch::PatchError;
pub use status::{ItemStatus, TaskPriority};

/// Error type for model writes that check ownership
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Project missing or owned by someone else
    #[error("project not found")]
    ProjectNotFound,

    /// Task missing or owned by someone else
    #[error("task not found")]
    TaskNotFound,

    /// Patch clears a required field
    #[error(transparent)]
    InvalidPatch(#[from] PatchError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
