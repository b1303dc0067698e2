/// Task model and database operations
///
/// Tasks belong to a user and optionally to one of that user's projects.
/// Every read joins `projects` so the project's name travels with the task.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     title       TEXT NOT NULL,
///     description TEXT,
///     status      TEXT NOT NULL DEFAULT 'pending',
///     priority    TEXT NOT NULL DEFAULT 'medium',
///     due_date    TEXT,
///     project_id  INTEGER REFERENCES projects(id),
///     user_id     INTEGER NOT NULL REFERENCES users(id),
///     created_at  TEXT NOT NULL,
///     updated_at  TEXT NOT NULL
/// );
/// ```
///
/// # Invariants
///
/// - A task's `project_id`, when set, references a project with the same
///   `user_id`. Creation and updates check this in the writing statement
///   itself, so no transaction reads before it holds the write lock.
/// - Lists are ordered by `due_date` ascending (tasks without a due date
///   first), then by id.
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::models::task::{CreateTask, Task};
/// use projecthub_shared::models::status::{ItemStatus, TaskPriority};
/// use projecthub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     user_id: 1,
///     title: "Write copy".to_string(),
///     description: None,
///     status: ItemStatus::Pending,
///     priority: TaskPriority::High,
///     due_date: None,
///     project_id: Some(4),
/// }).await?;
///
/// assert_eq!(task.project_id, Some(4));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::patch::{double_option, patch_date, PatchError, PatchSet, PatchValue};
use super::status::{ItemStatus, TaskPriority};
use super::ModelError;

const TABLE: &str = "tasks";

/// Shown when a patch clears or blanks the title
pub const TITLE_REQUIRED: &str = "El título de la tarea es requerido";

const STATUS_REQUIRED: &str = "El estado de la tarea es requerido";
const PRIORITY_REQUIRED: &str = "La prioridad de la tarea es requerida";

const SELECT_TASKS: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
           t.project_id, p.name AS project_name, t.user_id,
           t.created_at, t.updated_at
    FROM tasks t
    LEFT JOIN projects p ON p.id = t.project_id
"#;

/// A task, with the name of its project (if any)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: ItemStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<i64>,

    /// From the joined project row; `None` when the task has no project
    pub project_name: Option<String>,

    /// Owner
    pub user_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owner (the authenticated caller)
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: ItemStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,

    /// Must reference a project owned by `user_id`
    pub project_id: Option<i64>,
}

/// Partial update of a task
///
/// An explicit `"project_id": null` detaches the task from its project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<ItemStatus>>,

    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<TaskPriority>>,

    #[serde(default, deserialize_with = "patch_date")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<i64>>,
}

impl TaskPatch {
    /// Collects the present fields into assignments
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] if `title` is null or blank, or `status` or
    /// `priority` is null.
    pub fn to_patch_set(&self) -> Result<PatchSet, PatchError> {
        let mut set = PatchSet::new();
        set.required_text("title", &self.title, TITLE_REQUIRED)?;
        set.text("description", &self.description);
        set.status("status", &self.status, STATUS_REQUIRED)?;
        set.priority("priority", &self.priority, PRIORITY_REQUIRED)?;
        set.date("due_date", &self.due_date);
        set.reference("project_id", &self.project_id);
        Ok(set)
    }
}

impl Task {
    /// Lists all of the user's tasks
    pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "{} WHERE t.user_id = ? ORDER BY t.due_date ASC, t.id ASC",
            SELECT_TASKS
        );

        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists the user's tasks in one project
    pub async fn list_by_project(
        pool: &SqlitePool,
        project_id: i64,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "{} WHERE t.project_id = ? AND t.user_id = ? ORDER BY t.due_date ASC, t.id ASC",
            SELECT_TASKS
        );

        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Finds a task by ID, only if `user_id` owns it
    ///
    /// Accepts a pool or a transaction.
    pub async fn find_by_id_and_user<'e, E>(
        executor: E,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{} WHERE t.id = ? AND t.user_id = ?", SELECT_TASKS);

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(task)
    }

    /// Creates a task
    ///
    /// The insert itself carries the project check, so the transaction's
    /// first statement is a write and holds the database write lock.
    ///
    /// # Errors
    ///
    /// [`ModelError::ProjectNotFound`] if `project_id` is set and does not
    /// reference a project owned by `user_id`; no row is written.
    pub async fn create(pool: &SqlitePool, data: CreateTask) -> Result<Self, ModelError> {
        let mut tx = pool.begin().await?;

        let user_id = data.user_id;
        let project_id = data.project_id;
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, project_id, user_id)
            SELECT ?, ?, ?, ?, ?, ?, ?
            WHERE ? IS NULL
               OR EXISTS (SELECT 1 FROM projects WHERE id = ? AND user_id = ?)
            RETURNING id
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(project_id)
        .bind(user_id)
        .bind(project_id)
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let id = id.ok_or(ModelError::ProjectNotFound)?;

        let task = Self::find_by_id_and_user(&mut *tx, id, user_id)
            .await?
            .ok_or(ModelError::TaskNotFound)?;

        tx.commit().await?;

        debug!(task_id = id, user_id, project_id = ?task.project_id, "Task created");

        Ok(task)
    }

    /// Applies a partial update to a task owned by `user_id`
    ///
    /// Order of checks: patch validity, task ownership, then ownership of the
    /// new project (if `project_id` is set to a value). The update runs first,
    /// guarded by both ownership conditions; when it matches nothing, the
    /// same transaction works out which check failed.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidPatch`] if a required field is cleared
    /// - [`ModelError::TaskNotFound`] if the task is missing or not owned
    /// - [`ModelError::ProjectNotFound`] if the new project is not owned
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        user_id: i64,
        patch: &TaskPatch,
    ) -> Result<Self, ModelError> {
        let set = patch.to_patch_set()?;

        let mut tx = pool.begin().await?;

        let mut query = set.update_query(TABLE, id, user_id);
        if let Some(PatchValue::Reference(Some(project_id))) = set.get("project_id") {
            query
                .push(" AND EXISTS (SELECT 1 FROM projects WHERE id = ")
                .push_bind(*project_id)
                .push(" AND user_id = ")
                .push_bind(user_id)
                .push(")");
        }

        let result = query.build().execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            let owned: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM tasks WHERE id = ? AND user_id = ?)",
            )
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(if owned {
                ModelError::ProjectNotFound
            } else {
                ModelError::TaskNotFound
            });
        }

        let task = Self::find_by_id_and_user(&mut *tx, id, user_id)
            .await?
            .ok_or(ModelError::TaskNotFound)?;

        tx.commit().await?;

        debug!(task_id = id, columns = ?set.columns(), "Task updated");

        Ok(task)
    }

    /// Deletes a task owned by `user_id`
    ///
    /// # Returns
    ///
    /// `false` if no such task exists for this user.
    pub async fn delete(pool: &SqlitePool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
