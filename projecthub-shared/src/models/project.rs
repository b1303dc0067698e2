/// Project model and database operations
///
/// Every query is scoped by owner: a project is only visible to the user
/// whose id is in its `user_id` column.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     name        TEXT NOT NULL,
///     description TEXT,
///     status      TEXT NOT NULL DEFAULT 'pending',
///     start_date  TEXT,
///     end_date    TEXT,
///     user_id     INTEGER NOT NULL REFERENCES users(id),
///     created_at  TEXT NOT NULL,
///     updated_at  TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::models::project::{CreateProject, Project, ProjectPatch};
/// use projecthub_shared::models::status::ItemStatus;
/// use projecthub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     user_id: 1,
///     name: "Website".to_string(),
///     description: None,
///     status: ItemStatus::Pending,
///     start_date: None,
///     end_date: None,
/// }).await?;
///
/// let patch: ProjectPatch = serde_json::from_str(r#"{"status": "in_progress"}"#)?;
/// let updated = Project::update(&pool, project.id, 1, &patch).await?;
///
/// Project::delete_with_tasks(&pool, project.id, 1).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::patch::{double_option, patch_date, PatchError, PatchSet};
use super::status::ItemStatus;
use super::ModelError;

const TABLE: &str = "projects";

/// Shown when a patch clears or blanks the name
pub const NAME_REQUIRED: &str = "El nombre del proyecto es requerido";

const STATUS_REQUIRED: &str = "El estado del proyecto es requerido";

/// A project owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ItemStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    /// Owner
    pub user_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Owner (the authenticated caller)
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ItemStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Partial update of a project
///
/// See [`super::patch`] for the absent / null / value distinction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<ItemStatus>>,

    #[serde(default, deserialize_with = "patch_date")]
    pub start_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "patch_date")]
    pub end_date: Option<Option<NaiveDate>>,
}

impl ProjectPatch {
    /// Collects the present fields into assignments
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] if `name` is null or blank, or `status` is null.
    pub fn to_patch_set(&self) -> Result<PatchSet, PatchError> {
        let mut set = PatchSet::new();
        set.required_text("name", &self.name, NAME_REQUIRED)?;
        set.text("description", &self.description);
        set.status("status", &self.status, STATUS_REQUIRED)?;
        set.date("start_date", &self.start_date);
        set.date("end_date", &self.end_date);
        Ok(set)
    }
}

impl Project {
    /// Lists the user's projects, newest first
    pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, start_date, end_date, user_id,
                   created_at, updated_at
            FROM projects
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Finds a project by ID, only if `user_id` owns it
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
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, start_date, end_date, user_id,
                   created_at, updated_at
            FROM projects
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Creates a project
    pub async fn create(pool: &SqlitePool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, status, start_date, end_date, user_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, description, status, start_date, end_date, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        debug!(project_id = project.id, user_id = project.user_id, "Project created");

        Ok(project)
    }

    /// Applies a partial update to a project owned by `user_id`
    ///
    /// Only the fields present in `patch` are written; `updated_at` is
    /// always refreshed.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidPatch`] if a required field is cleared
    /// - [`ModelError::ProjectNotFound`] if the project is missing or not owned
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        user_id: i64,
        patch: &ProjectPatch,
    ) -> Result<Self, ModelError> {
        let set = patch.to_patch_set()?;

        let mut tx = pool.begin().await?;

        let result = set.update_query(TABLE, id, user_id).build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(ModelError::ProjectNotFound);
        }

        let project = Self::find_by_id_and_user(&mut *tx, id, user_id)
            .await?
            .ok_or(ModelError::ProjectNotFound)?;

        tx.commit().await?;

        debug!(project_id = id, columns = ?set.columns(), "Project updated");

        Ok(project)
    }

    /// Deletes a project and all of its tasks atomically
    ///
    /// # Returns
    ///
    /// `false` if the project does not exist or is not owned by `user_id`;
    /// nothing is deleted in that case.
    pub async fn delete_with_tasks(
        pool: &SqlitePool,
        id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let tasks = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE project_id = ?
              AND EXISTS (SELECT 1 FROM projects WHERE id = ? AND user_id = ?)
            "#,
        )
        .bind(id)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let project = sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if project.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit().await?;

        debug!(
            project_id = id,
            tasks_deleted = tasks.rows_affected(),
            "Project deleted"
        );

        Ok(true)
    }
}
