/// Integration tests for the user, project and task models
///
/// Each test gets a fresh in-memory database with migrations applied.

use chrono::NaiveDate;
use projecthub_shared::db::migrations::run_migrations;
use projecthub_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use projecthub_shared::models::project::{CreateProject, Project, ProjectPatch};
use projecthub_shared::models::task::{CreateTask, Task, TaskPatch};
use projecthub_shared::models::user::{CreateUser, User};
use projecthub_shared::models::{ItemStatus, ModelError, TaskPriority};
use sqlx::SqlitePool;

async fn setup() -> SqlitePool {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

async fn user(pool: &SqlitePool, name: &str) -> User {
    User::create(
        pool,
        CreateUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "$argon2id$test".to_string(),
        },
    )
    .await
    .expect("Failed to create user")
}

async fn project(pool: &SqlitePool, user_id: i64, name: &str) -> Project {
    Project::create(
        pool,
        CreateProject {
            user_id,
            name: name.to_string(),
            description: None,
            status: ItemStatus::default(),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .expect("Failed to create project")
}

fn new_task(user_id: i64, title: &str, project_id: Option<i64>) -> CreateTask {
    CreateTask {
        user_id,
        title: title.to_string(),
        description: Some("details".to_string()),
        status: ItemStatus::default(),
        priority: TaskPriority::High,
        due_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        project_id,
    }
}

async fn task_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await
        .expect("Failed to count tasks")
}

#[tokio::test]
async fn test_user_lookup_and_uniqueness() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;

    let by_email = User::find_by_email(&pool, "alice@example.com").await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(alice.id));

    let by_name = User::find_by_username(&pool, "alice").await.unwrap();
    assert_eq!(by_name.map(|u| u.email), Some(alice.email.clone()));

    let duplicate = User::create(
        &pool,
        CreateUser {
            username: "alice2".to_string(),
            email: alice.email.clone(),
            password_hash: "x".to_string(),
        },
    )
    .await;

    match duplicate {
        Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
        other => panic!("Expected unique violation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_project_defaults_and_ownership() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;

    let p1 = project(&pool, alice.id, "P1").await;
    assert_eq!(p1.status, ItemStatus::Pending);

    assert!(Project::find_by_id_and_user(&pool, p1.id, alice.id)
        .await
        .unwrap()
        .is_some());
    assert!(Project::find_by_id_and_user(&pool, p1.id, bob.id)
        .await
        .unwrap()
        .is_none());
    assert!(Project::list_by_user(&pool, bob.id).await.unwrap().is_empty());

    let patch: ProjectPatch = serde_json::from_str(r#"{"name": "stolen"}"#).unwrap();
    let result = Project::update(&pool, p1.id, bob.id, &patch).await;
    assert!(matches!(result, Err(ModelError::ProjectNotFound)));

    assert!(!Project::delete_with_tasks(&pool, p1.id, bob.id).await.unwrap());
    assert!(Project::find_by_id_and_user(&pool, p1.id, alice.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_projects_listed_newest_first() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;

    let first = project(&pool, alice.id, "first").await;
    let second = project(&pool, alice.id, "second").await;

    let ids: Vec<i64> = Project::list_by_user(&pool, alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_project_partial_update() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let created = Project::create(
        &pool,
        CreateProject {
            user_id: alice.id,
            name: "P1".to_string(),
            description: Some("desc".to_string()),
            status: ItemStatus::Pending,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31),
        },
    )
    .await
    .unwrap();

    let patch: ProjectPatch =
        serde_json::from_str(r#"{"status": "in_progress", "end_date": null}"#).unwrap();
    let updated = Project::update(&pool, created.id, alice.id, &patch)
        .await
        .unwrap();

    assert_eq!(updated.status, ItemStatus::InProgress);
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.name, "P1");
    assert_eq!(updated.description.as_deref(), Some("desc"));
    assert_eq!(updated.start_date, created.start_date);
    assert!(updated.updated_at >= created.updated_at);

    let invalid: ProjectPatch = serde_json::from_str(r#"{"name": ""}"#).unwrap();
    assert!(matches!(
        Project::update(&pool, created.id, alice.id, &invalid).await,
        Err(ModelError::InvalidPatch(_))
    ));
}

#[tokio::test]
async fn test_delete_project_removes_its_tasks() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let p1 = project(&pool, alice.id, "P1").await;
    let p2 = project(&pool, alice.id, "P2").await;

    Task::create(&pool, new_task(alice.id, "a", Some(p1.id))).await.unwrap();
    Task::create(&pool, new_task(alice.id, "b", Some(p1.id))).await.unwrap();
    let kept = Task::create(&pool, new_task(alice.id, "c", Some(p2.id))).await.unwrap();
    assert_eq!(task_count(&pool).await, 3);

    assert!(Project::delete_with_tasks(&pool, p1.id, alice.id).await.unwrap());

    assert!(Project::find_by_id_and_user(&pool, p1.id, alice.id)
        .await
        .unwrap()
        .is_none());
    assert!(Task::list_by_project(&pool, p1.id, alice.id)
        .await
        .unwrap()
        .is_empty());

    let remaining = Task::list_by_user(&pool, alice.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
}

#[tokio::test]
async fn test_task_create_carries_project_name() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let p1 = project(&pool, alice.id, "Website").await;

    let task = Task::create(&pool, new_task(alice.id, "copy", Some(p1.id)))
        .await
        .unwrap();
    assert_eq!(task.project_name.as_deref(), Some("Website"));
    assert_eq!(task.priority, TaskPriority::High);

    let loose = Task::create(&pool, new_task(alice.id, "loose", None)).await.unwrap();
    assert!(loose.project_name.is_none());
}

#[tokio::test]
async fn test_task_create_rejects_foreign_project() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let bobs = project(&pool, bob.id, "Bob's").await;

    let result = Task::create(&pool, new_task(alice.id, "sneaky", Some(bobs.id))).await;
    assert!(matches!(result, Err(ModelError::ProjectNotFound)));

    let result = Task::create(&pool, new_task(alice.id, "ghost", Some(9999))).await;
    assert!(matches!(result, Err(ModelError::ProjectNotFound)));

    assert_eq!(task_count(&pool).await, 0);
}

#[tokio::test]
async fn test_task_status_update_keeps_other_fields() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let created = Task::create(&pool, new_task(alice.id, "t", None)).await.unwrap();

    let patch: TaskPatch = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
    let updated = Task::update(&pool, created.id, alice.id, &patch).await.unwrap();

    assert_eq!(updated.status, ItemStatus::Completed);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.priority, created.priority);
    assert_eq!(updated.due_date, created.due_date);
}

#[tokio::test]
async fn test_task_update_project_checks() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let mine = project(&pool, alice.id, "mine").await;
    let theirs = project(&pool, bob.id, "theirs").await;

    let task = Task::create(&pool, new_task(alice.id, "t", Some(mine.id)))
        .await
        .unwrap();

    let move_away: TaskPatch =
        serde_json::from_str(&format!(r#"{{"project_id": {}}}"#, theirs.id)).unwrap();
    assert!(matches!(
        Task::update(&pool, task.id, alice.id, &move_away).await,
        Err(ModelError::ProjectNotFound)
    ));

    let ghost: TaskPatch = serde_json::from_str(r#"{"project_id": 9999}"#).unwrap();
    assert!(matches!(
        Task::update(&pool, task.id, alice.id, &ghost).await,
        Err(ModelError::ProjectNotFound)
    ));

    let unchanged = Task::find_by_id_and_user(&pool, task.id, alice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.project_id, Some(mine.id));

    let detach: TaskPatch = serde_json::from_str(r#"{"project_id": null}"#).unwrap();
    let detached = Task::update(&pool, task.id, alice.id, &detach).await.unwrap();
    assert!(detached.project_id.is_none());
    assert!(detached.project_name.is_none());

    let hijack: TaskPatch = serde_json::from_str(r#"{"title": "mine now"}"#).unwrap();
    assert!(matches!(
        Task::update(&pool, task.id, bob.id, &hijack).await,
        Err(ModelError::TaskNotFound)
    ));
}

#[tokio::test]
async fn test_tasks_ordered_by_due_date() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;

    let mut late = new_task(alice.id, "late", None);
    late.due_date = NaiveDate::from_ymd_opt(2025, 9, 1);
    let mut early = new_task(alice.id, "early", None);
    early.due_date = NaiveDate::from_ymd_opt(2025, 2, 1);

    Task::create(&pool, late).await.unwrap();
    Task::create(&pool, early).await.unwrap();

    let titles: Vec<String> = Task::list_by_user(&pool, alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["early", "late"]);
}

#[tokio::test]
async fn test_task_delete_is_owner_scoped() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let task = Task::create(&pool, new_task(alice.id, "t", None)).await.unwrap();

    assert!(!Task::delete(&pool, task.id, bob.id).await.unwrap());
    assert!(Task::delete(&pool, task.id, alice.id).await.unwrap());
    assert!(!Task::delete(&pool, task.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_project_rolls_back_when_project_delete_fails() {
    let pool = setup().await;
    let alice = user(&pool, "alice").await;
    let p1 = project(&pool, alice.id, "P1").await;

    Task::create(&pool, new_task(alice.id, "a", Some(p1.id))).await.unwrap();
    Task::create(&pool, new_task(alice.id, "b", Some(p1.id))).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER keep_projects BEFORE DELETE ON projects \
         BEGIN SELECT RAISE(ABORT, 'projects are locked'); END",
    )
    .execute(&pool)
    .await
    .expect("Failed to create trigger");

    let result = Project::delete_with_tasks(&pool, p1.id, alice.id).await;
    assert!(result.is_err());

    assert_eq!(task_count(&pool).await, 2);
    assert!(Project::find_by_id_and_user(&pool, p1.id, alice.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_on_file_database() {
    let path = std::env::temp_dir().join(format!("projecthub-{}.sqlite", uuid::Uuid::new_v4()));
    let pool = create_pool(DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        ..Default::default()
    })
    .await
    .expect("Failed to create file pool");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let alice = user(&pool, "alice").await;
    let p1 = project(&pool, alice.id, "P1").await;
    let p2 = project(&pool, alice.id, "P2").await;

    let mut ids = Vec::new();
    for i in 0..20 {
        let task = Task::create(&pool, new_task(alice.id, &format!("seed {}", i), Some(p1.id)))
            .await
            .unwrap();
        ids.push(task.id);
    }

    let mut handles = Vec::new();
    for (i, id) in ids.into_iter().enumerate() {
        let update_pool = pool.clone();
        let user_id = alice.id;
        let (from, to) = if i % 2 == 0 { (p1.id, p2.id) } else { (p2.id, p1.id) };

        handles.push(tokio::spawn(async move {
            let patch: TaskPatch = serde_json::from_str(&format!(
                r#"{{"title": "moved {}", "project_id": {}}}"#,
                i, to
            ))
            .unwrap();
            Task::update(&update_pool, id, user_id, &patch).await.map(|_| ())
        }));

        let insert_pool = pool.clone();
        handles.push(tokio::spawn(async move {
            Task::create(&insert_pool, new_task(user_id, &format!("new {}", i), Some(from)))
                .await
                .map(|_| ())
        }));
    }

    let mut failures = Vec::new();
    for handle in handles {
        if let Err(e) = handle.await.unwrap() {
            failures.push(e.to_string());
        }
    }

    assert!(failures.is_empty(), "concurrent writes failed: {:?}", failures);
    assert_eq!(task_count(&pool).await, 40);

    assert!(Project::delete_with_tasks(&pool, p2.id, alice.id).await.unwrap());
    assert!(Task::list_by_user(&pool, alice.id)
        .await
        .unwrap()
        .iter()
        .all(|t| t.project_id == Some(p1.id)));

    close_pool(pool).await;
    let _ = std::fs::remove_file(&path);
}
