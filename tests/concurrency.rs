//! Races against the hot paths: task claims, the request-to-project
//! transition, and ordered appends. Each is a single atomic statement, so
//! concurrent attempts must resolve to exactly one winner without
//! corrupting state.

use sqlx::SqlitePool;
use tempfile::TempDir;

use atelier::db::{connection, ordering, users};
use atelier::services::{
    assignment_service, checkpoint_service, request_service, task_service,
};
use atelier::{
    AtelierError, CreateCheckpoint, CreateRequest, CreateTask, DeveloperType, Principal,
    ProjectType, Role, TaskType, User,
};

async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let pool = connection::create_pool(&dir.path().join("test.db"))
        .await
        .expect("Failed to create pool");
    connection::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    (dir, pool)
}

async fn seed_developer(pool: &SqlitePool, id: &str, username: &str) -> Principal {
    let now = chrono::Utc::now().to_rfc3339();
    users::create(
        pool,
        &User {
            id: id.to_string(),
            username: username.to_string(),
            role: Role::Developer.as_str().to_string(),
            developer_type: DeveloperType::Frontend.as_str().to_string(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .await
    .expect("Failed to seed developer");
    Principal::developer(id, username, DeveloperType::Frontend)
}

async fn seed_manager(pool: &SqlitePool) -> Principal {
    let now = chrono::Utc::now().to_rfc3339();
    users::create(
        pool,
        &User {
            id: "u-mgr".to_string(),
            username: "maria".to_string(),
            role: Role::Manager.as_str().to_string(),
            developer_type: DeveloperType::None.as_str().to_string(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .await
    .expect("Failed to seed manager");
    Principal::new("u-mgr", "maria", Role::Manager)
}

async fn open_project(pool: &SqlitePool, mgr: &Principal, title: &str) -> String {
    let request = request_service::submit_request(
        pool,
        CreateRequest {
            project_type: ProjectType::Website,
            title: title.to_string(),
            description: String::new(),
            contact_email: "client@example.com".to_string(),
            contact_telegram: String::new(),
        },
        None,
    )
    .await
    .unwrap();
    let (_, project) = request_service::to_work(pool, mgr, &request.id).await.unwrap();
    project.id
}

fn frontend_task(title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: String::new(),
        task_type: TaskType::Frontend,
        assignee: None,
        due_date: None,
        story_points: 1,
        starts_after_task_id: None,
    }
}

#[tokio::test]
async fn test_raced_claims_have_one_winner() {
    let (_dir, pool) = test_pool().await;
    let mgr = seed_manager(&pool).await;
    let project_id = open_project(&pool, &mgr, "Landing").await;
    let task = task_service::create_task(&pool, &mgr, &project_id, frontend_task("Hero"))
        .await
        .unwrap();

    let alice = seed_developer(&pool, "u-alice", "alice").await;
    let bob = seed_developer(&pool, "u-bob", "bob").await;

    let (a, b) = tokio::join!(
        assignment_service::claim_task(&pool, &alice, &task.id),
        assignment_service::claim_task(&pool, &bob, &task.id),
    );

    // Exactly one winner; the loser sees a conflict
    let alice_won = a.is_ok();
    assert_eq!(alice_won as u8 + b.is_ok() as u8, 1);
    let loser = if alice_won { b } else { a };
    assert!(matches!(loser, Err(AtelierError::Conflict(_))));

    // The row carries exactly the winner afterwards
    let winner = if alice_won { "u-alice" } else { "u-bob" };
    let task = task_service::get_task(&pool, &task.id).await.unwrap();
    assert_eq!(task.assignee.as_deref(), Some(winner));
    assert_eq!(task.status, "in_progress");
}

#[tokio::test]
async fn test_raced_claims_across_two_tasks_respect_single_active() {
    let (_dir, pool) = test_pool().await;
    let mgr = seed_manager(&pool).await;
    let project_id = open_project(&pool, &mgr, "Landing").await;
    let first = task_service::create_task(&pool, &mgr, &project_id, frontend_task("A"))
        .await
        .unwrap();
    let second = task_service::create_task(&pool, &mgr, &project_id, frontend_task("B"))
        .await
        .unwrap();

    let dev = seed_developer(&pool, "u-dev", "dana").await;

    // One developer racing claims on two different tasks still ends up
    // holding at most one
    let (a, b) = tokio::join!(
        assignment_service::claim_task(&pool, &dev, &first.id),
        assignment_service::claim_task(&pool, &dev, &second.id),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

    let assigned = [
        task_service::get_task(&pool, &first.id).await.unwrap(),
        task_service::get_task(&pool, &second.id).await.unwrap(),
    ]
    .iter()
    .filter(|t| t.assignee.is_some())
    .count();
    assert_eq!(assigned, 1);
}

#[tokio::test]
async fn test_raced_to_work_creates_one_project() {
    let (_dir, pool) = test_pool().await;
    let mgr = seed_manager(&pool).await;

    let request = request_service::submit_request(
        &pool,
        CreateRequest {
            project_type: ProjectType::Website,
            title: "Shop".to_string(),
            description: String::new(),
            contact_email: "client@example.com".to_string(),
            contact_telegram: String::new(),
        },
        None,
    )
    .await
    .unwrap();

    let (a, b) = tokio::join!(
        request_service::to_work(&pool, &mgr, &request.id),
        request_service::to_work(&pool, &mgr, &request.id),
    );

    // Both calls succeed; they agree on the single stored project
    let (_, project_a) = a.unwrap();
    let (_, project_b) = b.unwrap();
    assert_eq!(project_a.id, project_b.id);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE client_request_id = ?")
            .bind(&request.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_raced_checkpoint_appends_get_unique_ranks() {
    let (_dir, pool) = test_pool().await;
    let mgr = seed_manager(&pool).await;
    let project_id = open_project(&pool, &mgr, "Landing").await;
    let task = task_service::create_task(&pool, &mgr, &project_id, frontend_task("Hero"))
        .await
        .unwrap();
    let scope = ordering::TASK_CHECKPOINTS;

    let make = |title: &str| {
        checkpoint_service::create_checkpoint(
            &pool,
            scope,
            &task.id,
            CreateCheckpoint {
                title: title.to_string(),
                comment: String::new(),
            },
        )
    };

    let (a, b, c, d) = tokio::join!(make("w"), make("x"), make("y"), make("z"));
    let mut ranks: Vec<i64> = [a, b, c, d]
        .into_iter()
        .map(|r| r.unwrap().ord)
        .collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_raced_moves_into_one_column_keep_ranks_unique() {
    let (_dir, pool) = test_pool().await;
    let mgr = seed_manager(&pool).await;
    let project_id = open_project(&pool, &mgr, "Landing").await;

    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let task = task_service::create_task(&pool, &mgr, &project_id, frontend_task(title))
            .await
            .unwrap();
        ids.push(task.id);
    }

    let (a, b, c) = tokio::join!(
        task_service::move_task(&pool, &mgr, &ids[0], "review"),
        task_service::move_task(&pool, &mgr, &ids[1], "review"),
        task_service::move_task(&pool, &mgr, &ids[2], "review"),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let board = task_service::board(&pool, &project_id).await.unwrap();
    let mut ranks: Vec<i64> = board.review.iter().map(|t| t.ord).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3]);
}
