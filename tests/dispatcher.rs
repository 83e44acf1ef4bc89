//! JSON contract tests for the command dispatcher and the daemon routing
//! layer: action verbs, wire error codes, envelope shapes, authorization.

use sqlx::SqlitePool;
use tempfile::TempDir;

use atelier::api;
use atelier::daemon::{self, protocol::Operation};
use atelier::db::{connection, users};
use atelier::services::{request_service, task_service};
use atelier::{
    CreateRequest, CreateTask, DeveloperType, Principal, ProjectType, Role, TaskType, User,
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

async fn seed_user(pool: &SqlitePool, id: &str, username: &str, role: Role) -> Principal {
    let now = chrono::Utc::now().to_rfc3339();
    users::create(
        pool,
        &User {
            id: id.to_string(),
            username: username.to_string(),
            role: role.as_str().to_string(),
            developer_type: DeveloperType::None.as_str().to_string(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .await
    .expect("Failed to seed user");
    Principal::new(id, username, role)
}

async fn setup_board(pool: &SqlitePool) -> (Principal, String, String) {
    let mgr = seed_user(pool, "u-mgr", "maria", Role::Manager).await;
    let request = request_service::submit_request(
        pool,
        CreateRequest {
            project_type: ProjectType::Website,
            title: "Landing".to_string(),
            description: String::new(),
            contact_email: "client@example.com".to_string(),
            contact_telegram: String::new(),
        },
        None,
    )
    .await
    .unwrap();
    let (_, project) = request_service::to_work(pool, &mgr, &request.id).await.unwrap();
    let task = task_service::create_task(
        pool,
        &mgr,
        &project.id,
        CreateTask {
            title: "Hero".to_string(),
            description: String::new(),
            task_type: TaskType::Frontend,
            assignee: None,
            due_date: None,
            story_points: 3,
            starts_after_task_id: None,
        },
    )
    .await
    .unwrap();
    (mgr, request.id, task.id)
}

// ============================================================================
// Kanban move
// ============================================================================

#[tokio::test]
async fn test_kanban_move_happy_path() {
    let (_dir, pool) = test_pool().await;
    let (mgr, _request_id, task_id) = setup_board(&pool).await;

    let body = format!(r#"{{"id":"{}","status":"review"}}"#, task_id);
    let reply = api::kanban::move_card(&pool, &mgr, &body).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["ok"], serde_json::json!(true));
    assert_eq!(reply.body["status"], serde_json::json!("review"));
    assert_eq!(reply.body["order"], serde_json::json!(1));
}

#[tokio::test]
async fn test_kanban_move_error_codes() {
    let (_dir, pool) = test_pool().await;
    let (mgr, _request_id, task_id) = setup_board(&pool).await;

    // Not JSON at all
    let reply = api::kanban::move_card(&pool, &mgr, "{oops").await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body["error"], serde_json::json!("invalid_json"));

    // Missing fields
    let reply = api::kanban::move_card(&pool, &mgr, r#"{"id":"t"}"#).await;
    assert_eq!(reply.body["error"], serde_json::json!("invalid_payload"));

    // Unknown column
    let body = format!(r#"{{"id":"{}","status":"limbo"}}"#, task_id);
    let reply = api::kanban::move_card(&pool, &mgr, &body).await;
    assert_eq!(reply.body["error"], serde_json::json!("bad_status"));

    // Unknown task
    let reply = api::kanban::move_card(&pool, &mgr, r#"{"id":"nope","status":"done"}"#).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body["error"], serde_json::json!("not_found"));
}

#[tokio::test]
async fn test_kanban_move_requires_manager() {
    let (_dir, pool) = test_pool().await;
    let (_mgr, _request_id, task_id) = setup_board(&pool).await;
    let dev = Principal::developer("u-dev", "dana", DeveloperType::Frontend);

    let body = format!(r#"{{"id":"{}","status":"review"}}"#, task_id);
    let reply = api::kanban::move_card(&pool, &dev, &body).await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.body["error"], serde_json::json!("forbidden"));
}

// ============================================================================
// Request checkpoint commands
// ============================================================================

#[tokio::test]
async fn test_request_checkpoint_actions() {
    let (_dir, pool) = test_pool().await;
    let (mgr, request_id, _task_id) = setup_board(&pool).await;

    // create
    let reply = api::request_checkpoints::handle(
        &pool,
        &mgr,
        &request_id,
        r#"{"action":"create","title":"Kickoff","comment":"call the client"}"#,
    )
    .await;
    assert_eq!(reply.status, 200);
    let checkpoint_id = reply.body["checkpoint"]["id"].as_str().unwrap().to_string();
    assert_eq!(reply.body["checkpoint"]["ord"], serde_json::json!(1));

    // update only is_done
    let body = format!(r#"{{"action":"update","id":"{}","is_done":true}}"#, checkpoint_id);
    let reply = api::request_checkpoints::handle(&pool, &mgr, &request_id, &body).await;
    assert_eq!(reply.status, 200);

    // reorder with a non-list payload
    let reply = api::request_checkpoints::handle(
        &pool,
        &mgr,
        &request_id,
        r#"{"action":"reorder","ids":"abc"}"#,
    )
    .await;
    assert_eq!(reply.body["error"], serde_json::json!("ids_list_required"));

    // delete
    let body = format!(r#"{{"action":"delete","id":"{}"}}"#, checkpoint_id);
    let reply = api::request_checkpoints::handle(&pool, &mgr, &request_id, &body).await;
    assert_eq!(reply.status, 200);

    // deleting again is not found
    let reply = api::request_checkpoints::handle(&pool, &mgr, &request_id, &body).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body["error"], serde_json::json!("not_found"));
}

#[tokio::test]
async fn test_unknown_action_is_bad_action() {
    let (_dir, pool) = test_pool().await;
    let (mgr, request_id, _task_id) = setup_board(&pool).await;

    let reply = api::request_checkpoints::handle(
        &pool,
        &mgr,
        &request_id,
        r#"{"action":"explode"}"#,
    )
    .await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body["error"], serde_json::json!("bad_action"));
}

#[tokio::test]
async fn test_create_with_blank_title_is_rejected() {
    let (_dir, pool) = test_pool().await;
    let (mgr, request_id, _task_id) = setup_board(&pool).await;

    let reply = api::request_checkpoints::handle(
        &pool,
        &mgr,
        &request_id,
        r#"{"action":"create","title":"   "}"#,
    )
    .await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body["error"], serde_json::json!("title_required"));
}

// ============================================================================
// Task panel
// ============================================================================

#[tokio::test]
async fn test_task_panel_defaults_to_detail() {
    let (_dir, pool) = test_pool().await;
    let (mgr, _request_id, task_id) = setup_board(&pool).await;

    let reply = api::task_panel::handle(&pool, &mgr, &task_id, "").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["task"]["title"], serde_json::json!("Hero"));
    assert_eq!(reply.body["task"]["status_label"], serde_json::json!("To do"));
    assert!(reply.body["checkpoints"].as_array().unwrap().is_empty());
    assert!(reply.body["chat"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_task_panel_chat_add() {
    let (_dir, pool) = test_pool().await;
    let (mgr, _request_id, task_id) = setup_board(&pool).await;

    let reply = api::task_panel::handle(
        &pool,
        &mgr,
        &task_id,
        r#"{"action":"chat_add","text":"looks good"}"#,
    )
    .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["text"], serde_json::json!("looks good"));

    // Blank text is rejected with its dedicated code
    let reply = api::task_panel::handle(
        &pool,
        &mgr,
        &task_id,
        r#"{"action":"chat_add","text":"  "}"#,
    )
    .await;
    assert_eq!(reply.body["error"], serde_json::json!("text_required"));
}

#[tokio::test]
async fn test_task_checkpoint_cross_parent_is_not_found() {
    let (_dir, pool) = test_pool().await;
    let (mgr, _request_id, task_id) = setup_board(&pool).await;

    let reply = api::task_panel::handle(
        &pool,
        &mgr,
        &task_id,
        r#"{"action":"checkpoint_create","title":"step"}"#,
    )
    .await;
    let checkpoint_id = reply.body["checkpoint"]["id"].as_str().unwrap().to_string();

    // A second task never sees the first task's checkpoint
    let other = task_service::create_task(
        &pool,
        &mgr,
        &task_service::get_task(&pool, &task_id).await.unwrap().project_id,
        CreateTask {
            title: "Nav".to_string(),
            description: String::new(),
            task_type: TaskType::Frontend,
            assignee: None,
            due_date: None,
            story_points: 1,
            starts_after_task_id: None,
        },
    )
    .await
    .unwrap();

    let body = format!(r#"{{"action":"checkpoint_delete","id":"{}"}}"#, checkpoint_id);
    let reply = api::task_panel::handle(&pool, &mgr, &other.id, &body).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body["error"], serde_json::json!("not_found"));
}

// ============================================================================
// Request detail access
// ============================================================================

#[tokio::test]
async fn test_request_detail_owner_and_stranger() {
    let (_dir, pool) = test_pool().await;
    let _mgr = seed_user(&pool, "u-mgr", "maria", Role::Manager).await;
    let owner = seed_user(&pool, "u-owner", "carol", Role::Client).await;
    let stranger = seed_user(&pool, "u-other", "oscar", Role::Client).await;

    let request = request_service::submit_request(
        &pool,
        CreateRequest {
            project_type: ProjectType::Bot,
            title: "Support bot".to_string(),
            description: String::new(),
            contact_email: "carol@example.com".to_string(),
            contact_telegram: String::new(),
        },
        Some(&owner),
    )
    .await
    .unwrap();

    let reply = api::request_checkpoints::detail(&pool, &owner, &request.id).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["request"]["title"], serde_json::json!("Support bot"));

    let reply = api::request_checkpoints::detail(&pool, &stranger, &request.id).await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.body["error"], serde_json::json!("forbidden"));
}

// ============================================================================
// Daemon routing
// ============================================================================

#[tokio::test]
async fn test_daemon_requires_principal_for_privileged_ops() {
    let (_dir, pool) = test_pool().await;

    let reply = daemon::handle_operation(&pool, None, Operation::ListRequests).await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.body["error"], serde_json::json!("forbidden"));
}

#[tokio::test]
async fn test_daemon_submit_is_anonymous() {
    let (_dir, pool) = test_pool().await;

    let reply = daemon::handle_operation(
        &pool,
        None,
        Operation::SubmitRequest(CreateRequest {
            project_type: ProjectType::Mobile,
            title: "Fitness app".to_string(),
            description: String::new(),
            contact_email: "someone@example.com".to_string(),
            contact_telegram: "@someone".to_string(),
        }),
    )
    .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["request"]["status"], serde_json::json!("new"));
    assert!(reply.body["request"]["client_id"].is_null());
}

#[tokio::test]
async fn test_daemon_list_requests_scoped_by_role() {
    let (_dir, pool) = test_pool().await;
    let mgr = seed_user(&pool, "u-mgr", "maria", Role::Manager).await;
    let client = seed_user(&pool, "u-client", "carol", Role::Client).await;

    for (title, principal) in [("Mine", Some(&client)), ("Anonymous", None)] {
        request_service::submit_request(
            &pool,
            CreateRequest {
                project_type: ProjectType::Website,
                title: title.to_string(),
                description: String::new(),
                contact_email: "x@example.com".to_string(),
                contact_telegram: String::new(),
            },
            principal,
        )
        .await
        .unwrap();
    }

    let reply = daemon::handle_operation(&pool, Some(&mgr), Operation::ListRequests).await;
    assert_eq!(reply.body["requests"].as_array().unwrap().len(), 2);

    let reply = daemon::handle_operation(&pool, Some(&client), Operation::ListRequests).await;
    let requests = reply.body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["title"], serde_json::json!("Mine"));
}
