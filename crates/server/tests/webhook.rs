use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Statement};
use tower::ServiceExt;

use migration::MigratorTrait;
use server::{ServerState, router};

const ALICE_NUMBER: &str = "+911234567890";

async fn setup() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, whatsapp_number) VALUES (?, ?, ?)",
        vec!["alice".into(), "password".into(), ALICE_NUMBER.into()],
    ))
    .await
    .unwrap();

    let engine = engine::Engine::builder().database(db.clone()).build();
    let state = ServerState {
        engine: Arc::new(engine),
        db: db.clone(),
    };
    (router(state), db)
}

async fn post_webhook(app: Router, from: &str, body: &str) -> (StatusCode, Option<String>, String) {
    let form = serde_urlencoded::to_string([("From", from), ("Body", body)]).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/whatsapp")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn stored_expenses(db: &DatabaseConnection) -> Vec<engine::expenses::Model> {
    engine::expenses::Entity::find().all(db).await.unwrap()
}

#[tokio::test]
async fn valid_message_creates_expense_and_confirms() {
    let (app, db) = setup().await;

    let (status, content_type, body) = post_webhook(
        app,
        &format!("whatsapp:{ALICE_NUMBER}"),
        "Spent 100 on food",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert!(body.contains("Logged ₹100 for \"food\""), "body: {body}");

    let expenses = stored_expenses(&db).await;
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].user_id, "alice");
    assert_eq!(expenses[0].amount, 100.0);
    assert_eq!(expenses[0].category, "food");
    assert_eq!(expenses[0].description, "food");
}

#[tokio::test]
async fn sender_without_prefix_is_still_resolved() {
    let (app, db) = setup().await;

    let (status, _, body) = post_webhook(app, ALICE_NUMBER, "spent 250 rs on groceries").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Logged ₹250 for \"groceries\""), "body: {body}");
    assert_eq!(stored_expenses(&db).await.len(), 1);
}

#[tokio::test]
async fn unparseable_message_replies_with_usage_hint() {
    let (app, db) = setup().await;

    let (status, _, body) = post_webhook(
        app,
        &format!("whatsapp:{ALICE_NUMBER}"),
        "I bought some food",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Could not understand your message"), "body: {body}");
    assert!(body.contains("Spent 100 on food"), "body: {body}");
    assert!(stored_expenses(&db).await.is_empty());
}

#[tokio::test]
async fn unregistered_sender_gets_rejected_even_with_valid_text() {
    let (app, db) = setup().await;

    let (status, _, body) =
        post_webhook(app, "whatsapp:+910000000000", "Spent 100 on food").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("You are not registered yet."), "body: {body}");
    assert!(stored_expenses(&db).await.is_empty());
}

#[tokio::test]
async fn storage_failure_is_absorbed_into_a_reply() {
    let (app, db) = setup().await;
    let backend = db.get_database_backend();

    // Make the insert fail while keeping user lookups working.
    db.execute(Statement::from_string(
        backend,
        "ALTER TABLE expenses RENAME TO expenses_hidden",
    ))
    .await
    .unwrap();

    let (status, _, body) = post_webhook(
        app,
        &format!("whatsapp:{ALICE_NUMBER}"),
        "Spent 100 on food",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Error saving expense. Try again later."), "body: {body}");

    db.execute(Statement::from_string(
        backend,
        "ALTER TABLE expenses_hidden RENAME TO expenses",
    ))
    .await
    .unwrap();
    assert!(stored_expenses(&db).await.is_empty());
}

#[tokio::test]
async fn confirmation_echoes_the_persisted_values() {
    let (app, db) = setup().await;

    let (_, _, body) = post_webhook(
        app,
        &format!("whatsapp:{ALICE_NUMBER}"),
        "spent   250  ₹  on   groceries and snacks",
    )
    .await;

    let expenses = stored_expenses(&db).await;
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount, 250.0);
    assert_eq!(expenses[0].category, "groceries and snacks");
    assert!(
        body.contains("Logged ₹250 for \"groceries and snacks\""),
        "body: {body}"
    );
}
