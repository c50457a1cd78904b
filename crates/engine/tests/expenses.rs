use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, NewExpense, UpdateExpense};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, whatsapp_number) VALUES (?, ?, ?)",
        vec!["alice".into(), "password".into(), "+911234567890".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn new_expense(amount: f64, category: &str) -> NewExpense {
    NewExpense {
        user_id: "alice".to_string(),
        amount,
        category: Some(category.to_string()),
        description: Some(category.to_string()),
        date: None,
    }
}

#[tokio::test]
async fn add_and_fetch_expense() {
    let (engine, _db) = engine_with_db().await;

    let created = engine.add_expense(new_expense(100.0, "food")).await.unwrap();
    let fetched = engine.expense(created.id, "alice").await.unwrap();

    assert_eq!(fetched.amount, 100.0);
    assert_eq!(fetched.category, "food");
    assert_eq!(fetched.user_id, "alice");
}

#[tokio::test]
async fn add_expense_defaults_category_and_date() {
    let (engine, _db) = engine_with_db().await;

    let before = Utc::now();
    let created = engine
        .add_expense(NewExpense {
            user_id: "alice".to_string(),
            amount: 10.0,
            category: None,
            description: None,
            date: None,
        })
        .await
        .unwrap();

    assert_eq!(created.category, "Miscellaneous");
    assert_eq!(created.description, "");
    assert!(created.date >= before && created.date <= Utc::now());
}

#[tokio::test]
async fn add_expense_rejects_invalid_amount() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.add_expense(new_expense(0.0, "food")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine.add_expense(new_expense(-5.0, "food")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn expenses_sorted_newest_first_with_date_range() {
    let (engine, _db) = engine_with_db().await;
    let now = Utc::now();

    for (days_ago, category) in [(3, "old"), (1, "recent"), (2, "middle")] {
        engine
            .add_expense(NewExpense {
                user_id: "alice".to_string(),
                amount: 10.0,
                category: Some(category.to_string()),
                description: None,
                date: Some(now - Duration::days(days_ago)),
            })
            .await
            .unwrap();
    }

    let all = engine.expenses("alice", None, None).await.unwrap();
    let categories: Vec<_> = all.iter().map(|e| e.category.as_str()).collect();
    assert_eq!(categories, ["recent", "middle", "old"]);

    let ranged = engine
        .expenses(
            "alice",
            Some(now - Duration::days(2) - Duration::hours(1)),
            Some(now - Duration::hours(30)),
        )
        .await
        .unwrap();
    let categories: Vec<_> = ranged.iter().map(|e| e.category.as_str()).collect();
    assert_eq!(categories, ["middle"]);
}

#[tokio::test]
async fn expense_of_another_user_is_not_found() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["bob".into(), "password".into()],
    ))
    .await
    .unwrap();

    let created = engine.add_expense(new_expense(50.0, "food")).await.unwrap();

    let err = engine.expense(created.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .delete_expense(created.id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // Still there for the owner.
    assert!(engine.expense(created.id, "alice").await.is_ok());
}

#[tokio::test]
async fn update_expense_applies_partial_changes() {
    let (engine, _db) = engine_with_db().await;

    let created = engine.add_expense(new_expense(100.0, "food")).await.unwrap();
    let updated = engine
        .update_expense(
            created.id,
            "alice",
            UpdateExpense {
                amount: Some(120.0),
                description: Some("dinner out".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.amount, 120.0);
    assert_eq!(updated.category, "food");
    assert_eq!(updated.description, "dinner out");
}

#[tokio::test]
async fn update_expense_rejects_invalid_amount_before_touching_storage() {
    let (engine, _db) = engine_with_db().await;

    let created = engine.add_expense(new_expense(100.0, "food")).await.unwrap();
    let err = engine
        .update_expense(
            created.id,
            "alice",
            UpdateExpense {
                amount: Some(-1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let unchanged = engine.expense(created.id, "alice").await.unwrap();
    assert_eq!(unchanged.amount, 100.0);
}

#[tokio::test]
async fn delete_expense_is_permanent() {
    let (engine, _db) = engine_with_db().await;

    let created = engine.add_expense(new_expense(100.0, "food")).await.unwrap();
    engine.delete_expense(created.id, "alice").await.unwrap();

    let err = engine.expense(created.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn user_lookup_by_whatsapp_number() {
    let (engine, _db) = engine_with_db().await;

    let user = engine
        .user_by_whatsapp_number("+911234567890")
        .await
        .unwrap();
    assert_eq!(user.username, "alice");

    let err = engine
        .user_by_whatsapp_number("+910000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn register_user_rejects_taken_username_and_number() {
    let (engine, _db) = engine_with_db().await;

    engine
        .register_user("bob", "secret", Some("+919999999999".to_string()))
        .await
        .unwrap();

    let err = engine
        .register_user("bob", "secret", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .register_user("carol", "secret", Some("+919999999999".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn link_and_unlink_whatsapp_number() {
    let (engine, _db) = engine_with_db().await;

    engine.register_user("bob", "secret", None).await.unwrap();
    engine.link_whatsapp("bob", "+918888888888").await.unwrap();

    let user = engine.user_by_whatsapp_number("+918888888888").await.unwrap();
    assert_eq!(user.username, "bob");

    // A number linked to alice cannot be claimed by bob.
    let err = engine.link_whatsapp("bob", "+911234567890").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine.unlink_whatsapp("bob").await.unwrap();
    let err = engine
        .user_by_whatsapp_number("+918888888888")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
