//! Expenses API endpoints.
//!
//! All handlers are owner-scoped: the authenticated user only ever sees and
//! mutates their own records.

use api_types::expense::{
    ExpenseListQuery, ExpenseListResponse, ExpenseNew, ExpenseUpdate, ExpenseView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

fn to_view(expense: engine::Expense) -> Result<ExpenseView, ServerError> {
    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok(ExpenseView {
        id: expense.id,
        amount: expense.amount,
        category: expense.category,
        description: expense.description,
        date: expense.date.with_timezone(&utc),
        created_at: expense.created_at.with_timezone(&utc),
    })
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let from = query.from.map(|dt| dt.with_timezone(&Utc));
    let to = query.to.map(|dt| dt.with_timezone(&Utc));

    let expenses = state.engine.expenses(&user.username, from, to).await?;
    let expenses = expenses
        .into_iter()
        .map(to_view)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ExpenseListResponse { expenses }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let expense = state
        .engine
        .add_expense(engine::NewExpense {
            user_id: user.username,
            amount: payload.amount,
            category: payload.category,
            description: payload.description,
            date: payload.date.map(|dt| dt.with_timezone(&Utc)),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_view(expense)?)))
}

pub async fn get_one(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(id, &user.username).await?;
    Ok(Json(to_view(expense)?))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state
        .engine
        .update_expense(
            id,
            &user.username,
            engine::UpdateExpense {
                amount: payload.amount,
                category: payload.category,
                description: payload.description,
                date: payload.date.map(|dt| dt.with_timezone(&Utc)),
            },
        )
        .await?;

    Ok(Json(to_view(expense)?))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
