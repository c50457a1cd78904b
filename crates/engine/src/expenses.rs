//! Expense primitives.
//!
//! An `Expense` is a single spending record owned by exactly one user. It is
//! created either manually over the REST API or from a parsed WhatsApp
//! message, and deleted permanently (no tombstones).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub(crate) const DEFAULT_CATEGORY: &str = "Miscellaneous";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        user_id: String,
        amount: f64,
        category: Option<String>,
        description: Option<String>,
        date: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        validate_amount(amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            category: category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            description: description.unwrap_or_default(),
            date,
            created_at: Utc::now(),
        })
    }
}

/// Amounts must be finite and strictly positive.
pub(crate) fn validate_amount(amount: f64) -> ResultEngine<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            user_id: ActiveValue::Set(expense.user_id.clone()),
            amount: ActiveValue::Set(expense.amount),
            category: ActiveValue::Set(expense.category.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            date: ActiveValue::Set(expense.date),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            user_id: model.user_id,
            amount: model.amount,
            category: model.category,
            description: model.description,
            date: model.date,
            created_at: model.created_at,
        })
    }
}
