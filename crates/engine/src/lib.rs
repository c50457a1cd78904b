//! Domain engine: expense records, user lookups and message parsing on top of
//! a sea-orm database connection.
//!
//! Every operation is scoped to the acting user; an expense that exists but
//! belongs to someone else is indistinguishable from a missing one.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

pub use commands::{NewExpense, UpdateExpense};
pub use error::EngineError;
pub use expenses::Expense;
pub use parsing::{ExpenseDraft, parse_expense_message};

mod commands;
mod error;
pub mod expenses;
mod parsing;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;

#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Look up a user by username.
    pub async fn user_by_username(&self, username: &str) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))
    }

    /// Look up a user by canonical WhatsApp number (no transport prefix).
    pub async fn user_by_whatsapp_number(&self, number: &str) -> ResultEngine<users::Model> {
        users::Entity::find()
            .filter(users::Column::WhatsappNumber.eq(number))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(number.to_string()))
    }

    /// Create a new account. The username and, when given, the WhatsApp
    /// number must both be unused.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        whatsapp_number: Option<String>,
    ) -> ResultEngine<()> {
        if users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(username.to_string()));
        }

        if let Some(number) = &whatsapp_number {
            self.ensure_whatsapp_number_free(number).await?;
        }

        let user = users::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            password: ActiveValue::Set(password.to_string()),
            whatsapp_number: ActiveValue::Set(whatsapp_number),
        };
        users::Entity::insert(user).exec(&self.database).await?;

        Ok(())
    }

    /// Attach a WhatsApp number to an existing account.
    pub async fn link_whatsapp(&self, username: &str, number: &str) -> ResultEngine<()> {
        self.ensure_whatsapp_number_free(number).await?;

        let user = self.user_by_username(username).await?;
        let mut user: users::ActiveModel = user.into();
        user.whatsapp_number = ActiveValue::Set(Some(number.to_string()));
        user.update(&self.database).await?;

        Ok(())
    }

    /// Detach the WhatsApp number from an account.
    pub async fn unlink_whatsapp(&self, username: &str) -> ResultEngine<()> {
        let user = self.user_by_username(username).await?;
        let mut user: users::ActiveModel = user.into();
        user.whatsapp_number = ActiveValue::Set(None);
        user.update(&self.database).await?;

        Ok(())
    }

    async fn ensure_whatsapp_number_free(&self, number: &str) -> ResultEngine<()> {
        let taken = users::Entity::find()
            .filter(users::Column::WhatsappNumber.eq(number))
            .one(&self.database)
            .await?
            .is_some();
        if taken {
            return Err(EngineError::ExistingKey(number.to_string()));
        }
        Ok(())
    }

    /// Create an expense record. This is a single atomic insert; there is no
    /// partial state to clean up on failure.
    pub async fn add_expense(&self, cmd: NewExpense) -> ResultEngine<Expense> {
        let expense = Expense::new(
            cmd.user_id,
            cmd.amount,
            cmd.category,
            cmd.description,
            cmd.date.unwrap_or_else(Utc::now),
        )?;

        expenses::Entity::insert(expenses::ActiveModel::from(&expense))
            .exec(&self.database)
            .await?;

        Ok(expense)
    }

    /// Fetch one expense owned by `username`.
    pub async fn expense(&self, id: uuid::Uuid, username: &str) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(id.to_string())
            .filter(expenses::Column::UserId.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;

        Expense::try_from(model)
    }

    /// List the user's expenses, newest first, optionally bounded by an
    /// inclusive date range.
    pub async fn expenses(
        &self,
        username: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<Expense>> {
        let mut query = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(username))
            .order_by_desc(expenses::Column::Date);

        if let Some(from) = from {
            query = query.filter(expenses::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(expenses::Column::Date.lte(to));
        }

        let models = query.all(&self.database).await?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Expense::try_from(model)?);
        }
        Ok(out)
    }

    /// Apply a partial update to an expense owned by `username`.
    pub async fn update_expense(
        &self,
        id: uuid::Uuid,
        username: &str,
        changes: UpdateExpense,
    ) -> ResultEngine<Expense> {
        if let Some(amount) = changes.amount {
            expenses::validate_amount(amount)?;
        }

        let model = expenses::Entity::find_by_id(id.to_string())
            .filter(expenses::Column::UserId.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;

        let mut active: expenses::ActiveModel = model.into();
        if let Some(amount) = changes.amount {
            active.amount = ActiveValue::Set(amount);
        }
        if let Some(category) = changes.category {
            active.category = ActiveValue::Set(category);
        }
        if let Some(description) = changes.description {
            active.description = ActiveValue::Set(description);
        }
        if let Some(date) = changes.date {
            active.date = ActiveValue::Set(date);
        }

        let updated = active.update(&self.database).await?;
        Expense::try_from(updated)
    }

    /// Permanently delete an expense owned by `username`.
    pub async fn delete_expense(&self, id: uuid::Uuid, username: &str) -> ResultEngine<()> {
        let model = expenses::Entity::find_by_id(id.to_string())
            .filter(expenses::Column::UserId.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;

        expenses::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;

        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
