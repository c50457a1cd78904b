//! Input payloads for engine operations.

use chrono::{DateTime, Utc};

/// Fields for creating an expense record.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub user_id: String,
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Defaults to the current server time when `None`.
    pub date: Option<DateTime<Utc>>,
}

/// Partial update of an expense; `None` fields are left as stored.
#[derive(Clone, Debug, Default)]
pub struct UpdateExpense {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}
