//! Wire types shared between the HTTP server and its clients.
//!
//! Everything here is plain serde data; no behavior beyond (de)serialization.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod expense {
    use super::*;

    /// Payload for creating an expense manually over the REST API.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount: f64,
        pub category: Option<String>,
        pub description: Option<String>,
        /// Defaults to the server clock when omitted.
        pub date: Option<DateTime<FixedOffset>>,
    }

    /// Partial update; `None` fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount: Option<f64>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub date: Option<DateTime<FixedOffset>>,
    }

    /// Optional inclusive date range for listing expenses.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub amount: f64,
        pub category: String,
        pub description: String,
        pub date: DateTime<FixedOffset>,
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub username: String,
        pub password: String,
        pub whatsapp_number: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Profile {
        pub username: String,
        pub whatsapp_number: Option<String>,
    }

    /// Payload for linking a WhatsApp number to the authenticated account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LinkWhatsapp {
        pub whatsapp_number: String,
    }
}

pub mod webhook {
    use super::*;

    /// Inbound message callback as posted by the WhatsApp gateway
    /// (form-encoded, Twilio field naming).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InboundMessage {
        #[serde(rename = "From")]
        pub from: String,
        #[serde(rename = "Body")]
        pub body: String,
    }
}
