//! WhatsApp webhook ingestion.
//!
//! Turns one inbound gateway callback into zero or one persisted expenses
//! plus exactly one reply. Every outcome, including lookup, parse and storage
//! failures, is rendered as a TwiML message with a 200 status: a non-success
//! response would make the gateway redeliver the message.

use api_types::webhook::InboundMessage;
use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::server::ServerState;
use engine::{EngineError, parse_expense_message};

const REPLY_NOT_REGISTERED: &str = "You are not registered yet.";
const REPLY_UNPARSEABLE: &str = "Could not understand your message. Use: \"Spent 100 on food\"";
const REPLY_STORAGE_ERROR: &str = "Error saving expense. Try again later.";

/// A single-message TwiML reply body.
pub struct Twiml(String);

impl Twiml {
    fn message(text: &str) -> Self {
        Self(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
            escape_xml(text)
        ))
    }
}

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.0).into_response()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

pub async fn receive(
    State(state): State<ServerState>,
    Form(inbound): Form<InboundMessage>,
) -> Twiml {
    // Canonical lookup key: sender address without the transport prefix.
    let number = inbound
        .from
        .strip_prefix("whatsapp:")
        .unwrap_or(&inbound.from);

    let user = match state.engine.user_by_whatsapp_number(number).await {
        Ok(user) => user,
        Err(EngineError::KeyNotFound(_)) => return Twiml::message(REPLY_NOT_REGISTERED),
        Err(err) => {
            tracing::error!("webhook user lookup failed: {err}");
            return Twiml::message(REPLY_STORAGE_ERROR);
        }
    };

    let Some(draft) = parse_expense_message(&inbound.body) else {
        return Twiml::message(REPLY_UNPARSEABLE);
    };

    match state
        .engine
        .add_expense(engine::NewExpense {
            user_id: user.username,
            amount: draft.amount,
            category: Some(draft.category),
            description: Some(draft.description),
            date: None,
        })
        .await
    {
        Ok(expense) => Twiml::message(&format!(
            "Logged ₹{} for \"{}\"",
            expense.amount, expense.category
        )),
        Err(err) => {
            tracing::error!("failed to save expense from webhook: {err}");
            Twiml::message(REPLY_STORAGE_ERROR)
        }
    }
}
