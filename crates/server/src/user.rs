//! User account endpoints: registration, profile and WhatsApp linking.

use api_types::user::{LinkWhatsapp, Profile, RegisterUser};
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterUser>,
) -> Result<StatusCode, ServerError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ServerError::Generic(
            "username and password required".to_string(),
        ));
    }

    let whatsapp_number = payload
        .whatsapp_number
        .map(|number| canonical_number(&number));

    state
        .engine
        .register_user(&payload.username, &payload.password, whatsapp_number)
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn me(Extension(user): Extension<users::Model>) -> Json<Profile> {
    Json(Profile {
        username: user.username,
        whatsapp_number: user.whatsapp_number,
    })
}

/// Attach a WhatsApp number to the authenticated account.
pub async fn link_whatsapp(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<LinkWhatsapp>,
) -> Result<StatusCode, ServerError> {
    let number = canonical_number(&payload.whatsapp_number);
    if number.is_empty() {
        return Err(ServerError::Generic("whatsapp_number required".to_string()));
    }

    state.engine.link_whatsapp(&user.username, &number).await?;

    Ok(StatusCode::CREATED)
}

pub async fn unlink_whatsapp(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.unlink_whatsapp(&user.username).await?;

    Ok(StatusCode::ACCEPTED)
}

/// Numbers are stored without the `whatsapp:` transport prefix so they match
/// the canonical form used by webhook lookups.
fn canonical_number(raw: &str) -> String {
    raw.trim()
        .strip_prefix("whatsapp:")
        .unwrap_or(raw.trim())
        .to_string()
}
