use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::types::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::services::Actor;

/// Header carrying the caller's user id, set by the authenticating gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("No user id provided".to_string()))?;
        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Authentication("Malformed user id".to_string()))?;

        // Role is always read fresh so revoked or deleted accounts stop working at once.
        let user = state
            .accounts
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        Ok(Actor {
            user_id: user.id,
            role: user.role,
        })
    }
}
