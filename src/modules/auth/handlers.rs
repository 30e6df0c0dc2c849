use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::NewUser;
use crate::error::{AppError, AppResult};
use crate::middleware::JsonBody;
use crate::services::Actor;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewUser>,
) -> AppResult<(StatusCode, Json<Value>)> {
    payload.validate()?;
    let user = state.accounts.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Signup successful",
            "user": user,
        })),
    ))
}

pub async fn me(State(state): State<AppState>, actor: Actor) -> AppResult<Json<Value>> {
    let user = state
        .accounts
        .find(actor.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(json!({ "user": user })))
}
