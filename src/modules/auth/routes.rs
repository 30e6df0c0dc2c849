use axum::{Router, routing::{get, post}};
use crate::app_state::AppState;
use super::handlers::{me, register};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
}
