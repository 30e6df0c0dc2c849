use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use sqlx::types::Uuid;

use crate::app_state::AppState;
use crate::db::{Course, CourseReview, ReviewAction, User};
use crate::error::AppResult;
use crate::middleware::{JsonBody, PathParams};
use crate::services::Actor;

pub async fn list_pending_courses(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Value>> {
    let courses: Vec<Course> = state.catalog.list_pending_courses(&actor).await?;
    Ok(Json(json!({ "courses": courses })))
}

pub async fn review_course(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
    JsonBody(review): JsonBody<CourseReview>,
) -> AppResult<Json<Value>> {
    let course = state
        .catalog
        .review_course(&actor, course_id, review.action)
        .await?;
    let verb = match review.action {
        ReviewAction::Approve => "approved",
        ReviewAction::Reject => "rejected",
    };
    Ok(Json(json!({
        "message": format!("Course {verb} successfully"),
        "course": course,
    })))
}

pub async fn list_pending_creators(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Value>> {
    let users: Vec<User> = state.accounts.list_pending_creators(&actor).await?;
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}

pub async fn approve_creator(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(user_id): PathParams<Uuid>,
) -> AppResult<Json<Value>> {
    let user = state.accounts.approve_creator(&actor, user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Creator approved successfully",
        "user": user,
    })))
}

pub async fn reject_creator(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(user_id): PathParams<Uuid>,
) -> AppResult<Json<Value>> {
    state.accounts.reject_creator(&actor, user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Creator application rejected successfully",
    })))
}
