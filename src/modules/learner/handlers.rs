use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use sqlx::types::Uuid;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::middleware::PathParams;
use crate::services::{Actor, CourseSummary, ProgressReport};

pub async fn list_enrolled_courses(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Value>> {
    let courses = state.enrollment.list_enrolled_courses(&actor).await?;
    let courses: Vec<CourseSummary> = courses.iter().map(CourseSummary::from).collect();
    Ok(Json(json!({ "success": true, "courses": courses })))
}

pub async fn enroll(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
) -> AppResult<Json<Value>> {
    let progress = state.enrollment.enroll(&actor, course_id).await?;
    Ok(Json(json!({
        "message": "Enrolled successfully",
        "progress": ProgressReport::from(&progress),
    })))
}

pub async fn mark_lesson_complete(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((course_id, lesson_id)): PathParams<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    let outcome = state
        .enrollment
        .mark_complete(&actor, course_id, lesson_id)
        .await?;
    Ok(Json(json!({
        "message": "Lesson marked complete",
        "all_completed": outcome.all_completed,
        "certificate": outcome.certificate,
    })))
}

pub async fn course_progress(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
) -> AppResult<Json<ProgressReport>> {
    let report = state.enrollment.get_progress(&actor, course_id).await?;
    Ok(Json(report))
}

pub async fn list_certificates(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Value>> {
    let certificates = state.enrollment.list_certificates(&actor).await?;
    Ok(Json(json!({ "certificates": certificates })))
}
