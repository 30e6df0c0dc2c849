use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::types::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{NewCourse, NewLesson, UpdateCourse, UpdateLesson};
use crate::error::AppResult;
use crate::middleware::{JsonBody, PathParams};
use crate::services::Actor;

pub async fn list_published(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let courses = state.catalog.list_published().await?;
    Ok(Json(json!({ "success": true, "courses": courses })))
}

pub async fn create_course(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(payload): JsonBody<NewCourse>,
) -> AppResult<(StatusCode, Json<Value>)> {
    payload.validate()?;
    let course = state.catalog.create_course(&actor, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Course created successfully",
            "course": course,
        })),
    ))
}

pub async fn add_lesson(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<NewLesson>,
) -> AppResult<(StatusCode, Json<Value>)> {
    payload.validate()?;
    let added = state.catalog.add_lesson(&actor, course_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Lesson added successfully",
            "lesson": added.lesson,
            "total_lessons": added.total_lessons,
        })),
    ))
}

pub async fn update_course(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<UpdateCourse>,
) -> AppResult<Json<Value>> {
    payload.validate()?;
    let course = state.catalog.update_course(&actor, course_id, payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Course updated successfully",
        "course": course,
    })))
}

pub async fn update_lesson(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((course_id, lesson_id)): PathParams<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<UpdateLesson>,
) -> AppResult<Json<Value>> {
    payload.validate()?;
    let lesson = state
        .catalog
        .update_lesson(&actor, course_id, lesson_id, payload)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Lesson updated successfully",
        "lesson": lesson,
    })))
}

pub async fn delete_course(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
) -> AppResult<Json<Value>> {
    state.catalog.delete_course(&actor, course_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Course deleted successfully",
    })))
}

pub async fn delete_lesson(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((course_id, lesson_id)): PathParams<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    let total_lessons = state
        .catalog
        .delete_lesson(&actor, course_id, lesson_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Lesson deleted successfully",
        "total_lessons": total_lessons,
    })))
}

pub async fn list_my_courses(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Value>> {
    let courses = state.catalog.list_my_courses(&actor).await?;
    Ok(Json(json!({
        "success": true,
        "count": courses.len(),
        "courses": courses,
    })))
}

/// Serves both the creator's own view and the admin preview.
pub async fn course_details(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
) -> AppResult<Json<Value>> {
    let course = state.catalog.course_details(&actor, course_id).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

pub async fn admin_preview(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(course_id): PathParams<Uuid>,
) -> AppResult<Json<Value>> {
    actor.require_role(crate::db::UserRole::Admin)?;
    course_details(State(state), actor, PathParams(course_id)).await
}
