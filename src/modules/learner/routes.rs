use axum::{Router, routing::{get, post}};
use crate::app_state::AppState;
use super::handlers::{
    course_progress, enroll, list_certificates, list_enrolled_courses, mark_lesson_complete,
};

pub fn learner_routes() -> Router<AppState> {
    Router::new()
        .route("/enrolled-courses", get(list_enrolled_courses))
        .route("/certificates", get(list_certificates))
        .route("/{course_id}/enroll", post(enroll))
        .route("/{course_id}/lesson/{lesson_id}/complete", post(mark_lesson_complete))
        .route("/{course_id}/progress", get(course_progress))
}
