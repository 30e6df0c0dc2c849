use axum::{Router, routing::{get, patch, post}};
use crate::app_state::AppState;
use super::handlers::{
    approve_creator, list_pending_courses, list_pending_creators, reject_creator, review_course,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(list_pending_courses))
        .route("/courses/{course_id}/approve", post(review_course))
        .route("/users/pending", get(list_pending_creators))
        .route("/users/{user_id}/approve", patch(approve_creator))
        .route("/users/{user_id}/reject", patch(reject_creator))
}
