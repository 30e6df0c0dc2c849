use axum::{Router, routing::{get, post, put}};
use crate::app_state::AppState;
use super::handlers::{
    add_lesson, admin_preview, course_details, create_course, delete_course, delete_lesson,
    list_my_courses, list_published, update_course, update_lesson,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/published", get(list_published))
        .route("/create", post(create_course))
        .route("/my-courses", get(list_my_courses))
        .route("/my-courses/{course_id}", get(course_details))
        .route("/admin-preview/{course_id}", get(admin_preview))
        .route("/{course_id}", put(update_course).delete(delete_course))
        .route("/{course_id}/lessons", post(add_lesson))
        .route(
            "/{course_id}/lesson/{lesson_id}",
            put(update_lesson).delete(delete_lesson),
        )
}
