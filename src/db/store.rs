use std::future::Future;
use std::pin::Pin;

use sqlx::types::Uuid;

use super::error::DbResult;
use super::models::{Course, CourseStatus, LearnerProfile, Lesson, User};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait UserStore: Send + Sync {
    fn create_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, DbResult<User>>;

    fn find_user(&self, user_id: Uuid) -> BoxFuture<'_, DbResult<Option<User>>>;

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, DbResult<Option<User>>>;

    fn update_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, DbResult<User>>;

    /// Returns `NotFound` when nothing was deleted.
    fn delete_user(&self, user_id: Uuid) -> BoxFuture<'_, DbResult<()>>;

    fn list_pending_creators(&self) -> BoxFuture<'_, DbResult<Vec<User>>>;
}

/// Course catalog. Every returned `Course` carries its lessons sorted by
/// `order_index`.
pub trait CourseStore: Send + Sync {
    fn find_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Option<Course>>>;

    fn find_published_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Option<Course>>>;

    fn list_lessons(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Vec<Lesson>>>;

    fn list_courses_by_status(&self, status: CourseStatus) -> BoxFuture<'_, DbResult<Vec<Course>>>;

    /// Newest first.
    fn list_courses_by_creator(&self, creator_id: Uuid) -> BoxFuture<'_, DbResult<Vec<Course>>>;

    /// Preserves the order of `course_ids`; unknown ids are skipped.
    fn list_courses_by_ids<'a>(&'a self, course_ids: &'a [Uuid])
        -> BoxFuture<'a, DbResult<Vec<Course>>>;

    fn insert_course<'a>(&'a self, course: &'a Course) -> BoxFuture<'a, DbResult<Course>>;

    /// Writes course metadata only; lessons are managed separately.
    fn update_course<'a>(&'a self, course: &'a Course) -> BoxFuture<'a, DbResult<Course>>;

    fn delete_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<()>>;

    fn insert_lesson<'a>(&'a self, lesson: &'a Lesson) -> BoxFuture<'a, DbResult<Lesson>>;

    fn update_lesson<'a>(&'a self, lesson: &'a Lesson) -> BoxFuture<'a, DbResult<Lesson>>;

    /// Deletes the lesson and decrements every sibling above it, atomically.
    fn delete_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> BoxFuture<'_, DbResult<()>>;
}

pub trait ProfileStore: Send + Sync {
    /// Returns an empty profile at version 0 when none was saved yet.
    fn load_profile(&self, learner_id: Uuid) -> BoxFuture<'_, DbResult<LearnerProfile>>;

    /// Persists `profile` if the stored version still equals `profile.version`
    /// and returns it with the bumped version. Fails with `Conflict` otherwise.
    fn save_profile<'a>(&'a self, profile: &'a LearnerProfile)
        -> BoxFuture<'a, DbResult<LearnerProfile>>;
}
