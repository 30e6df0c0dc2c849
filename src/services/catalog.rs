use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sqlx::types::Uuid;
use time::OffsetDateTime;
use tracing::info;

use super::actor::Actor;
use crate::db::{
    Course, CourseStatus, CourseStore, Lesson, NewCourse, NewLesson, ReviewAction, UpdateCourse,
    UpdateLesson, UserRole, UserStore,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: CourseStatus,
    pub total_lessons: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            description: course.description.clone(),
            image: course.image.clone(),
            status: course.status,
            total_lessons: course.lessons.len(),
            created_at: course.created_at,
            updated_at: course.updated_at,
            published_at: course.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedCourse {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub creator_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonAdded {
    pub lesson: Lesson,
    pub total_lessons: usize,
}

/// Course authoring for creators plus the admin review queue.
pub struct CatalogService {
    users: Arc<dyn UserStore>,
    courses: Arc<dyn CourseStore>,
}

impl CatalogService {
    pub fn new(users: Arc<dyn UserStore>, courses: Arc<dyn CourseStore>) -> Self {
        Self { users, courses }
    }

    pub async fn create_course(&self, actor: &Actor, new_course: NewCourse) -> AppResult<Course> {
        actor.require_role(UserRole::Creator)?;
        let creator = self
            .users
            .find_user(actor.user_id)
            .await?
            .filter(|u| u.is_approved_creator())
            .ok_or_else(|| {
                AppError::Authorization("Only approved creators can create courses".to_string())
            })?;

        let now = OffsetDateTime::now_utc();
        let course = Course {
            id: Uuid::new_v4(),
            creator_id: creator.id,
            title: new_course.title,
            description: new_course.description,
            image: new_course.image,
            status: CourseStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
            lessons: Vec::new(),
        };
        let course = self.courses.insert_course(&course).await?;
        info!(course_id = %course.id, creator_id = %creator.id, "Course created");
        Ok(course)
    }

    pub async fn add_lesson(
        &self,
        actor: &Actor,
        course_id: Uuid,
        new_lesson: NewLesson,
    ) -> AppResult<LessonAdded> {
        let course = self.owned_course(actor, course_id).await?;

        let order_index = match new_lesson.order_index {
            Some(index) if course.order_index_taken(index, None) => {
                return Err(AppError::Conflict(format!(
                    "Lesson order_index {index} already exists"
                )));
            }
            Some(index) => index,
            None => course.next_order_index(),
        };

        let lesson = Lesson {
            id: Uuid::new_v4(),
            course_id,
            title: new_lesson.title,
            content: new_lesson.content,
            order_index,
            transcript: new_lesson.transcript,
            created_at: OffsetDateTime::now_utc(),
        };
        let lesson = self.courses.insert_lesson(&lesson).await?;
        Ok(LessonAdded {
            lesson,
            total_lessons: course.lessons.len() + 1,
        })
    }

    pub async fn update_course(
        &self,
        actor: &Actor,
        course_id: Uuid,
        changes: UpdateCourse,
    ) -> AppResult<Course> {
        let mut course = self.owned_course(actor, course_id).await?;
        if let Some(title) = changes.title {
            course.title = title;
        }
        if let Some(description) = changes.description {
            course.description = description;
        }
        if let Some(image) = changes.image {
            course.image = image;
        }
        course.updated_at = OffsetDateTime::now_utc();
        Ok(self.courses.update_course(&course).await?)
    }

    pub async fn update_lesson(
        &self,
        actor: &Actor,
        course_id: Uuid,
        lesson_id: Uuid,
        changes: UpdateLesson,
    ) -> AppResult<Lesson> {
        let course = self.owned_course(actor, course_id).await?;
        let mut lesson = course
            .lesson(lesson_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?;

        if let Some(index) = changes.order_index {
            if index != lesson.order_index && course.order_index_taken(index, Some(lesson_id)) {
                return Err(AppError::Conflict(format!(
                    "Lesson order_index {index} already exists"
                )));
            }
            lesson.order_index = index;
        }
        if let Some(title) = changes.title {
            lesson.title = title;
        }
        if let Some(content) = changes.content {
            lesson.content = content;
        }
        if let Some(transcript) = changes.transcript {
            lesson.transcript = transcript;
        }
        Ok(self.courses.update_lesson(&lesson).await?)
    }

    pub async fn delete_course(&self, actor: &Actor, course_id: Uuid) -> AppResult<()> {
        let course = self.owned_course(actor, course_id).await?;
        self.courses.delete_course(course.id).await?;
        info!(course_id = %course.id, "Course deleted");
        Ok(())
    }

    /// Returns the number of lessons left in the course.
    pub async fn delete_lesson(
        &self,
        actor: &Actor,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<usize> {
        let course = self.owned_course(actor, course_id).await?;
        if course.lesson(lesson_id).is_none() {
            return Err(AppError::NotFound("Lesson not found".to_string()));
        }
        self.courses.delete_lesson(course_id, lesson_id).await?;
        Ok(course.lessons.len() - 1)
    }

    pub async fn list_my_courses(&self, actor: &Actor) -> AppResult<Vec<CourseSummary>> {
        actor.require_role(UserRole::Creator)?;
        let courses = self.courses.list_courses_by_creator(actor.user_id).await?;
        Ok(courses.iter().map(CourseSummary::from).collect())
    }

    /// Full course with lessons, visible to its creator and to admins.
    pub async fn course_details(&self, actor: &Actor, course_id: Uuid) -> AppResult<Course> {
        let course = self.courses.find_course(course_id).await?;
        match course {
            Some(course) if actor.role == UserRole::Admin || course.creator_id == actor.user_id => {
                Ok(course)
            }
            _ => Err(AppError::NotFound(
                "Course not found or access denied".to_string(),
            )),
        }
    }

    pub async fn list_published(&self) -> AppResult<Vec<PublishedCourse>> {
        let courses = self
            .courses
            .list_courses_by_status(CourseStatus::Published)
            .await?;

        let mut creator_names: HashMap<Uuid, String> = HashMap::new();
        let mut listing = Vec::with_capacity(courses.len());
        for course in &courses {
            if !creator_names.contains_key(&course.creator_id) {
                let name = self
                    .users
                    .find_user(course.creator_id)
                    .await?
                    .map(|u| u.name)
                    .unwrap_or_else(|| "Unknown".to_string());
                creator_names.insert(course.creator_id, name);
            }
            listing.push(PublishedCourse {
                course: CourseSummary::from(course),
                creator_name: creator_names[&course.creator_id].clone(),
            });
        }
        Ok(listing)
    }

    pub async fn review_course(
        &self,
        actor: &Actor,
        course_id: Uuid,
        action: ReviewAction,
    ) -> AppResult<Course> {
        actor.require_role(UserRole::Admin)?;
        let mut course = self
            .courses
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let now = OffsetDateTime::now_utc();
        match action {
            ReviewAction::Approve => {
                course.status = CourseStatus::Published;
                course.published_at = Some(now);
            }
            ReviewAction::Reject => {
                course.status = CourseStatus::Draft;
                course.published_at = None;
            }
        }
        course.updated_at = now;
        let course = self.courses.update_course(&course).await?;
        info!(course_id = %course.id, ?action, "Course reviewed");
        Ok(course)
    }

    pub async fn list_pending_courses(&self, actor: &Actor) -> AppResult<Vec<Course>> {
        actor.require_role(UserRole::Admin)?;
        Ok(self.courses.list_courses_by_status(CourseStatus::Draft).await?)
    }

    async fn owned_course(&self, actor: &Actor, course_id: Uuid) -> AppResult<Course> {
        actor.require_role(UserRole::Creator)?;
        let course = self
            .courses
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        if course.creator_id != actor.user_id {
            return Err(AppError::Authorization(
                "You can only manage your own courses".to_string(),
            ));
        }
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, User};

    struct Fixture {
        store: Arc<InMemoryStore>,
        catalog: CatalogService,
        creator: Actor,
        admin: Actor,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let now = OffsetDateTime::now_utc();
        let creator = User {
            id: Uuid::new_v4(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            role: UserRole::Creator,
            creator_bio: None,
            creator_applied_at: Some(now),
            creator_approved: true,
            created_at: now,
        };
        store.create_user(&creator).await.unwrap();
        Fixture {
            catalog: CatalogService::new(store.clone(), store.clone()),
            store,
            creator: Actor {
                user_id: creator.id,
                role: UserRole::Creator,
            },
            admin: Actor {
                user_id: Uuid::new_v4(),
                role: UserRole::Admin,
            },
        }
    }

    fn new_course(title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            description: None,
            image: None,
        }
    }

    fn new_lesson(title: &str, order_index: Option<i32>) -> NewLesson {
        NewLesson {
            title: title.to_string(),
            content: None,
            order_index,
            transcript: None,
        }
    }

    #[tokio::test]
    async fn courses_start_as_drafts_and_lessons_append() {
        let f = fixture().await;
        let course = f.catalog.create_course(&f.creator, new_course("Async Rust")).await.unwrap();
        assert_eq!(course.status, CourseStatus::Draft);

        let first = f
            .catalog
            .add_lesson(&f.creator, course.id, new_lesson("Futures", None))
            .await
            .unwrap();
        let second = f
            .catalog
            .add_lesson(&f.creator, course.id, new_lesson("Pinning", None))
            .await
            .unwrap();
        assert_eq!(first.lesson.order_index, 1);
        assert_eq!(second.lesson.order_index, 2);
        assert_eq!(second.total_lessons, 2);
    }

    #[tokio::test]
    async fn unapproved_creators_cannot_create_courses() {
        let f = fixture().await;
        let mut user = f.store.find_user(f.creator.user_id).await.unwrap().unwrap();
        user.creator_approved = false;
        f.store.update_user(&user).await.unwrap();

        let err = f
            .catalog
            .create_course(&f.creator, new_course("Nope"))
            .await
            .expect_err("unapproved");
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn duplicate_order_index_is_rejected() {
        let f = fixture().await;
        let course = f.catalog.create_course(&f.creator, new_course("Traits")).await.unwrap();
        f.catalog
            .add_lesson(&f.creator, course.id, new_lesson("One", Some(1)))
            .await
            .unwrap();
        let err = f
            .catalog
            .add_lesson(&f.creator, course.id, new_lesson("Again", Some(1)))
            .await
            .expect_err("taken");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_lesson_keeps_order_contiguous() {
        let f = fixture().await;
        let course = f.catalog.create_course(&f.creator, new_course("Macros")).await.unwrap();
        let mut ids = Vec::new();
        for title in ["a", "b", "c", "d"] {
            let added = f
                .catalog
                .add_lesson(&f.creator, course.id, new_lesson(title, None))
                .await
                .unwrap();
            ids.push(added.lesson.id);
        }

        let remaining = f.catalog.delete_lesson(&f.creator, course.id, ids[1]).await.unwrap();
        assert_eq!(remaining, 3);

        let lessons = f.store.list_lessons(course.id).await.unwrap();
        let order: Vec<(Uuid, i32)> = lessons.iter().map(|l| (l.id, l.order_index)).collect();
        assert_eq!(order, vec![(ids[0], 1), (ids[2], 2), (ids[3], 3)]);
    }

    #[tokio::test]
    async fn only_the_owner_can_edit() {
        let f = fixture().await;
        let course = f.catalog.create_course(&f.creator, new_course("Lifetimes")).await.unwrap();
        let stranger = Actor {
            user_id: Uuid::new_v4(),
            role: UserRole::Creator,
        };
        let err = f
            .catalog
            .update_course(&stranger, course.id, UpdateCourse::default())
            .await
            .expect_err("not owner");
        assert!(matches!(err, AppError::Authorization(_)));

        let err = f
            .catalog
            .course_details(&stranger, course.id)
            .await
            .expect_err("hidden");
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.catalog.course_details(&f.admin, course.id).await.is_ok());
    }

    #[tokio::test]
    async fn update_lesson_rejects_sibling_order_collision() {
        let f = fixture().await;
        let course = f.catalog.create_course(&f.creator, new_course("Errors")).await.unwrap();
        let first = f
            .catalog
            .add_lesson(&f.creator, course.id, new_lesson("thiserror", None))
            .await
            .unwrap();
        f.catalog
            .add_lesson(&f.creator, course.id, new_lesson("anyhow", None))
            .await
            .unwrap();

        let err = f
            .catalog
            .update_lesson(
                &f.creator,
                course.id,
                first.lesson.id,
                UpdateLesson {
                    order_index: Some(2),
                    ..UpdateLesson::default()
                },
            )
            .await
            .expect_err("collision");
        assert!(matches!(err, AppError::Conflict(_)));

        let renamed = f
            .catalog
            .update_lesson(
                &f.creator,
                course.id,
                first.lesson.id,
                UpdateLesson {
                    title: Some("Error enums".to_string()),
                    order_index: Some(3),
                    ..UpdateLesson::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Error enums");
        assert_eq!(renamed.order_index, 3);
    }

    #[tokio::test]
    async fn null_fields_clear_stored_values() {
        let f = fixture().await;
        let course = f
            .catalog
            .create_course(
                &f.creator,
                NewCourse {
                    description: Some("Lifetimes, borrowing".to_string()),
                    image: Some("cover.png".to_string()),
                    ..new_course("Borrowck")
                },
            )
            .await
            .unwrap();

        let updated = f
            .catalog
            .update_course(
                &f.creator,
                course.id,
                UpdateCourse {
                    description: Some(None),
                    ..UpdateCourse::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.image.as_deref(), Some("cover.png"));

        let added = f
            .catalog
            .add_lesson(
                &f.creator,
                course.id,
                NewLesson {
                    transcript: Some("transcript".to_string()),
                    ..new_lesson("Moves", None)
                },
            )
            .await
            .unwrap();
        let lesson = f
            .catalog
            .update_lesson(
                &f.creator,
                course.id,
                added.lesson.id,
                UpdateLesson {
                    content: Some(Some("Body".to_string())),
                    transcript: Some(None),
                    ..UpdateLesson::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(lesson.content.as_deref(), Some("Body"));
        assert_eq!(lesson.transcript, None);
    }

    #[tokio::test]
    async fn review_publishes_and_unpublishes() {
        let f = fixture().await;
        let course = f.catalog.create_course(&f.creator, new_course("Unsafe")).await.unwrap();
        assert_eq!(f.catalog.list_pending_courses(&f.admin).await.unwrap().len(), 1);

        let err = f
            .catalog
            .review_course(&f.creator, course.id, ReviewAction::Approve)
            .await
            .expect_err("creators cannot self-approve");
        assert!(matches!(err, AppError::Authorization(_)));

        let approved = f
            .catalog
            .review_course(&f.admin, course.id, ReviewAction::Approve)
            .await
            .unwrap();
        assert!(approved.is_published());
        assert!(approved.published_at.is_some());

        let listing = f.catalog.list_published().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].creator_name, "Grace");

        let rejected = f
            .catalog
            .review_course(&f.admin, course.id, ReviewAction::Reject)
            .await
            .unwrap();
        assert_eq!(rejected.status, CourseStatus::Draft);
        assert!(rejected.published_at.is_none());
        assert!(f.catalog.list_published().await.unwrap().is_empty());
    }
}
