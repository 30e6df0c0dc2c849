use std::collections::HashMap;

use sqlx::types::Uuid;
use tokio::sync::RwLock;

use super::error::{DatabaseError, DbResult};
use super::models::{Course, CourseStatus, LearnerProfile, Lesson, User, UserRole};
use super::store::{BoxFuture, CourseStore, ProfileStore, UserStore};

/// Process-local storage used when no `DATABASE_URL` is configured, and by
/// tests. Lessons live inside their course.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    courses: RwLock<HashMap<Uuid, Course>>,
    profiles: RwLock<HashMap<Uuid, LearnerProfile>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryStore {
    fn create_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, DbResult<User>> {
        Box::pin(async move {
            let mut users = self.users.write().await;
            if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
                return Err(DatabaseError::Duplicate);
            }
            users.insert(user.id, user.clone());
            Ok(user.clone())
        })
    }

    fn find_user(&self, user_id: Uuid) -> BoxFuture<'_, DbResult<Option<User>>> {
        Box::pin(async move { Ok(self.users.read().await.get(&user_id).cloned()) })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, DbResult<Option<User>>> {
        Box::pin(async move {
            let users = self.users.read().await;
            Ok(users.values().find(|u| u.email == email).cloned())
        })
    }

    fn update_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, DbResult<User>> {
        Box::pin(async move {
            let mut users = self.users.write().await;
            let stored = users.get_mut(&user.id).ok_or(DatabaseError::NotFound)?;
            *stored = user.clone();
            Ok(user.clone())
        })
    }

    fn delete_user(&self, user_id: Uuid) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            self.users
                .write()
                .await
                .remove(&user_id)
                .map(|_| ())
                .ok_or(DatabaseError::NotFound)?;
            // Mirrors the cascading foreign keys of the relational schema.
            self.courses.write().await.retain(|_, c| c.creator_id != user_id);
            self.profiles.write().await.remove(&user_id);
            Ok(())
        })
    }

    fn list_pending_creators(&self) -> BoxFuture<'_, DbResult<Vec<User>>> {
        Box::pin(async move {
            let users = self.users.read().await;
            let mut pending: Vec<User> = users
                .values()
                .filter(|u| u.role == UserRole::Creator && !u.creator_approved)
                .cloned()
                .collect();
            pending.sort_by_key(|u| u.created_at);
            Ok(pending)
        })
    }
}

impl CourseStore for InMemoryStore {
    fn find_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Option<Course>>> {
        Box::pin(async move { Ok(self.courses.read().await.get(&course_id).cloned()) })
    }

    fn find_published_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Option<Course>>> {
        Box::pin(async move {
            let courses = self.courses.read().await;
            Ok(courses.get(&course_id).filter(|c| c.is_published()).cloned())
        })
    }

    fn list_lessons(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Vec<Lesson>>> {
        Box::pin(async move {
            let courses = self.courses.read().await;
            Ok(courses
                .get(&course_id)
                .map(|c| c.lessons.clone())
                .unwrap_or_default())
        })
    }

    fn list_courses_by_status(&self, status: CourseStatus) -> BoxFuture<'_, DbResult<Vec<Course>>> {
        Box::pin(async move {
            let courses = self.courses.read().await;
            let mut matching: Vec<Course> = courses
                .values()
                .filter(|c| c.status == status)
                .cloned()
                .collect();
            matching.sort_by_key(|c| c.created_at);
            Ok(matching)
        })
    }

    fn list_courses_by_creator(&self, creator_id: Uuid) -> BoxFuture<'_, DbResult<Vec<Course>>> {
        Box::pin(async move {
            let courses = self.courses.read().await;
            let mut owned: Vec<Course> = courses
                .values()
                .filter(|c| c.creator_id == creator_id)
                .cloned()
                .collect();
            owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(owned)
        })
    }

    fn list_courses_by_ids<'a>(
        &'a self,
        course_ids: &'a [Uuid],
    ) -> BoxFuture<'a, DbResult<Vec<Course>>> {
        Box::pin(async move {
            let courses = self.courses.read().await;
            Ok(course_ids
                .iter()
                .filter_map(|id| courses.get(id).cloned())
                .collect())
        })
    }

    fn insert_course<'a>(&'a self, course: &'a Course) -> BoxFuture<'a, DbResult<Course>> {
        Box::pin(async move {
            let mut courses = self.courses.write().await;
            if courses.contains_key(&course.id) {
                return Err(DatabaseError::Duplicate);
            }
            let mut stored = course.clone();
            stored.sort_lessons();
            courses.insert(stored.id, stored.clone());
            Ok(stored)
        })
    }

    fn update_course<'a>(&'a self, course: &'a Course) -> BoxFuture<'a, DbResult<Course>> {
        Box::pin(async move {
            let mut courses = self.courses.write().await;
            let stored = courses.get_mut(&course.id).ok_or(DatabaseError::NotFound)?;
            let lessons = std::mem::take(&mut stored.lessons);
            *stored = Course {
                lessons,
                ..course.clone()
            };
            Ok(stored.clone())
        })
    }

    fn delete_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            self.courses
                .write()
                .await
                .remove(&course_id)
                .map(|_| ())
                .ok_or(DatabaseError::NotFound)
        })
    }

    fn insert_lesson<'a>(&'a self, lesson: &'a Lesson) -> BoxFuture<'a, DbResult<Lesson>> {
        Box::pin(async move {
            let mut courses = self.courses.write().await;
            let course = courses
                .get_mut(&lesson.course_id)
                .ok_or(DatabaseError::NotFound)?;
            if course.lesson(lesson.id).is_some()
                || course.order_index_taken(lesson.order_index, None)
            {
                return Err(DatabaseError::Duplicate);
            }
            course.lessons.push(lesson.clone());
            course.sort_lessons();
            Ok(lesson.clone())
        })
    }

    fn update_lesson<'a>(&'a self, lesson: &'a Lesson) -> BoxFuture<'a, DbResult<Lesson>> {
        Box::pin(async move {
            let mut courses = self.courses.write().await;
            let course = courses
                .get_mut(&lesson.course_id)
                .ok_or(DatabaseError::NotFound)?;
            if course.order_index_taken(lesson.order_index, Some(lesson.id)) {
                return Err(DatabaseError::Duplicate);
            }
            let stored = course
                .lessons
                .iter_mut()
                .find(|l| l.id == lesson.id)
                .ok_or(DatabaseError::NotFound)?;
            *stored = lesson.clone();
            course.sort_lessons();
            Ok(lesson.clone())
        })
    }

    fn delete_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            let mut courses = self.courses.write().await;
            let course = courses.get_mut(&course_id).ok_or(DatabaseError::NotFound)?;
            course
                .remove_lesson(lesson_id)
                .map(|_| ())
                .ok_or(DatabaseError::NotFound)
        })
    }
}

impl ProfileStore for InMemoryStore {
    fn load_profile(&self, learner_id: Uuid) -> BoxFuture<'_, DbResult<LearnerProfile>> {
        Box::pin(async move {
            let profiles = self.profiles.read().await;
            Ok(profiles
                .get(&learner_id)
                .cloned()
                .unwrap_or_else(|| LearnerProfile::empty(learner_id)))
        })
    }

    fn save_profile<'a>(
        &'a self,
        profile: &'a LearnerProfile,
    ) -> BoxFuture<'a, DbResult<LearnerProfile>> {
        Box::pin(async move {
            let mut profiles = self.profiles.write().await;
            let stored_version = profiles
                .get(&profile.learner_id)
                .map(|p| p.version)
                .unwrap_or(0);
            if stored_version != profile.version {
                return Err(DatabaseError::Conflict);
            }
            let saved = LearnerProfile {
                version: profile.version + 1,
                ..profile.clone()
            };
            profiles.insert(saved.learner_id, saved.clone());
            Ok(saved)
        })
    }
}
