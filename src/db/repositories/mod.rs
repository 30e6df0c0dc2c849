mod course_repository;
mod profile_repository;
mod user_repository;

pub use course_repository::CourseRepository;
pub use profile_repository::ProfileRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
mod tests {
    use sqlx::{types::Uuid, PgPool};
    use time::OffsetDateTime;

    use super::*;
    use crate::db::error::DatabaseError;
    use crate::db::models::{Course, CourseStatus, LearnerProfile, Lesson, User, UserRole};
    use crate::db::store::{CourseStore, ProfileStore, UserStore};

    async fn seed_user(pool: &PgPool, role: UserRole) -> User {
        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        let user = User {
            id,
            name: "Ferris".to_string(),
            email: format!("{id}@example.com"),
            role,
            creator_bio: None,
            creator_applied_at: None,
            creator_approved: role == UserRole::Creator,
            created_at: now,
        };
        UserRepository::new(pool.clone())
            .create_user(&user)
            .await
            .expect("seed user")
    }

    fn lesson(course_id: Uuid, order_index: i32) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            course_id,
            title: format!("Lesson {order_index}"),
            content: None,
            order_index,
            transcript: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn profile_saves_are_version_checked(pool: PgPool) {
        let learner = seed_user(&pool, UserRole::Learner).await;
        let profiles = ProfileRepository::new(pool);

        let empty = profiles.load_profile(learner.id).await.unwrap();
        assert_eq!(empty.version, 0);

        let first = profiles.save_profile(&empty).await.unwrap();
        assert_eq!(first.version, 1);

        // A second first-save loses to the row that already exists.
        let racing = LearnerProfile::empty(learner.id);
        let err = profiles.save_profile(&racing).await.expect_err("duplicate insert");
        assert!(matches!(err, DatabaseError::Conflict));

        let mut next = first.clone();
        next.enrolled_course_ids.push(Uuid::new_v4());
        let second = profiles.save_profile(&next).await.unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.enrolled_course_ids, next.enrolled_course_ids);

        let err = profiles.save_profile(&first).await.expect_err("stale update");
        assert!(matches!(err, DatabaseError::Conflict));
        assert_eq!(profiles.load_profile(learner.id).await.unwrap().version, 2);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn deleting_a_lesson_recompacts_sibling_order(pool: PgPool) {
        let creator = seed_user(&pool, UserRole::Creator).await;
        let courses = CourseRepository::new(pool);
        let now = OffsetDateTime::now_utc();
        let course = courses
            .insert_course(&Course {
                id: Uuid::new_v4(),
                creator_id: creator.id,
                title: "Pinning".to_string(),
                description: None,
                image: None,
                status: CourseStatus::Draft,
                published_at: None,
                created_at: now,
                updated_at: now,
                lessons: Vec::new(),
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for index in 1..=3 {
            ids.push(courses.insert_lesson(&lesson(course.id, index)).await.unwrap().id);
        }

        let err = courses
            .insert_lesson(&lesson(course.id, 2))
            .await
            .expect_err("order collision");
        assert!(matches!(err, DatabaseError::Duplicate));

        courses.delete_lesson(course.id, ids[0]).await.unwrap();

        let lessons = courses.list_lessons(course.id).await.unwrap();
        let order: Vec<(Uuid, i32)> = lessons.iter().map(|l| (l.id, l.order_index)).collect();
        assert_eq!(order, vec![(ids[1], 1), (ids[2], 2)]);

        let err = courses
            .delete_lesson(course.id, ids[0])
            .await
            .expect_err("already deleted");
        assert!(matches!(err, DatabaseError::NotFound));
    }
}
