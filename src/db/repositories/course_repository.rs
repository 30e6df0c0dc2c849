use std::collections::HashMap;

use sqlx::{PgPool, types::Uuid};

use crate::db::error::{DatabaseError, DbResult};
use crate::db::models::{Course, CourseStatus, Lesson};
use crate::db::store::{BoxFuture, CourseStore};

const COURSE_COLUMNS: &str =
    "id, creator_id, title, description, image, status, published_at, created_at, updated_at";

const LESSON_COLUMNS: &str = "id, course_id, title, content, order_index, transcript, created_at";

pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the lessons of every course in one query and attaches them.
    async fn with_lessons(&self, mut courses: Vec<Course>) -> DbResult<Vec<Course>> {
        if courses.is_empty() {
            return Ok(courses);
        }
        let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
        let query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ANY($1) ORDER BY course_id, order_index"
        );
        let lessons = sqlx::query_as::<_, Lesson>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_course: HashMap<Uuid, Vec<Lesson>> = HashMap::new();
        for lesson in lessons {
            by_course.entry(lesson.course_id).or_default().push(lesson);
        }
        for course in courses.iter_mut() {
            course.lessons = by_course.remove(&course.id).unwrap_or_default();
        }
        Ok(courses)
    }

    async fn fetch_courses(&self, query: &str, bind: Option<Uuid>) -> DbResult<Vec<Course>> {
        let mut q = sqlx::query_as::<_, Course>(query);
        if let Some(value) = bind {
            q = q.bind(value);
        }
        let courses = q.fetch_all(&self.pool).await?;
        self.with_lessons(courses).await
    }
}

impl CourseStore for CourseRepository {
    fn find_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Option<Course>>> {
        Box::pin(async move {
            let query = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
            let courses = self.fetch_courses(&query, Some(course_id)).await?;
            Ok(courses.into_iter().next())
        })
    }

    fn find_published_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Option<Course>>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND status = 'published'"
            );
            let courses = self.fetch_courses(&query, Some(course_id)).await?;
            Ok(courses.into_iter().next())
        })
    }

    fn list_lessons(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<Vec<Lesson>>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY order_index"
            );
            let lessons = sqlx::query_as::<_, Lesson>(&query)
                .bind(course_id)
                .fetch_all(&self.pool)
                .await?;
            Ok(lessons)
        })
    }

    fn list_courses_by_status(&self, status: CourseStatus) -> BoxFuture<'_, DbResult<Vec<Course>>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {COURSE_COLUMNS} FROM courses WHERE status = $1 ORDER BY created_at"
            );
            let courses = sqlx::query_as::<_, Course>(&query)
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
            self.with_lessons(courses).await
        })
    }

    fn list_courses_by_creator(&self, creator_id: Uuid) -> BoxFuture<'_, DbResult<Vec<Course>>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {COURSE_COLUMNS} FROM courses WHERE creator_id = $1 ORDER BY created_at DESC"
            );
            self.fetch_courses(&query, Some(creator_id)).await
        })
    }

    fn list_courses_by_ids<'a>(
        &'a self,
        course_ids: &'a [Uuid],
    ) -> BoxFuture<'a, DbResult<Vec<Course>>> {
        Box::pin(async move {
            let query = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1)");
            let found = sqlx::query_as::<_, Course>(&query)
                .bind(course_ids)
                .fetch_all(&self.pool)
                .await?;
            let mut found: HashMap<Uuid, Course> = self
                .with_lessons(found)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect();
            Ok(course_ids.iter().filter_map(|id| found.remove(id)).collect())
        })
    }

    fn insert_course<'a>(&'a self, course: &'a Course) -> BoxFuture<'a, DbResult<Course>> {
        Box::pin(async move {
            let query = format!(
                r#"
                INSERT INTO courses (id, creator_id, title, description, image, status, published_at, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {COURSE_COLUMNS}
                "#
            );
            let created = sqlx::query_as::<_, Course>(&query)
                .bind(course.id)
                .bind(course.creator_id)
                .bind(&course.title)
                .bind(&course.description)
                .bind(&course.image)
                .bind(course.status)
                .bind(course.published_at)
                .bind(course.created_at)
                .bind(course.updated_at)
                .fetch_one(&self.pool)
                .await?;
            Ok(created)
        })
    }

    fn update_course<'a>(&'a self, course: &'a Course) -> BoxFuture<'a, DbResult<Course>> {
        Box::pin(async move {
            let query = format!(
                r#"
                UPDATE courses
                SET title = $1, description = $2, image = $3, status = $4, published_at = $5, updated_at = $6
                WHERE id = $7
                RETURNING {COURSE_COLUMNS}
                "#
            );
            let updated = sqlx::query_as::<_, Course>(&query)
                .bind(&course.title)
                .bind(&course.description)
                .bind(&course.image)
                .bind(course.status)
                .bind(course.published_at)
                .bind(course.updated_at)
                .bind(course.id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DatabaseError::NotFound)?;
            let mut courses = self.with_lessons(vec![updated]).await?;
            courses.pop().ok_or(DatabaseError::NotFound)
        })
    }

    fn delete_course(&self, course_id: Uuid) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM courses WHERE id = $1")
                .bind(course_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::NotFound);
            }
            Ok(())
        })
    }

    fn insert_lesson<'a>(&'a self, lesson: &'a Lesson) -> BoxFuture<'a, DbResult<Lesson>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            let query = format!(
                r#"
                INSERT INTO lessons (id, course_id, title, content, order_index, transcript, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {LESSON_COLUMNS}
                "#
            );
            let created = sqlx::query_as::<_, Lesson>(&query)
                .bind(lesson.id)
                .bind(lesson.course_id)
                .bind(&lesson.title)
                .bind(&lesson.content)
                .bind(lesson.order_index)
                .bind(&lesson.transcript)
                .bind(lesson.created_at)
                .fetch_one(&mut *tx)
                .await?;
            sqlx::query("UPDATE courses SET updated_at = NOW() WHERE id = $1")
                .bind(lesson.course_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(created)
        })
    }

    fn update_lesson<'a>(&'a self, lesson: &'a Lesson) -> BoxFuture<'a, DbResult<Lesson>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            let query = format!(
                r#"
                UPDATE lessons
                SET title = $1, content = $2, order_index = $3, transcript = $4
                WHERE id = $5 AND course_id = $6
                RETURNING {LESSON_COLUMNS}
                "#
            );
            let updated = sqlx::query_as::<_, Lesson>(&query)
                .bind(&lesson.title)
                .bind(&lesson.content)
                .bind(lesson.order_index)
                .bind(&lesson.transcript)
                .bind(lesson.id)
                .bind(lesson.course_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DatabaseError::NotFound)?;
            sqlx::query("UPDATE courses SET updated_at = NOW() WHERE id = $1")
                .bind(lesson.course_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(updated)
        })
    }

    fn delete_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            let removed: Option<i32> = sqlx::query_scalar(
                "DELETE FROM lessons WHERE id = $1 AND course_id = $2 RETURNING order_index",
            )
            .bind(lesson_id)
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;
            let removed = removed.ok_or(DatabaseError::NotFound)?;

            sqlx::query(
                "UPDATE lessons SET order_index = order_index - 1 WHERE course_id = $1 AND order_index > $2",
            )
            .bind(course_id)
            .bind(removed)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE courses SET updated_at = NOW() WHERE id = $1")
                .bind(course_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(())
        })
    }
}
