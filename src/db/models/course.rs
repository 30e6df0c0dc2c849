use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "course_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub order_index: i32,
    pub transcript: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: CourseStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Always kept sorted by `order_index`.
    #[sqlx(skip)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }

    pub fn lesson(&self, lesson_id: Uuid) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    pub fn order_index_taken(&self, order_index: i32, except: Option<Uuid>) -> bool {
        self.lessons
            .iter()
            .any(|l| l.order_index == order_index && Some(l.id) != except)
    }

    pub fn next_order_index(&self) -> i32 {
        self.lessons.iter().map(|l| l.order_index).max().unwrap_or(0) + 1
    }

    pub fn sort_lessons(&mut self) {
        self.lessons.sort_by_key(|l| l.order_index);
    }

    /// Removes a lesson by id and closes the gap it leaves: every sibling
    /// with a higher `order_index` moves down by one.
    pub fn remove_lesson(&mut self, lesson_id: Uuid) -> Option<Lesson> {
        let position = self.lessons.iter().position(|l| l.id == lesson_id)?;
        let removed = self.lessons.remove(position);
        for lesson in self.lessons.iter_mut() {
            if lesson.order_index > removed.order_index {
                lesson.order_index -= 1;
            }
        }
        self.sort_lessons();
        Some(removed)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewCourse {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Partial course edit. For nullable fields, an absent key keeps the stored
/// value and an explicit `null` clears it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewLesson {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: Option<String>,
    #[validate(range(min = 1))]
    pub order_index: Option<i32>,
    pub transcript: Option<String>,
}

/// Partial lesson edit, with the same `null` semantics as `UpdateCourse`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLesson {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: Option<Option<String>>,
    #[validate(range(min = 1))]
    pub order_index: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub transcript: Option<Option<String>>,
}

/// Maps a present key to `Some`, so `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct CourseReview {
    pub action: ReviewAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_with_lessons(count: i32) -> Course {
        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        Course {
            id,
            creator_id: Uuid::new_v4(),
            title: "Rust basics".to_string(),
            description: None,
            image: None,
            status: CourseStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
            lessons: (1..=count)
                .map(|i| Lesson {
                    id: Uuid::new_v4(),
                    course_id: id,
                    title: format!("Lesson {i}"),
                    content: None,
                    order_index: i,
                    transcript: None,
                    created_at: now,
                })
                .collect(),
        }
    }

    #[test]
    fn remove_lesson_recompacts_higher_indices() {
        let mut course = course_with_lessons(4);
        let second = course.lessons[1].id;
        let fourth = course.lessons[3].id;

        let removed = course.remove_lesson(second).expect("lesson exists");

        assert_eq!(removed.order_index, 2);
        let indices: Vec<i32> = course.lessons.iter().map(|l| l.order_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(course.lesson(fourth).map(|l| l.order_index), Some(3));
    }

    #[test]
    fn remove_unknown_lesson_leaves_course_untouched() {
        let mut course = course_with_lessons(2);
        assert!(course.remove_lesson(Uuid::new_v4()).is_none());
        assert_eq!(course.lessons.len(), 2);
    }

    #[test]
    fn next_order_index_appends_after_highest() {
        assert_eq!(course_with_lessons(0).next_order_index(), 1);
        assert_eq!(course_with_lessons(3).next_order_index(), 4);
    }

    #[test]
    fn order_index_taken_ignores_the_lesson_being_edited() {
        let course = course_with_lessons(2);
        let first = course.lessons[0].id;
        assert!(course.order_index_taken(1, None));
        assert!(!course.order_index_taken(1, Some(first)));
        assert!(course.order_index_taken(2, Some(first)));
    }

    #[test]
    fn update_payload_separates_absent_from_null() {
        let absent: UpdateCourse = serde_json::from_str(r#"{"title":"Traits"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateCourse = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateLesson = serde_json::from_str(r#"{"content":"Body"}"#).unwrap();
        assert_eq!(set.content, Some(Some("Body".to_string())));
        assert_eq!(set.transcript, None);
    }
}
