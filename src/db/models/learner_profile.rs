use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: Uuid,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub lessons: Vec<LessonProgress>,
}

impl CourseProgress {
    /// Snapshots the given lesson ids, all incomplete.
    pub fn snapshot<I>(course_id: Uuid, lesson_ids: I) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        Self {
            course_id,
            lessons: lesson_ids
                .into_iter()
                .map(|lesson_id| LessonProgress {
                    lesson_id,
                    completed: false,
                })
                .collect(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.lessons.iter().filter(|l| l.completed).count()
    }

    pub fn percentage(&self) -> f64 {
        let total = self.lessons.len();
        if total == 0 {
            return 0.0;
        }
        self.completed_count() as f64 / total as f64 * 100.0
    }

    /// A course with no tracked lessons is never complete.
    pub fn is_complete(&self) -> bool {
        !self.lessons.is_empty() && self.lessons.iter().all(|l| l.completed)
    }

    pub fn lesson_mut(&mut self, lesson_id: Uuid) -> Option<&mut LessonProgress> {
        self.lessons.iter_mut().find(|l| l.lesson_id == lesson_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub course_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    pub serial: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub learner_id: Uuid,
    pub enrolled_course_ids: Vec<Uuid>,
    pub progress: Vec<CourseProgress>,
    pub certificates: Vec<Certificate>,
    /// Optimistic concurrency counter. Zero means the profile was never saved.
    pub version: i64,
}

impl LearnerProfile {
    pub fn empty(learner_id: Uuid) -> Self {
        Self {
            learner_id,
            enrolled_course_ids: Vec::new(),
            progress: Vec::new(),
            certificates: Vec::new(),
            version: 0,
        }
    }

    pub fn is_enrolled(&self, course_id: Uuid) -> bool {
        self.enrolled_course_ids.contains(&course_id)
    }

    pub fn progress_for(&self, course_id: Uuid) -> Option<&CourseProgress> {
        self.progress.iter().find(|p| p.course_id == course_id)
    }

    pub fn progress_for_mut(&mut self, course_id: Uuid) -> Option<&mut CourseProgress> {
        self.progress.iter_mut().find(|p| p.course_id == course_id)
    }

    pub fn certificate_for(&self, course_id: Uuid) -> Option<&Certificate> {
        self.certificates.iter().find(|c| c.course_id == course_id)
    }
}

/// Row shape of `learner_profiles`.
#[derive(Debug, sqlx::FromRow)]
pub struct LearnerProfileRow {
    pub learner_id: Uuid,
    pub enrolled_course_ids: Vec<Uuid>,
    pub progress: sqlx::types::Json<Vec<CourseProgress>>,
    pub certificates: sqlx::types::Json<Vec<Certificate>>,
    pub version: i64,
}

impl From<LearnerProfileRow> for LearnerProfile {
    fn from(row: LearnerProfileRow) -> Self {
        Self {
            learner_id: row.learner_id,
            enrolled_course_ids: row.enrolled_course_ids,
            progress: row.progress.0,
            certificates: row.certificates.0,
            version: row.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_snapshot_reports_zero_percent() {
        let progress = CourseProgress::snapshot(Uuid::new_v4(), Vec::new());
        assert_eq!(progress.percentage(), 0.0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn percentage_tracks_completed_lessons() {
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let mut progress = CourseProgress::snapshot(Uuid::new_v4(), ids);
        progress.lesson_mut(ids[0]).unwrap().completed = true;
        assert_eq!(progress.percentage(), 25.0);

        for id in ids {
            progress.lesson_mut(id).unwrap().completed = true;
        }
        assert_eq!(progress.percentage(), 100.0);
        assert!(progress.is_complete());
    }

    proptest! {
        #[test]
        fn percentage_stays_in_bounds(flags in proptest::collection::vec(any::<bool>(), 0..64)) {
            let progress = CourseProgress {
                course_id: Uuid::nil(),
                lessons: flags
                    .iter()
                    .map(|&completed| LessonProgress { lesson_id: Uuid::new_v4(), completed })
                    .collect(),
            };
            let pct = progress.percentage();
            prop_assert!(pct.is_finite());
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }
}
