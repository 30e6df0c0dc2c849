use std::sync::Arc;

use serde::Serialize;
use sqlx::types::Uuid;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::actor::Actor;
use super::certificate::CertificateIssuer;
use crate::db::{
    Certificate, Course, CourseProgress, CourseStore, DatabaseError, LearnerProfile,
    LessonProgress, ProfileStore, UserRole,
};

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("Only learners can take part in courses")]
    NotEligible,

    #[error("Course not available")]
    CourseUnavailable,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Not enrolled in this course")]
    NotEnrolled,

    #[error("Lesson not found in progress")]
    LessonNotTracked,

    #[error("Learner profile was modified concurrently")]
    Conflict,

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for EnrollmentError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict => EnrollmentError::Conflict,
            other => EnrollmentError::Database(other),
        }
    }
}

pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub all_completed: bool,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub course_id: Uuid,
    pub percentage: f64,
    pub lessons: Vec<LessonProgress>,
}

impl From<&CourseProgress> for ProgressReport {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            course_id: progress.course_id,
            percentage: progress.percentage(),
            lessons: progress.lessons.clone(),
        }
    }
}

/// Result of applying a mutation to a loaded profile.
enum Mutation<T> {
    Changed(T),
    Unchanged(T),
}

/// Drives enrollment, lesson completion and certificate issuance against a
/// learner's profile. Each mutating call is a single load, mutate, save cycle
/// that is replayed on a version conflict.
pub struct EnrollmentEngine {
    courses: Arc<dyn CourseStore>,
    profiles: Arc<dyn ProfileStore>,
    issuer: CertificateIssuer,
    conflict_retries: u32,
}

impl EnrollmentEngine {
    pub fn new(
        courses: Arc<dyn CourseStore>,
        profiles: Arc<dyn ProfileStore>,
        issuer: CertificateIssuer,
        conflict_retries: u32,
    ) -> Self {
        Self {
            courses,
            profiles,
            issuer,
            conflict_retries,
        }
    }

    #[tracing::instrument(skip(self, actor), fields(learner_id = %actor.user_id))]
    pub async fn enroll(&self, actor: &Actor, course_id: Uuid) -> EnrollmentResult<CourseProgress> {
        ensure_learner(actor)?;

        let course = self
            .courses
            .find_published_course(course_id)
            .await?
            .ok_or(EnrollmentError::CourseUnavailable)?;
        let lessons = self.courses.list_lessons(course.id).await?;

        let progress = self
            .mutate_profile(actor.user_id, |profile| {
                if profile.is_enrolled(course_id) || profile.progress_for(course_id).is_some() {
                    return Err(EnrollmentError::AlreadyEnrolled);
                }
                let progress = CourseProgress::snapshot(course_id, lessons.iter().map(|l| l.id));
                profile.enrolled_course_ids.push(course_id);
                profile.progress.push(progress.clone());
                Ok(Mutation::Changed(progress))
            })
            .await?;

        info!(lessons = progress.lessons.len(), "Learner enrolled");
        Ok(progress)
    }

    #[tracing::instrument(skip(self, actor), fields(learner_id = %actor.user_id))]
    pub async fn mark_complete(
        &self,
        actor: &Actor,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> EnrollmentResult<CompletionOutcome> {
        ensure_learner(actor)?;

        let learner_id = actor.user_id;
        let issuer = self.issuer;
        let outcome = self
            .mutate_profile(learner_id, |profile| {
                let progress = profile
                    .progress_for_mut(course_id)
                    .ok_or(EnrollmentError::NotEnrolled)?;
                let lesson = progress
                    .lesson_mut(lesson_id)
                    .ok_or(EnrollmentError::LessonNotTracked)?;

                let mut changed = !lesson.completed;
                lesson.completed = true;
                let all_completed = progress.is_complete();

                let certificate = if !all_completed {
                    None
                } else if let Some(existing) = profile.certificate_for(course_id) {
                    Some(existing.clone())
                } else {
                    let issued = issuer.issue(learner_id, course_id, OffsetDateTime::now_utc());
                    profile.certificates.push(issued.clone());
                    changed = true;
                    Some(issued)
                };

                let outcome = CompletionOutcome {
                    all_completed,
                    certificate,
                };
                Ok(if changed {
                    Mutation::Changed(outcome)
                } else {
                    Mutation::Unchanged(outcome)
                })
            })
            .await?;

        if let Some(certificate) = &outcome.certificate {
            info!(serial = %certificate.serial, "Course completed");
        }
        Ok(outcome)
    }

    #[tracing::instrument(skip(self, actor), fields(learner_id = %actor.user_id))]
    pub async fn get_progress(&self, actor: &Actor, course_id: Uuid) -> EnrollmentResult<ProgressReport> {
        ensure_learner(actor)?;

        let profile = self.profiles.load_profile(actor.user_id).await?;
        profile
            .progress_for(course_id)
            .map(ProgressReport::from)
            .ok_or(EnrollmentError::NotEnrolled)
    }

    #[tracing::instrument(skip(self, actor), fields(learner_id = %actor.user_id))]
    pub async fn list_certificates(&self, actor: &Actor) -> EnrollmentResult<Vec<Certificate>> {
        ensure_learner(actor)?;

        let profile = self.profiles.load_profile(actor.user_id).await?;
        Ok(profile.certificates)
    }

    /// Enrolled courses that are still published, in enrollment order.
    #[tracing::instrument(skip(self, actor), fields(learner_id = %actor.user_id))]
    pub async fn list_enrolled_courses(&self, actor: &Actor) -> EnrollmentResult<Vec<Course>> {
        ensure_learner(actor)?;

        let profile = self.profiles.load_profile(actor.user_id).await?;
        let courses = self
            .courses
            .list_courses_by_ids(&profile.enrolled_course_ids)
            .await?;
        Ok(courses.into_iter().filter(Course::is_published).collect())
    }

    async fn mutate_profile<T, F>(&self, learner_id: Uuid, mut apply: F) -> EnrollmentResult<T>
    where
        F: FnMut(&mut LearnerProfile) -> EnrollmentResult<Mutation<T>>,
    {
        let mut attempt = 0;
        loop {
            let mut profile = self.profiles.load_profile(learner_id).await?;
            let value = match apply(&mut profile)? {
                Mutation::Unchanged(value) => {
                    debug!("Profile unchanged, skipping write");
                    return Ok(value);
                }
                Mutation::Changed(value) => value,
            };

            match self.profiles.save_profile(&profile).await {
                Ok(_) => return Ok(value),
                Err(DatabaseError::Conflict) if attempt < self.conflict_retries => {
                    attempt += 1;
                    warn!(attempt, "Profile version conflict, reapplying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn ensure_learner(actor: &Actor) -> EnrollmentResult<()> {
    if actor.role == UserRole::Learner {
        Ok(())
    } else {
        Err(EnrollmentError::NotEligible)
    }
}
