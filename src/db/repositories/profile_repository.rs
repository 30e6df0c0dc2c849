use sqlx::{PgPool, types::{Json, Uuid}};

use crate::db::error::{DatabaseError, DbResult};
use crate::db::models::{LearnerProfile, LearnerProfileRow};
use crate::db::store::{BoxFuture, ProfileStore};

const PROFILE_COLUMNS: &str = "learner_id, enrolled_course_ids, progress, certificates, version";

/// Stores each learner profile as a single row; `version` guards writes.
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProfileStore for ProfileRepository {
    fn load_profile(&self, learner_id: Uuid) -> BoxFuture<'_, DbResult<LearnerProfile>> {
        Box::pin(async move {
            let query = format!("SELECT {PROFILE_COLUMNS} FROM learner_profiles WHERE learner_id = $1");
            let row = sqlx::query_as::<_, LearnerProfileRow>(&query)
                .bind(learner_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row
                .map(LearnerProfile::from)
                .unwrap_or_else(|| LearnerProfile::empty(learner_id)))
        })
    }

    fn save_profile<'a>(
        &'a self,
        profile: &'a LearnerProfile,
    ) -> BoxFuture<'a, DbResult<LearnerProfile>> {
        Box::pin(async move {
            let query = if profile.version == 0 {
                format!(
                    r#"
                    INSERT INTO learner_profiles (learner_id, enrolled_course_ids, progress, certificates, version)
                    VALUES ($1, $2, $3, $4, 1)
                    ON CONFLICT (learner_id) DO NOTHING
                    RETURNING {PROFILE_COLUMNS}
                    "#
                )
            } else {
                format!(
                    r#"
                    UPDATE learner_profiles
                    SET enrolled_course_ids = $2, progress = $3, certificates = $4,
                        version = version + 1, updated_at = NOW()
                    WHERE learner_id = $1 AND version = $5
                    RETURNING {PROFILE_COLUMNS}
                    "#
                )
            };

            let mut q = sqlx::query_as::<_, LearnerProfileRow>(&query)
                .bind(profile.learner_id)
                .bind(&profile.enrolled_course_ids)
                .bind(Json(&profile.progress))
                .bind(Json(&profile.certificates));
            if profile.version != 0 {
                q = q.bind(profile.version);
            }

            // No row back means another writer got there first.
            let row = q
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DatabaseError::Conflict)?;
            Ok(LearnerProfile::from(row))
        })
    }
}
