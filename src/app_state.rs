use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::warn;

use crate::config;
use crate::db::{
    self, CourseRepository, CourseStore, InMemoryStore, ProfileRepository, ProfileStore,
    UserRepository, UserStore,
};
use crate::services::{AccountService, CatalogService, CertificateIssuer, EnrollmentEngine};

#[derive(Clone)]
pub struct AppState {
    /// Present only when running against Postgres.
    pub db: Option<PgPool>,
    pub env: config::Config,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub enrollment: Arc<EnrollmentEngine>,
}

impl AppState {
    /// Connects to Postgres when configured, otherwise falls back to the
    /// in-process store.
    pub async fn build(env: config::Config) -> Result<Self> {
        match &env.database {
            Some(database) => {
                let pool = db::init_pool(database).await?;
                let users = Arc::new(UserRepository::new(pool.clone()));
                let courses = Arc::new(CourseRepository::new(pool.clone()));
                let profiles = Arc::new(ProfileRepository::new(pool.clone()));
                Ok(Self::with_stores(env, Some(pool), users, courses, profiles))
            }
            None => {
                warn!("DATABASE_URL not set, using the in-process store; data is lost on restart");
                let store = Arc::new(InMemoryStore::new());
                Ok(Self::with_stores(env, None, store.clone(), store.clone(), store))
            }
        }
    }

    pub fn with_stores(
        env: config::Config,
        db: Option<PgPool>,
        users: Arc<dyn UserStore>,
        courses: Arc<dyn CourseStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let enrollment = EnrollmentEngine::new(
            courses.clone(),
            profiles,
            CertificateIssuer::new(),
            env.enrollment.conflict_retries,
        );
        Self {
            db,
            accounts: Arc::new(AccountService::new(users.clone())),
            catalog: Arc::new(CatalogService::new(users, courses)),
            enrollment: Arc::new(enrollment),
            env,
        }
    }
}
