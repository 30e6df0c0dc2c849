use serde::Serialize;
use sqlx::types::Uuid;

use crate::db::UserRole;
use crate::error::{AppError, AppResult};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn require_role(&self, role: UserRole) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "requires the {} role",
                role_name(role)
            )))
        }
    }
}

fn role_name(role: UserRole) -> &'static str {
    match role {
        UserRole::Learner => "learner",
        UserRole::Creator => "creator",
        UserRole::Admin => "admin",
    }
}
