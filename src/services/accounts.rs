use std::sync::Arc;

use sqlx::types::Uuid;
use time::OffsetDateTime;
use tracing::info;

use super::actor::Actor;
use crate::db::{NewUser, User, UserRole, UserStore};
use crate::error::{AppError, AppResult};

pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn register(&self, new_user: NewUser) -> AppResult<User> {
        let email = new_user.email.trim().to_lowercase();
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let is_creator = new_user.role == UserRole::Creator;
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email,
            role: new_user.role,
            creator_bio: if is_creator {
                Some(new_user.bio.unwrap_or_default())
            } else {
                None
            },
            creator_applied_at: is_creator.then_some(now),
            creator_approved: false,
            created_at: now,
        };
        let user = self.users.create_user(&user).await?;
        info!(user_id = %user.id, role = ?user.role, "User registered");
        Ok(user)
    }

    pub async fn find(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.find_user(user_id).await?)
    }

    pub async fn list_pending_creators(&self, actor: &Actor) -> AppResult<Vec<User>> {
        actor.require_role(UserRole::Admin)?;
        Ok(self.users.list_pending_creators().await?)
    }

    pub async fn approve_creator(&self, actor: &Actor, user_id: Uuid) -> AppResult<User> {
        actor.require_role(UserRole::Admin)?;
        let mut user = self.creator(user_id).await?;
        if user.creator_approved {
            return Err(AppError::BadRequest("User is already approved".to_string()));
        }
        user.creator_approved = true;
        let user = self.users.update_user(&user).await?;
        info!(user_id = %user.id, "Creator approved");
        Ok(user)
    }

    /// Rejecting an application removes the account.
    pub async fn reject_creator(&self, actor: &Actor, user_id: Uuid) -> AppResult<()> {
        actor.require_role(UserRole::Admin)?;
        let user = self.creator(user_id).await?;
        self.users.delete_user(user.id).await?;
        info!(user_id = %user.id, "Creator application rejected");
        Ok(())
    }

    async fn creator(&self, user_id: Uuid) -> AppResult<User> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.role != UserRole::Creator {
            return Err(AppError::BadRequest("User is not a creator".to_string()));
        }
        Ok(user)
    }
}
