use sqlx::{PgPool, types::Uuid};

use crate::db::error::{DatabaseError, DbResult};
use crate::db::models::User;
use crate::db::store::{BoxFuture, UserStore};

const USER_COLUMNS: &str =
    "id, name, email, role, creator_bio, creator_applied_at, creator_approved, created_at";

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for UserRepository {
    fn create_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, DbResult<User>> {
        Box::pin(async move {
            let query = format!(
                r#"
                INSERT INTO users (id, name, email, role, creator_bio, creator_applied_at, creator_approved, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {USER_COLUMNS}
                "#
            );
            let created = sqlx::query_as::<_, User>(&query)
                .bind(user.id)
                .bind(&user.name)
                .bind(user.email.to_lowercase())
                .bind(user.role)
                .bind(&user.creator_bio)
                .bind(user.creator_applied_at)
                .bind(user.creator_approved)
                .bind(user.created_at)
                .fetch_one(&self.pool)
                .await?;
            Ok(created)
        })
    }

    fn find_user(&self, user_id: Uuid) -> BoxFuture<'_, DbResult<Option<User>>> {
        Box::pin(async move {
            let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
            let user = sqlx::query_as::<_, User>(&query)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(user)
        })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, DbResult<Option<User>>> {
        Box::pin(async move {
            let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
            let user = sqlx::query_as::<_, User>(&query)
                .bind(email.to_lowercase())
                .fetch_optional(&self.pool)
                .await?;
            Ok(user)
        })
    }

    fn update_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, DbResult<User>> {
        Box::pin(async move {
            let query = format!(
                r#"
                UPDATE users
                SET name = $1, creator_bio = $2, creator_applied_at = $3, creator_approved = $4
                WHERE id = $5
                RETURNING {USER_COLUMNS}
                "#
            );
            let updated = sqlx::query_as::<_, User>(&query)
                .bind(&user.name)
                .bind(&user.creator_bio)
                .bind(user.creator_applied_at)
                .bind(user.creator_approved)
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;
            Ok(updated)
        })
    }

    fn delete_user(&self, user_id: Uuid) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::NotFound);
            }
            Ok(())
        })
    }

    fn list_pending_creators(&self) -> BoxFuture<'_, DbResult<Vec<User>>> {
        Box::pin(async move {
            let query = format!(
                r#"
                SELECT {USER_COLUMNS} FROM users
                WHERE role = 'creator' AND creator_approved = FALSE
                ORDER BY created_at
                "#
            );
            let users = sqlx::query_as::<_, User>(&query)
                .fetch_all(&self.pool)
                .await?;
            Ok(users)
        })
    }
}
