//! App user repository for database operations.

use sqlx::PgPool;

use crate::entities::AppUserEntity;
use crate::metrics::QueryTimer;

/// Repository for platform user lookups.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by id.
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<AppUserEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_user_by_id");

        let result = sqlx::query_as::<_, AppUserEntity>(
            r#"
            SELECT user_id, full_name, phone, role, status, created_at
            FROM app_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish();
        result
    }
}
