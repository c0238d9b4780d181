//! App user entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::user::{AppUser, Role, UserStatus};

#[derive(Debug, Clone, FromRow)]
pub struct AppUserEntity {
    pub user_id: i64,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl AppUserEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> AppUser {
        let role = self.role.parse::<Role>().unwrap_or(Role::Rider);
        let status = self
            .status
            .parse::<UserStatus>()
            .unwrap_or(UserStatus::Inactive);

        AppUser {
            user_id: self.user_id,
            full_name: self.full_name,
            phone: self.phone,
            role,
            status,
            created_at: self.created_at,
        }
    }
}

impl From<AppUserEntity> for AppUser {
    fn from(entity: AppUserEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_maps_to_inactive() {
        let entity = AppUserEntity {
            user_id: 1,
            full_name: "Asha Rao".to_string(),
            phone: None,
            role: "RIDER".to_string(),
            status: "???".to_string(),
            created_at: Utc::now(),
        };
        let user = entity.into_domain();
        assert_eq!(user.status, UserStatus::Inactive);
        assert!(!user.is_active());
    }
}
