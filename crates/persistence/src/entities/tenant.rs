//! Tenant entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::tenant::{Tenant, TenantStatus};

#[derive(Debug, Clone, FromRow)]
pub struct TenantEntity {
    pub tenant_id: i64,
    pub tenant_code: String,
    pub name: String,
    pub status: String,
    pub default_currency: String,
    pub default_timezone: String,
    pub created_at: DateTime<Utc>,
}

impl TenantEntity {
    pub fn into_domain(self) -> Tenant {
        let status = self
            .status
            .parse::<TenantStatus>()
            .unwrap_or(TenantStatus::Suspended);

        Tenant {
            tenant_id: self.tenant_id,
            tenant_code: self.tenant_code,
            name: self.name,
            status,
            default_currency: self.default_currency,
            default_timezone: self.default_timezone,
            created_at: self.created_at,
        }
    }
}

impl From<TenantEntity> for Tenant {
    fn from(entity: TenantEntity) -> Self {
        entity.into_domain()
    }
}
