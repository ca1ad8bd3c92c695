//! Identity and tenant lookups the service depends on

use async_trait::async_trait;
use rentdesk_store::{DirectoryStore, TenantInfo, UserInfo};

use crate::error::Result;

/// Read-only view of the identity/tenant directory.
///
/// The service only checks that referenced records exist and reads display
/// names and tenant placement from here.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn organization_exists(&self, organization_id: &str) -> Result<bool>;

    async fn user(&self, user_id: &str) -> Result<Option<UserInfo>>;

    /// Tenant scoped to an organization
    async fn tenant(&self, organization_id: &str, tenant_id: &str) -> Result<Option<TenantInfo>>;
}

#[async_trait]
impl TenantDirectory for DirectoryStore {
    async fn organization_exists(&self, organization_id: &str) -> Result<bool> {
        Ok(self.organization(organization_id).await?.is_some())
    }

    async fn user(&self, user_id: &str) -> Result<Option<UserInfo>> {
        Ok(DirectoryStore::user(self, user_id).await?)
    }

    async fn tenant(&self, organization_id: &str, tenant_id: &str) -> Result<Option<TenantInfo>> {
        Ok(DirectoryStore::tenant(self, organization_id, tenant_id).await?)
    }
}
