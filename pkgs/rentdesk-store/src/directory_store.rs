//! Directory store for organizations, users and tenants

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::{organizations, tenants, users};

/// Organization information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

impl From<organizations::Model> for OrganizationInfo {
    fn from(model: organizations::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

/// User information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub display_name: String,
    pub created_at: i64,
}

impl From<users::Model> for UserInfo {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            display_name: model.display_name,
            created_at: model.created_at,
        }
    }
}

/// Tenant information with current property/unit placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub id: String,
    pub organization_id: String,
    pub display_name: String,
    pub property_id: Option<String>,
    pub unit_id: Option<String>,
}

impl From<tenants::Model> for TenantInfo {
    fn from(model: tenants::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            display_name: model.display_name,
            property_id: model.property_id,
            unit_id: model.unit_id,
        }
    }
}

/// Directory store
#[derive(Clone)]
pub struct DirectoryStore {
    db: DatabaseConnection,
}

impl DirectoryStore {
    /// Create a new directory store
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add an organization
    pub async fn add_organization(&self, id: &str, name: &str) -> Result<(), DbErr> {
        organizations::Entity::insert(organizations::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().timestamp_millis()),
        })
        .exec_without_returning(&self.db)
        .await?;

        info!("Added organization: {} ({})", name, id);
        Ok(())
    }

    /// Get an organization by id
    pub async fn organization(&self, id: &str) -> Result<Option<OrganizationInfo>, DbErr> {
        let result = organizations::Entity::find()
            .filter(organizations::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        Ok(result.map(OrganizationInfo::from))
    }

    /// Add a user
    pub async fn add_user(&self, id: &str, display_name: &str) -> Result<(), DbErr> {
        users::Entity::insert(users::ActiveModel {
            id: Set(id.to_string()),
            display_name: Set(display_name.to_string()),
            created_at: Set(chrono::Utc::now().timestamp_millis()),
        })
        .exec_without_returning(&self.db)
        .await?;

        debug!("Added user: {} ({})", display_name, id);
        Ok(())
    }

    /// Get a user by id
    pub async fn user(&self, id: &str) -> Result<Option<UserInfo>, DbErr> {
        let result = users::Entity::find()
            .filter(users::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        Ok(result.map(UserInfo::from))
    }

    /// Add a tenant to an organization
    pub async fn add_tenant(&self, tenant: TenantInfo) -> Result<(), DbErr> {
        let now = chrono::Utc::now().timestamp_millis();
        debug!(
            "Adding tenant {} to organization {}",
            tenant.id, tenant.organization_id
        );

        tenants::Entity::insert(tenants::ActiveModel {
            id: Set(tenant.id),
            organization_id: Set(tenant.organization_id),
            display_name: Set(tenant.display_name),
            property_id: Set(tenant.property_id),
            unit_id: Set(tenant.unit_id),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .exec_without_returning(&self.db)
        .await?;

        Ok(())
    }

    /// Get a tenant belonging to an organization
    pub async fn tenant(
        &self,
        organization_id: &str,
        tenant_id: &str,
    ) -> Result<Option<TenantInfo>, DbErr> {
        let result = tenants::Entity::find()
            .filter(tenants::Column::Id.eq(tenant_id))
            .filter(tenants::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await?;

        Ok(result.map(TenantInfo::from))
    }

    /// Move a tenant to another property/unit; returns `false` if the tenant does not exist
    pub async fn move_tenant(
        &self,
        tenant_id: &str,
        property_id: Option<&str>,
        unit_id: Option<&str>,
    ) -> Result<bool, DbErr> {
        let existing = tenants::Entity::find()
            .filter(tenants::Column::Id.eq(tenant_id))
            .one(&self.db)
            .await?;

        if let Some(model) = existing {
            let mut active_model: tenants::ActiveModel = model.into();
            active_model.property_id = Set(property_id.map(str::to_string));
            active_model.unit_id = Set(unit_id.map(str::to_string));
            active_model.updated_at = Set(chrono::Utc::now().timestamp_millis());
            active_model.update(&self.db).await?;
            info!("Tenant '{}' moved", tenant_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
