//! Verified identity extracted from a bearer credential

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role that grants access to the admin API
pub const ADMIN_ROLE: &str = "admin";

/// Identity carried by a validated credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user
    pub user_id: String,
    /// Tenant (store group) the user belongs to, if any
    pub tenant_id: Option<String>,
    /// Roles granted to the user
    pub roles: Vec<String>,
    /// When the credential expires
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Create claims for a user with no tenant and no roles
    pub fn new(user_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: None,
            roles: Vec::new(),
            expires_at,
        }
    }

    /// Set the tenant
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Add a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}
