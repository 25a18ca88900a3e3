//! Signed-in identities and their roles.

use crate::types::{AccountManagerId, PrincipalId};
use serde::{Deserialize, Serialize};

/// Persisted role label for management users.
pub const ROLE_MANAGEMENT: &str = "MANAGEMENT";
/// Persisted role label for individual account managers.
pub const ROLE_ACCOUNT_MANAGER: &str = "AM";

/// What a principal may see.
///
/// An account manager carries its entity link inside the variant, so an
/// unlinked account manager can never be mistaken for a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Manager,
    AccountManager { linked: Option<AccountManagerId> },
}

impl Role {
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Manager)
    }

    /// Linked entity, if any. Managers never have one.
    pub fn linked_entity(&self) -> Option<AccountManagerId> {
        match self {
            Role::Manager => None,
            Role::AccountManager { linked } => *linked,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Manager => ROLE_MANAGEMENT,
            Role::AccountManager { .. } => ROLE_ACCOUNT_MANAGER,
        }
    }

    /// Decode the (label, link) pair stored in the `app_user` table.
    /// Returns `None` for a label that is neither role.
    pub fn from_stored(label: &str, linked: Option<AccountManagerId>) -> Option<Self> {
        match label {
            ROLE_MANAGEMENT => Some(Role::Manager),
            ROLE_ACCOUNT_MANAGER => Some(Role::AccountManager { linked }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
    /// Lowercased identity key.
    pub email: String,
    pub role: Role,
}

/// Role and profile re-read from the store when a session is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl SessionClaims {
    /// Build the principal a request runs as. The id is empty when no
    /// principal row exists yet.
    pub fn into_principal(self, id: Option<PrincipalId>) -> Principal {
        Principal {
            id: id.unwrap_or_default(),
            display_name: self.display_name.unwrap_or_default(),
            email: self.email,
            role: self.role,
        }
    }
}

/// Row shape of the `app_user` table before the role label is decoded.
#[derive(Debug, Clone)]
pub struct StoredPrincipal {
    pub id: PrincipalId,
    pub display_name: String,
    pub email: String,
    pub role_label: String,
    pub am_id: Option<AccountManagerId>,
}
