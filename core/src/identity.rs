//! Identity resolver: turns an identity-provider assertion into a local
//! principal and re-derives session claims from the store.
//!
//! Role and entity link are decided at sign-in and written to `app_user`.
//! Every session refresh reads them back from the store rather than trusting
//! anything cached in the session, so administrative relinks apply without
//! waiting for the provider session to expire.

use crate::{
    config::ManagementAllowList,
    error::{AccessError, DashResult, SignInError},
    principal::{Principal, Role, SessionClaims},
    store::DashStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims handed over by the identity provider after authentication.
///
/// Some providers leave `email` unset; the address is then taken from the
/// first populated fallback in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityAssertion {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_email: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub upn: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl IdentityAssertion {
    pub fn with_email(email: &str, name: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Normalized (trimmed, lowercased) email from the first usable claim.
    pub fn derived_email(&self) -> Option<String> {
        [
            &self.email,
            &self.profile_email,
            &self.preferred_username,
            &self.upn,
        ]
        .into_iter()
        .flatten()
        .map(|claim| claim.trim())
        .find(|claim| !claim.is_empty())
        .map(str::to_lowercase)
    }
}

pub struct IdentityResolver<'a> {
    store: &'a DashStore,
    allow_list: Arc<ManagementAllowList>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(store: &'a DashStore, allow_list: Arc<ManagementAllowList>) -> Self {
        Self { store, allow_list }
    }

    /// Decide the role for a normalized email.
    pub fn resolve_role(&self, email: &str) -> DashResult<Role> {
        if self.allow_list.contains(email) {
            return Ok(Role::Manager);
        }
        let linked = self
            .store
            .find_account_manager_by_email(email)?
            .map(|am| am.id);
        Ok(Role::AccountManager { linked })
    }

    /// Handle a successful provider login.
    ///
    /// Fails without touching the store when no email can be derived.
    pub fn sign_in(&self, assertion: &IdentityAssertion) -> Result<Principal, SignInError> {
        let Some(email) = assertion.derived_email() else {
            log::warn!("Sign in failed: no email provided by identity profile");
            return Err(SignInError::MissingEmail);
        };

        let role = self.resolve_role(&email)?;
        let mut principal = Principal {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: assertion.name.clone().unwrap_or_default(),
            email,
            role,
        };
        principal.id = self.store.upsert_principal(&principal)?;

        log::info!(
            "Signed in {} as {} (linked: {:?})",
            principal.email,
            principal.role.label(),
            principal.role.linked_entity()
        );
        Ok(principal)
    }

    /// Re-read role, link and name from the store.
    ///
    /// `current_name` is the name the session already carries; it is kept
    /// when the store has none. A missing principal falls back to an
    /// unlinked account manager. A stored role label that decodes to
    /// neither role is `Forbidden`.
    pub fn refresh_session(
        &self,
        email: &str,
        current_name: Option<&str>,
    ) -> Result<SessionClaims, AccessError> {
        let email = email.trim().to_lowercase();
        let current_name = current_name.map(str::to_string);
        let Some(stored) = self.store.find_principal(&email)? else {
            log::debug!("No principal for {email}; defaulting to unlinked account manager");
            return Ok(SessionClaims {
                email,
                display_name: current_name,
                role: Role::AccountManager { linked: None },
            });
        };

        let Some(role) = Role::from_stored(&stored.role_label, stored.am_id) else {
            log::error!(
                "Principal {} has unrecognised role '{}'",
                stored.email,
                stored.role_label
            );
            return Err(AccessError::Forbidden {
                role: stored.role_label,
            });
        };

        Ok(SessionClaims {
            email: stored.email,
            display_name: Some(stored.display_name)
                .filter(|name| !name.trim().is_empty())
                .or(current_name),
            role,
        })
    }

    /// Refresh and materialize the principal a request runs as.
    pub fn materialize(&self, email: &str) -> Result<Principal, AccessError> {
        let claims = self.refresh_session(email, None)?;
        let id = self.store.find_principal(&claims.email)?.map(|p| p.id);
        Ok(claims.into_principal(id))
    }
}
