//! Access policy: which account managers a request may read.
//!
//! Rules, in order:
//!   1. No principal                → Unauthenticated
//!   2. Account manager             → own linked entity only; the requested
//!                                    scope is ignored. No link → NotLinked.
//!   3. Manager, single id          → must exist and be active, else EntityNotFound
//!      Manager, several ids        → invalid ids dropped, the rest proceed
//!      Manager, nothing valid      → empty scope (not an error)
//!
//! An unknown role cannot reach this module: `Role` has exactly two
//! variants and undecodable stored roles are rejected at session refresh.

use crate::{
    error::AccessError,
    month::MonthRange,
    principal::{Principal, Role},
    store::DashStore,
    types::AccountManagerId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the caller asked to see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "ids", rename_all = "snake_case")]
pub enum RequestedScope {
    #[default]
    None,
    Single(AccountManagerId),
    Many(Vec<AccountManagerId>),
}

impl RequestedScope {
    /// Parse a comma-separated selector such as `"1, 2,3"`.
    /// Non-numeric and non-positive entries are skipped.
    pub fn parse_ids(raw: &str) -> Self {
        let ids: Vec<AccountManagerId> = raw
            .split(',')
            .filter_map(|part| part.trim().parse::<AccountManagerId>().ok())
            .filter(|id| *id > 0)
            .collect();
        RequestedScope::Many(ids)
    }

    /// A single-entity id wins over a list; neither means no selection.
    pub fn from_params(single: Option<&str>, many: Option<&str>) -> Self {
        if let Some(id) = single.and_then(|raw| raw.trim().parse::<AccountManagerId>().ok()) {
            return RequestedScope::Single(id);
        }
        many.map_or(RequestedScope::None, Self::parse_ids)
    }
}

/// The scope a request was authorized for. Computed per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRequest {
    /// Ascending, de-duplicated.
    pub entity_ids: Vec<AccountManagerId>,
    pub range: MonthRange,
}

impl ScopeRequest {
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }

    pub fn contains(&self, id: AccountManagerId) -> bool {
        self.entity_ids.binary_search(&id).is_ok()
    }
}

pub struct AccessPolicy<'a> {
    store: &'a DashStore,
}

impl<'a> AccessPolicy<'a> {
    pub fn new(store: &'a DashStore) -> Self {
        Self { store }
    }

    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        requested: &RequestedScope,
        range: MonthRange,
    ) -> Result<ScopeRequest, AccessError> {
        let Some(principal) = principal else {
            return Err(AccessError::Unauthenticated);
        };

        let entity_ids = match principal.role {
            Role::AccountManager { linked: None } => {
                log::warn!("{} is not linked to an account manager", principal.email);
                return Err(AccessError::NotLinked);
            }
            Role::AccountManager { linked: Some(own) } => {
                if !matches!(requested, RequestedScope::None)
                    && *requested != RequestedScope::Single(own)
                {
                    log::debug!(
                        "Ignoring requested scope {requested:?} for account manager {}",
                        principal.email
                    );
                }
                vec![own]
            }
            Role::Manager => self.manager_scope(requested)?,
        };

        Ok(ScopeRequest { entity_ids, range })
    }

    fn manager_scope(
        &self,
        requested: &RequestedScope,
    ) -> Result<Vec<AccountManagerId>, AccessError> {
        match requested {
            RequestedScope::None => Ok(Vec::new()),
            RequestedScope::Single(id) => {
                if self.is_active(*id)? {
                    Ok(vec![*id])
                } else {
                    log::warn!("Account manager {id} not found or inactive");
                    Err(AccessError::EntityNotFound { id: *id })
                }
            }
            RequestedScope::Many(ids) => {
                let unique: BTreeSet<AccountManagerId> = ids.iter().copied().collect();
                let mut valid = Vec::with_capacity(unique.len());
                for id in unique {
                    if self.is_active(id)? {
                        valid.push(id);
                    } else {
                        log::debug!("Dropping unknown or inactive account manager {id}");
                    }
                }
                Ok(valid)
            }
        }
    }

    fn is_active(&self, id: AccountManagerId) -> Result<bool, AccessError> {
        Ok(self
            .store
            .find_account_manager(id)?
            .is_some_and(|am| am.active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_keeps_positive_integers_only() {
        assert_eq!(
            RequestedScope::parse_ids(" 1, 2,x,-3,0,,4 "),
            RequestedScope::Many(vec![1, 2, 4])
        );
        assert_eq!(RequestedScope::parse_ids(""), RequestedScope::Many(vec![]));
    }

    #[test]
    fn single_id_param_takes_precedence() {
        assert_eq!(
            RequestedScope::from_params(Some(" 7 "), Some("1,2")),
            RequestedScope::Single(7)
        );
        assert_eq!(
            RequestedScope::from_params(Some("x"), Some("1,2")),
            RequestedScope::Many(vec![1, 2])
        );
        assert_eq!(RequestedScope::from_params(None, None), RequestedScope::None);
    }
}
