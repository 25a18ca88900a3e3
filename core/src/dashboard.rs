//! Dashboard service: the entry points the presentation layer calls.
//!
//! Every call authorizes first, then runs one scoped store query, then
//! aggregates. Nothing is kept between calls.

use crate::{
    aggregation::{
        aggregate, comparison_series, retention_series, Aggregation, ComparisonPoint,
        DeltaIndicator, EntitySummary, MetricSnapshot, RetentionPoint,
    },
    error::AccessError,
    metrics::{AccountManager, MetricRow},
    month::{Month, MonthRange},
    policy::{AccessPolicy, RequestedScope},
    principal::{Principal, Role},
    store::DashStore,
    types::AccountManagerId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub scope: RequestedScope,
    #[serde(default)]
    pub range: MonthRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub rows: Vec<MetricRow>,
}

/// Where a principal lands after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardRoute {
    SignIn,
    Management,
    AccountManager,
}

pub fn home_route(principal: Option<&Principal>) -> DashboardRoute {
    match principal.map(|p| p.role) {
        None => DashboardRoute::SignIn,
        Some(Role::Manager) => DashboardRoute::Management,
        Some(Role::AccountManager { .. }) => DashboardRoute::AccountManager,
    }
}

/// Single-entity view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountManagerView {
    pub account_manager: Option<AccountManager>,
    pub rows: Vec<MetricRow>,
    /// Every month with data, ignoring the range (for the picker).
    pub available_months: Vec<Month>,
    /// Months with data before range filtering.
    pub total_months: usize,
    pub latest: Option<MetricSnapshot>,
    pub indicators: Vec<DeltaIndicator>,
    pub retention: Vec<RetentionPoint>,
}

/// Multi-entity comparison view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagementView {
    /// Active account managers for the selector, by name.
    pub account_managers: Vec<AccountManager>,
    /// Valid selections, in the order they were requested.
    pub selected_names: Vec<String>,
    pub rows: Vec<MetricRow>,
    pub available_months: Vec<Month>,
    pub entities: Vec<EntitySummary>,
    pub combined: Option<MetricSnapshot>,
    pub comparison: Vec<ComparisonPoint>,
}

pub struct Dashboard<'a> {
    store: &'a DashStore,
    policy: AccessPolicy<'a>,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a DashStore) -> Self {
        Self {
            store,
            policy: AccessPolicy::new(store),
        }
    }

    /// Scoped, range-filtered rows, month ascending then id ascending.
    pub fn get_metrics(
        &self,
        principal: Option<&Principal>,
        query: &MetricsQuery,
    ) -> Result<MetricsResponse, AccessError> {
        let scope = self.policy.authorize(principal, &query.scope, query.range)?;
        let rows = self.store.query_rows(&scope.entity_ids, &scope.range)?;
        Ok(MetricsResponse { rows })
    }

    /// Rows plus their aggregation, for callers that want both.
    pub fn aggregate_metrics(
        &self,
        principal: Option<&Principal>,
        query: &MetricsQuery,
    ) -> Result<(MetricsResponse, Aggregation), AccessError> {
        let response = self.get_metrics(principal, query)?;
        let aggregation = aggregate(&response.rows);
        Ok((response, aggregation))
    }

    /// Account managers always see themselves. A manager may name one
    /// account manager or none (an empty view).
    pub fn account_manager_view(
        &self,
        principal: Option<&Principal>,
        selected: Option<AccountManagerId>,
        range: MonthRange,
    ) -> Result<AccountManagerView, AccessError> {
        let requested = selected.map_or(RequestedScope::None, RequestedScope::Single);
        let scope = self.policy.authorize(principal, &requested, range)?;
        let Some(&id) = scope.entity_ids.first() else {
            return Ok(AccountManagerView::default());
        };

        let rows = self.store.query_rows(&scope.entity_ids, &scope.range)?;
        let available_months = self.store.available_months(&scope.entity_ids)?;
        let aggregation = aggregate(&rows);
        let summary = aggregation.entities.into_iter().next();

        Ok(AccountManagerView {
            account_manager: self.store.find_account_manager(id)?,
            total_months: available_months.len(),
            available_months,
            latest: summary.as_ref().map(|s| s.latest.clone()),
            indicators: summary
                .and_then(|s| s.delta)
                .map(|d| d.indicators())
                .unwrap_or_default(),
            retention: retention_series(&rows),
            rows,
        })
    }

    /// Management only.
    pub fn management_view(
        &self,
        principal: Option<&Principal>,
        selected: &[AccountManagerId],
        range: MonthRange,
    ) -> Result<ManagementView, AccessError> {
        let Some(caller) = principal else {
            return Err(AccessError::Unauthenticated);
        };
        if !caller.role.is_manager() {
            return Err(AccessError::ManagementOnly);
        }

        let requested = RequestedScope::Many(selected.to_vec());
        let scope = self.policy.authorize(principal, &requested, range)?;
        let account_managers = self.store.active_account_managers()?;
        // Request order, first occurrence wins.
        let mut seen = BTreeSet::new();
        let selected_names = selected
            .iter()
            .filter(|&&id| scope.contains(id) && seen.insert(id))
            .filter_map(|&id| account_managers.iter().find(|am| am.id == id))
            .map(|am| am.name.clone())
            .collect();

        let rows = self.store.query_rows(&scope.entity_ids, &scope.range)?;
        let available_months = self.store.available_months(&scope.entity_ids)?;
        let Aggregation { entities, combined } = aggregate(&rows);

        Ok(ManagementView {
            account_managers,
            selected_names,
            available_months,
            entities,
            combined,
            comparison: comparison_series(&rows),
            rows,
        })
    }
}
