//! Aggregation engine: per-entity latest snapshots, month-over-month deltas,
//! and the combined snapshot across several account managers.
//!
//! The combined snapshot only looks at each entity's own latest row.
//! Rates are averaged, currency and counts are summed. Its month label is
//! the first entity's latest month; entities whose latest months differ are
//! combined as-is.

use crate::{
    metrics::MetricRow,
    month::Month,
    types::AccountManagerId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time figures for one entity or a combination of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub month: Month,
    pub net_retention_pct: f64,
    pub gross_retention_pct: f64,
    pub renewal_premium: f64,
    pub lost_premium: f64,
    pub new_biz_premium: f64,
    pub policy_count_start: i64,
    pub policy_count_end: i64,
}

impl From<&MetricRow> for MetricSnapshot {
    fn from(row: &MetricRow) -> Self {
        Self {
            month: row.month,
            net_retention_pct: row.net_retention_pct,
            gross_retention_pct: row.gross_retention_pct,
            renewal_premium: row.renewal_premium,
            lost_premium: row.lost_premium,
            new_biz_premium: row.new_biz_premium,
            policy_count_start: row.policy_count_start,
            policy_count_end: row.policy_count_end,
        }
    }
}

/// Every reported metric, for polarity lookups and indicator rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    NetRetentionPct,
    GrossRetentionPct,
    RenewalPremium,
    LostPremium,
    NewBizPremium,
    PolicyCountStart,
    PolicyCountEnd,
}

/// Which direction of change is good news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl MetricField {
    pub const ALL: [MetricField; 7] = [
        MetricField::NetRetentionPct,
        MetricField::GrossRetentionPct,
        MetricField::RenewalPremium,
        MetricField::LostPremium,
        MetricField::NewBizPremium,
        MetricField::PolicyCountStart,
        MetricField::PolicyCountEnd,
    ];

    pub fn polarity(self) -> Polarity {
        match self {
            MetricField::LostPremium => Polarity::LowerIsBetter,
            _ => Polarity::HigherIsBetter,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricField::NetRetentionPct => "Net Retention",
            MetricField::GrossRetentionPct => "Gross Retention",
            MetricField::RenewalPremium => "Renewal Premium",
            MetricField::LostPremium => "Lost Premium",
            MetricField::NewBizPremium => "New Biz Premium",
            MetricField::PolicyCountStart => "Policy Count (start)",
            MetricField::PolicyCountEnd => "Policy Count (end)",
        }
    }
}

/// Latest minus the chronologically preceding row, per field.
///
/// Policy counts saturate at the `i64` bounds instead of overflowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub net_retention_pct: f64,
    pub gross_retention_pct: f64,
    pub renewal_premium: f64,
    pub lost_premium: f64,
    pub new_biz_premium: f64,
    pub policy_count_start: i64,
    pub policy_count_end: i64,
}

impl MetricDelta {
    pub fn between(previous: &MetricRow, latest: &MetricRow) -> Self {
        Self {
            net_retention_pct: latest.net_retention_pct - previous.net_retention_pct,
            gross_retention_pct: latest.gross_retention_pct - previous.gross_retention_pct,
            renewal_premium: latest.renewal_premium - previous.renewal_premium,
            lost_premium: latest.lost_premium - previous.lost_premium,
            new_biz_premium: latest.new_biz_premium - previous.new_biz_premium,
            policy_count_start: latest
                .policy_count_start
                .saturating_sub(previous.policy_count_start),
            policy_count_end: latest.policy_count_end.saturating_sub(previous.policy_count_end),
        }
    }

    pub fn value(&self, field: MetricField) -> f64 {
        match field {
            MetricField::NetRetentionPct => self.net_retention_pct,
            MetricField::GrossRetentionPct => self.gross_retention_pct,
            MetricField::RenewalPremium => self.renewal_premium,
            MetricField::LostPremium => self.lost_premium,
            MetricField::NewBizPremium => self.new_biz_premium,
            MetricField::PolicyCountStart => self.policy_count_start as f64,
            MetricField::PolicyCountEnd => self.policy_count_end as f64,
        }
    }

    /// "vs prior month" indicators, one per field.
    pub fn indicators(&self) -> Vec<DeltaIndicator> {
        MetricField::ALL
            .iter()
            .map(|&field| DeltaIndicator::new(field, self.value(field)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaIndicator {
    pub field: MetricField,
    pub value: f64,
    pub favorable: bool,
}

impl DeltaIndicator {
    /// Zero counts as a non-negative move.
    pub fn new(field: MetricField, value: f64) -> Self {
        let non_negative = value >= 0.0;
        let favorable = match field.polarity() {
            Polarity::HigherIsBetter => non_negative,
            Polarity::LowerIsBetter => !non_negative,
        };
        Self {
            field,
            value,
            favorable,
        }
    }
}

/// One entity's view after range filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub account_manager_id: AccountManagerId,
    /// Rows with data, after filtering.
    pub months: usize,
    pub latest: MetricSnapshot,
    /// Present only when at least two rows remain.
    pub delta: Option<MetricDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Ascending by account manager id.
    pub entities: Vec<EntitySummary>,
    /// Absent when nothing is in scope.
    pub combined: Option<MetricSnapshot>,
}

/// Group rows per entity (ascending id), each chronologically ordered.
pub fn group_by_entity(rows: &[MetricRow]) -> BTreeMap<AccountManagerId, Vec<&MetricRow>> {
    let mut grouped: BTreeMap<AccountManagerId, Vec<&MetricRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.account_manager_id).or_default().push(row);
    }
    for entity_rows in grouped.values_mut() {
        entity_rows.sort_by_key(|row| row.month);
    }
    grouped
}

pub fn summarize_entity(
    account_manager_id: AccountManagerId,
    rows: &[&MetricRow],
) -> Option<EntitySummary> {
    let (latest, earlier) = rows.split_last()?;
    let delta = earlier
        .last()
        .map(|previous| MetricDelta::between(previous, latest));
    Some(EntitySummary {
        account_manager_id,
        months: rows.len(),
        latest: MetricSnapshot::from(*latest),
        delta,
    })
}

/// Combine each entity's latest snapshot. Count sums saturate.
pub fn combine_latest(latest: &[MetricSnapshot]) -> Option<MetricSnapshot> {
    let (first, rest) = latest.split_first()?;
    if rest.is_empty() {
        return Some(first.clone());
    }

    let n = latest.len() as f64;
    let sum_f = |f: fn(&MetricSnapshot) -> f64| latest.iter().map(f).sum::<f64>();
    let sum_i = |f: fn(&MetricSnapshot) -> i64| {
        latest.iter().map(f).fold(0i64, i64::saturating_add)
    };

    Some(MetricSnapshot {
        month: first.month,
        net_retention_pct: sum_f(|s| s.net_retention_pct) / n,
        gross_retention_pct: sum_f(|s| s.gross_retention_pct) / n,
        renewal_premium: sum_f(|s| s.renewal_premium),
        lost_premium: sum_f(|s| s.lost_premium),
        new_biz_premium: sum_f(|s| s.new_biz_premium),
        policy_count_start: sum_i(|s| s.policy_count_start),
        policy_count_end: sum_i(|s| s.policy_count_end),
    })
}

/// Full aggregation over already scoped and range-filtered rows.
pub fn aggregate(rows: &[MetricRow]) -> Aggregation {
    let entities: Vec<EntitySummary> = group_by_entity(rows)
        .into_iter()
        .filter_map(|(id, entity_rows)| summarize_entity(id, &entity_rows))
        .collect();
    let latest: Vec<MetricSnapshot> = entities.iter().map(|e| e.latest.clone()).collect();
    Aggregation {
        combined: combine_latest(&latest),
        entities,
    }
}

/// One point of the single-entity retention chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPoint {
    pub month: Month,
    pub net_retention_pct: f64,
    pub gross_retention_pct: f64,
}

pub fn retention_series(rows: &[MetricRow]) -> Vec<RetentionPoint> {
    let mut points: Vec<RetentionPoint> = rows
        .iter()
        .map(|row| RetentionPoint {
            month: row.month,
            net_retention_pct: row.net_retention_pct,
            gross_retention_pct: row.gross_retention_pct,
        })
        .collect();
    points.sort_by_key(|p| p.month);
    points
}

/// Net and gross retention of one entity in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRetention {
    pub account_manager_id: AccountManagerId,
    pub net_retention_pct: f64,
    pub gross_retention_pct: f64,
}

/// One point of the comparison chart: every entity with data that month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub month: Month,
    pub entities: Vec<EntityRetention>,
}

/// Distinct months ascending; within a month, entities ascending by id.
pub fn comparison_series(rows: &[MetricRow]) -> Vec<ComparisonPoint> {
    let mut by_month: BTreeMap<Month, BTreeMap<AccountManagerId, EntityRetention>> =
        BTreeMap::new();
    for row in rows {
        by_month.entry(row.month).or_default().insert(
            row.account_manager_id,
            EntityRetention {
                account_manager_id: row.account_manager_id,
                net_retention_pct: row.net_retention_pct,
                gross_retention_pct: row.gross_retention_pct,
            },
        );
    }
    by_month
        .into_iter()
        .map(|(month, entities)| ComparisonPoint {
            month,
            entities: entities.into_values().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(month: &str, net: f64) -> MetricSnapshot {
        MetricSnapshot {
            month: month.parse().unwrap(),
            net_retention_pct: net,
            gross_retention_pct: net,
            renewal_premium: 1.0,
            lost_premium: 1.0,
            new_biz_premium: 1.0,
            policy_count_start: 1,
            policy_count_end: 1,
        }
    }

    #[test]
    fn combine_of_nothing_is_absent() {
        assert_eq!(combine_latest(&[]), None);
    }

    #[test]
    fn combined_label_comes_from_first_entity_even_when_months_diverge() {
        let combined =
            combine_latest(&[snapshot("2025-11", 90.0), snapshot("2025-12", 96.0)]).unwrap();
        assert_eq!(combined.month.to_string(), "2025-11");
        assert_eq!(combined.net_retention_pct, 93.0);
        assert_eq!(combined.policy_count_end, 2);
    }

    #[test]
    fn lost_premium_rising_is_unfavorable() {
        assert!(!DeltaIndicator::new(MetricField::LostPremium, 100.0).favorable);
        assert!(DeltaIndicator::new(MetricField::LostPremium, -100.0).favorable);
        assert!(DeltaIndicator::new(MetricField::NetRetentionPct, 0.5).favorable);
        assert!(!DeltaIndicator::new(MetricField::RenewalPremium, -1.0).favorable);
    }
}
