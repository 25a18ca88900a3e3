//! Aggregation engine tests.
//!
//! Cover: singleton pass-through, mean/sum combination, delta presence and
//! arithmetic, and the per-entity grouping order.

use amdash_core::{
    aggregation::{aggregate, comparison_series, MetricField, MetricSnapshot},
    metrics::MetricRow,
    types::AccountManagerId,
};

fn row(id: AccountManagerId, month: &str, net: f64) -> MetricRow {
    MetricRow {
        id: format!("{id}-{month}"),
        account_manager_id: id,
        month: month.parse().expect("valid month"),
        net_retention_pct: net,
        gross_retention_pct: 96.0,
        renewal_premium: 60_000.0,
        lost_premium: 7_500.0,
        new_biz_premium: 18_000.0,
        policy_count_start: 130,
        policy_count_end: 134,
    }
}

#[test]
fn nothing_in_scope_has_no_combined_snapshot() {
    let agg = aggregate(&[]);
    assert!(agg.entities.is_empty());
    assert!(agg.combined.is_none());
}

/// A single entity's combined snapshot is its latest row, field for field.
#[test]
fn singleton_combined_equals_latest_row() {
    let mut latest = row(4, "2025-12", 93.37);
    latest.gross_retention_pct = 97.11;
    latest.renewal_premium = 61_234.0;
    latest.lost_premium = 9_876.0;
    latest.new_biz_premium = 21_000.0;
    latest.policy_count_start = 141;
    latest.policy_count_end = 139;
    let rows = vec![row(4, "2025-10", 92.0), row(4, "2025-11", 94.0), latest.clone()];

    let combined = aggregate(&rows).combined.expect("combined snapshot");
    assert_eq!(combined, MetricSnapshot::from(&latest));
    assert_eq!(combined.net_retention_pct.to_bits(), latest.net_retention_pct.to_bits());
}

#[test]
fn two_entities_average_net_retention() {
    let rows = vec![row(1, "2025-12", 93.0), row(2, "2025-12", 95.0)];
    let combined = aggregate(&rows).combined.unwrap();
    assert_eq!(combined.net_retention_pct, 94.0);
}

/// Rates are means, currency and counts are sums, over latest rows only.
#[test]
fn combined_uses_mean_for_rates_and_sum_for_amounts() {
    let mut a = row(1, "2025-12", 92.0);
    a.gross_retention_pct = 95.0;
    a.renewal_premium = 50_000.0;
    a.lost_premium = 5_000.0;
    a.new_biz_premium = 15_000.0;
    a.policy_count_start = 120;
    a.policy_count_end = 121;

    let mut b = row(2, "2025-12", 94.0);
    b.gross_retention_pct = 97.0;
    b.renewal_premium = 60_000.0;
    b.lost_premium = 6_000.0;
    b.new_biz_premium = 16_000.0;
    b.policy_count_start = 130;
    b.policy_count_end = 128;

    let mut c = row(3, "2025-12", 99.0);
    c.gross_retention_pct = 99.0;
    c.renewal_premium = 70_000.0;
    c.lost_premium = 7_000.0;
    c.new_biz_premium = 17_000.0;
    c.policy_count_start = 140;
    c.policy_count_end = 141;

    // An older row for entity 1 must not leak into the combination.
    let stale = row(1, "2025-11", 10.0);
    let rows = vec![stale, a, b, c];

    let combined = aggregate(&rows).combined.unwrap();
    assert_eq!(combined.month.to_string(), "2025-12");
    assert_eq!(combined.net_retention_pct, (92.0 + 94.0 + 99.0) / 3.0);
    assert_eq!(combined.gross_retention_pct, (95.0 + 97.0 + 99.0) / 3.0);
    assert_eq!(combined.renewal_premium, 180_000.0);
    assert_eq!(combined.lost_premium, 18_000.0);
    assert_eq!(combined.new_biz_premium, 48_000.0);
    assert_eq!(combined.policy_count_start, 390);
    assert_eq!(combined.policy_count_end, 390);
}

#[test]
fn single_row_has_no_delta() {
    let agg = aggregate(&[row(9, "2025-12", 93.0)]);
    assert_eq!(agg.entities.len(), 1);
    assert!(agg.entities[0].delta.is_none());
}

#[test]
fn delta_is_latest_minus_previous() {
    let mut previous = row(5, "2025-11", 92.5);
    previous.lost_premium = 8_000.0;
    previous.policy_count_end = 130;
    let mut latest = row(5, "2025-12", 94.0);
    latest.lost_premium = 9_500.0;
    latest.policy_count_end = 127;

    // Feed out of order; grouping sorts chronologically.
    let rows = vec![latest.clone(), row(5, "2025-10", 50.0), previous];
    let summary = &aggregate(&rows).entities[0];
    assert_eq!(summary.months, 3);
    assert_eq!(summary.latest.month.to_string(), "2025-12");

    let delta = summary.delta.as_ref().expect("delta with 3 rows");
    assert_eq!(delta.net_retention_pct, 1.5);
    assert_eq!(delta.lost_premium, 1_500.0);
    assert_eq!(delta.policy_count_end, -3);
    assert_eq!(delta.renewal_premium, 0.0);

    let lost = delta
        .indicators()
        .into_iter()
        .find(|i| i.field == MetricField::LostPremium)
        .unwrap();
    assert!(!lost.favorable, "Rising lost premium is bad news");
    let net = delta
        .indicators()
        .into_iter()
        .find(|i| i.field == MetricField::NetRetentionPct)
        .unwrap();
    assert!(net.favorable);
}

#[test]
fn entities_are_summarized_in_ascending_id_order() {
    let rows = vec![
        row(8, "2025-12", 90.0),
        row(3, "2025-12", 91.0),
        row(5, "2025-11", 92.0),
    ];
    let ids: Vec<AccountManagerId> = aggregate(&rows)
        .entities
        .iter()
        .map(|e| e.account_manager_id)
        .collect();
    assert_eq!(ids, vec![3, 5, 8]);
}

/// The combined label follows the first entity even if latest months differ.
#[test]
fn divergent_latest_months_are_not_realigned() {
    let rows = vec![row(1, "2025-11", 90.0), row(2, "2025-12", 92.0)];
    let combined = aggregate(&rows).combined.unwrap();
    assert_eq!(combined.month.to_string(), "2025-11");
    assert_eq!(combined.net_retention_pct, 91.0);
}

#[test]
fn comparison_series_has_one_point_per_month() {
    let rows = vec![
        row(1, "2025-10", 90.0),
        row(2, "2025-10", 91.0),
        row(2, "2025-11", 92.0),
    ];
    let series = comparison_series(&rows);
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].entities.len(), 2);
    assert_eq!(series[1].entities.len(), 1);
    assert_eq!(series[1].entities[0].account_manager_id, 2);
}

#[test]
fn huge_policy_counts_saturate_instead_of_overflowing() {
    let mut a = row(1, "2025-12", 90.0);
    a.policy_count_end = i64::MAX;
    let mut b = row(2, "2025-12", 92.0);
    b.policy_count_end = i64::MAX;
    let combined = aggregate(&[a, b]).combined.unwrap();
    assert_eq!(combined.policy_count_end, i64::MAX);

    let mut previous = row(3, "2025-11", 90.0);
    previous.policy_count_start = i64::MIN;
    let mut latest = row(3, "2025-12", 90.0);
    latest.policy_count_start = i64::MAX;
    let agg = aggregate(&[previous, latest]);
    let delta = agg.entities[0].delta.as_ref().unwrap();
    assert_eq!(delta.policy_count_start, i64::MAX);
}
