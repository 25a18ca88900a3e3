//! Demo data: a fixed roster of account managers with a few months of
//! reproducible figures.

use crate::{
    error::DashResult,
    metrics::MetricValues,
    month::Month,
    rng::SeedRng,
    store::DashStore,
};

pub const DEMO_ROSTER: [&str; 7] = [
    "Andrea", "Mitchell", "Tara", "Kimberly", "Daniel", "Robert", "Divit",
];

pub const DEMO_EMAIL_DOMAIN: &str = "benchmark.com";

pub fn demo_email(name: &str) -> String {
    format!("{}@{DEMO_EMAIL_DOMAIN}", name.to_lowercase())
}

/// `count` consecutive months ending at `last`, ascending.
pub fn trailing_months(last: Month, count: usize) -> Vec<Month> {
    let mut months = Vec::with_capacity(count);
    let mut current = last;
    for _ in 0..count {
        months.push(current);
        current = current.pred();
    }
    months.reverse();
    months
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Figures for one account manager-month.
pub fn demo_values(rng: &mut SeedRng) -> MetricValues {
    MetricValues {
        net_retention_pct: round2(rng.uniform(92.0, 4.0)),
        gross_retention_pct: round2(rng.uniform(95.0, 3.0)),
        renewal_premium: rng.uniform(50_000.0, 20_000.0).round(),
        lost_premium: rng.uniform(5_000.0, 5_000.0).round(),
        new_biz_premium: rng.uniform(15_000.0, 7_000.0).round(),
        policy_count_start: rng.below(120, 30),
        policy_count_end: rng.below(120, 30),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub account_managers: usize,
    pub rows: usize,
}

/// Upsert the demo roster and its metrics. Re-running with the same seed
/// rewrites the same values.
pub fn seed_demo_data(
    store: &DashStore,
    seed: u64,
    last_month: Month,
    month_count: usize,
) -> DashResult<SeedSummary> {
    let months = trailing_months(last_month, month_count);
    let mut rows = 0;
    for (index, name) in DEMO_ROSTER.iter().enumerate() {
        let am_id = store.upsert_account_manager(name, &demo_email(name))?;
        let mut rng = SeedRng::for_stream(seed, index as u64);
        for month in &months {
            store.upsert_metric_row(am_id, *month, &demo_values(&mut rng))?;
            rows += 1;
        }
    }
    log::info!(
        "Seeded {} account managers, {rows} metric rows ({} months ending {last_month})",
        DEMO_ROSTER.len(),
        months.len()
    );
    Ok(SeedSummary {
        account_managers: DEMO_ROSTER.len(),
        rows,
    })
}
