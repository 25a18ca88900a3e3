//! Batch import of monthly metrics.
//!
//! Input is a JSON array of records keyed by account manager email and
//! month. Each record is upserted by (account manager, month), so re-running
//! an import never duplicates rows. Missing figures default to zero.

use crate::{
    error::DashResult,
    metrics::MetricValues,
    month::Month,
    store::DashStore,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    #[serde(alias = "email", alias = "amEmail")]
    pub account_manager_email: String,
    #[serde(default)]
    pub month: String,
    #[serde(flatten)]
    pub values: MetricValues,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub fn parse_records(json: &str) -> DashResult<Vec<ImportRecord>> {
    Ok(serde_json::from_str(json)?)
}

pub fn import_records(store: &DashStore, records: &[ImportRecord]) -> DashResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    for record in records {
        let email = record.account_manager_email.trim().to_lowercase();
        if email.is_empty() || record.month.trim().is_empty() {
            summary.skipped += 1;
            continue;
        }
        let month: Month = match record.month.parse() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping row for {email}: {e}");
                summary.skipped += 1;
                continue;
            }
        };
        let Some(am) = store.find_account_manager_by_email(&email)? else {
            log::warn!("Skipping row for unknown account manager {email} ({month})");
            summary.skipped += 1;
            continue;
        };
        store.upsert_metric_row(am.id, month, &record.values)?;
        summary.imported += 1;
    }
    log::info!(
        "Imported {} rows, skipped {}",
        summary.imported,
        summary.skipped
    );
    Ok(summary)
}

pub fn import_file(store: &DashStore, path: &str) -> DashResult<ImportSummary> {
    let content = std::fs::read_to_string(path)?;
    import_records(store, &parse_records(&content)?)
}
