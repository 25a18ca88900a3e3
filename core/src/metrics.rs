//! Account managers and their monthly metric rows.

use crate::{
    month::Month,
    types::{AccountManagerId, MetricRowId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountManager {
    pub id: AccountManagerId,
    pub name: String,
    pub email: String,
    pub active: bool,
}

/// One account manager's figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub id: MetricRowId,
    pub account_manager_id: AccountManagerId,
    pub month: Month,
    pub net_retention_pct: f64,
    pub gross_retention_pct: f64,
    pub renewal_premium: f64,
    pub lost_premium: f64,
    pub new_biz_premium: f64,
    pub policy_count_start: i64,
    pub policy_count_end: i64,
}

/// The values an upsert writes for a (account manager, month) key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    #[serde(default, alias = "netRetention")]
    pub net_retention_pct: f64,
    #[serde(default, alias = "grossRetention")]
    pub gross_retention_pct: f64,
    #[serde(default, alias = "renewalPremium")]
    pub renewal_premium: f64,
    #[serde(default, alias = "lostPremium")]
    pub lost_premium: f64,
    #[serde(default, alias = "newBizPremium")]
    pub new_biz_premium: f64,
    #[serde(default, alias = "policyCountStart")]
    pub policy_count_start: i64,
    #[serde(default, alias = "policyCountEnd")]
    pub policy_count_end: i64,
}

impl MetricRow {
    pub fn values(&self) -> MetricValues {
        MetricValues {
            net_retention_pct: self.net_retention_pct,
            gross_retention_pct: self.gross_retention_pct,
            renewal_premium: self.renewal_premium,
            lost_premium: self.lost_premium,
            new_biz_premium: self.new_biz_premium,
            policy_count_start: self.policy_count_start,
            policy_count_end: self.policy_count_end,
        }
    }
}
