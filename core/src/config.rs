//! Dashboard configuration and the management allow-list.
//!
//! The allow-list is not compiled in: it is read from
//! `{data_dir}/dashboard.json` and can be reloaded while running.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::RwLock;

pub const CONFIG_FILE: &str = "dashboard.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    /// SQLite path, or `:memory:`.
    #[serde(default = "default_database")]
    pub database: String,
    /// Emails that sign in with the management role.
    #[serde(default)]
    pub management_emails: Vec<String>,
}

fn default_database() -> String {
    "dashboard.db".to_string()
}

impl DashConfig {
    /// Load from the data/ directory.
    /// In tests, use DashConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/{CONFIG_FILE}");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    pub fn default_test() -> Self {
        Self {
            database: ":memory:".into(),
            management_emails: vec![
                "maggie.manager@example.com".into(),
                "oscar.management@example.com".into(),
            ],
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shared, reloadable set of management emails.
///
/// Entries are stored trimmed and lowercased; lookups normalize the probe
/// the same way, so matching is exact but case-insensitive.
#[derive(Debug, Default)]
pub struct ManagementAllowList {
    emails: RwLock<BTreeSet<String>>,
}

impl ManagementAllowList {
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = Self::default();
        list.replace(emails);
        list
    }

    pub fn from_config(config: &DashConfig) -> Self {
        Self::from_emails(&config.management_emails)
    }

    /// Re-read the config file and swap the whole set. On error the
    /// current set is left untouched.
    pub fn reload(&self, data_dir: &str) -> anyhow::Result<usize> {
        let config = DashConfig::load(data_dir)?;
        let count = self.replace(&config.management_emails);
        log::info!("Management allow-list reloaded: {count} entries");
        Ok(count)
    }

    /// Replace the set wholesale. Blank entries are dropped.
    pub fn replace<I, S>(&self, emails: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let next: BTreeSet<String> = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        let count = next.len();
        match self.emails.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        count
    }

    pub fn contains(&self, email: &str) -> bool {
        let probe = normalize_email(email);
        match self.emails.read() {
            Ok(guard) => guard.contains(&probe),
            Err(poisoned) => poisoned.into_inner().contains(&probe),
        }
    }

    pub fn len(&self) -> usize {
        match self.emails.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_matches_case_insensitively() {
        let list = ManagementAllowList::from_emails(["  Vik@Example.com ", ""]);
        assert_eq!(list.len(), 1);
        assert!(list.contains("vik@example.com"));
        assert!(list.contains("VIK@EXAMPLE.COM"));
        assert!(!list.contains("vik@example.co"));
    }

    #[test]
    fn replace_swaps_the_whole_set() {
        let list = ManagementAllowList::from_emails(["a@example.com"]);
        list.replace(["b@example.com", "c@example.com"]);
        assert!(!list.contains("a@example.com"));
        assert!(list.contains("c@example.com"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_config_allow_lists_management() {
        let list = ManagementAllowList::from_config(&DashConfig::default_test());
        assert!(list.contains("Maggie.Manager@example.com"));
        assert!(!list.is_empty());
    }

    #[test]
    fn config_parses_with_defaults() {
        let config: DashConfig =
            serde_json::from_str(r#"{ "management_emails": ["x@example.com"] }"#).unwrap();
        assert_eq!(config.database, "dashboard.db");
        assert_eq!(config.management_emails, vec!["x@example.com".to_string()]);
    }
}
