//! Canonical month-precision date.
//!
//! Every month comparison in the crate goes through `Month`. It is persisted
//! as zero-padded `YYYY-MM`, so SQL text comparison and `Ord` agree.

use crate::error::{DashError, DashResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> DashResult<Self> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(DashError::InvalidMonth {
                value: format!("{year}-{month}"),
            });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl FromStr for Month {
    type Err = DashError;

    /// Accepts `YYYY-MM` or `YYYY-MM-DD`; a day is truncated to the month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || DashError::InvalidMonth {
            value: s.to_string(),
        };
        let date = match trimmed.len() {
            7 => NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"),
            10 => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"),
            _ => return Err(invalid()),
        }
        .map_err(|_| invalid())?;
        Month::new(date.year(), date.month()).map_err(|_| invalid())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive month window. A missing bound leaves that side open.
///
/// An inverted range (start after end) is accepted and simply matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    #[serde(default)]
    pub start: Option<Month>,
    #[serde(default)]
    pub end: Option<Month>,
}

impl MonthRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: Month, end: Month) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_formats_to_the_same_month() {
        let a: Month = "2025-10".parse().unwrap();
        let b: Month = "2025-10-17".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2025-10");
    }

    #[test]
    fn rejects_unpadded_and_garbage_input() {
        assert!("2025-1".parse::<Month>().is_err());
        assert!("2025-13".parse::<Month>().is_err());
        assert!("Oct 2025".parse::<Month>().is_err());
        assert!("".parse::<Month>().is_err());
    }

    #[test]
    fn ordering_is_chronological_across_years() {
        let dec: Month = "2024-12".parse().unwrap();
        let jan: Month = "2025-01".parse().unwrap();
        assert!(dec < jan);
        assert_eq!(jan.pred(), dec);
        assert_eq!("2025-03".parse::<Month>().unwrap().pred().to_string(), "2025-02");
    }

    #[test]
    fn serde_uses_the_canonical_label() {
        let m: Month = "2025-11-01".parse().unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2025-11\"");
        let back: Month = serde_json::from_str("\"2025-11\"").unwrap();
        assert_eq!(back, m);
    }
}
