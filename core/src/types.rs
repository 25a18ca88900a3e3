//! Shared primitive types used across the reporting core.

/// Primary key of an AccountManager record.
pub type AccountManagerId = i64;

/// Stable identifier of a signed-in principal (uuid v4 string).
pub type PrincipalId = String;

/// Stable identifier of a monthly metric row (uuid v4 string).
pub type MetricRowId = String;
