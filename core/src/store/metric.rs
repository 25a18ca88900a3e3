use super::DashStore;
use crate::{
    error::DashResult,
    metrics::{MetricRow, MetricValues},
    month::{Month, MonthRange},
    types::{AccountManagerId, MetricRowId},
};
use rusqlite::{
    params, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef},
    Row, ToSql,
};

impl ToSql for Month {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Month {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn metric_row_from_row(row: &Row<'_>) -> rusqlite::Result<MetricRow> {
    Ok(MetricRow {
        id: row.get(0)?,
        account_manager_id: row.get(1)?,
        month: row.get(2)?,
        net_retention_pct: row.get(3)?,
        gross_retention_pct: row.get(4)?,
        renewal_premium: row.get(5)?,
        lost_premium: row.get(6)?,
        new_biz_premium: row.get(7)?,
        policy_count_start: row.get(8)?,
        policy_count_end: row.get(9)?,
    })
}

/// `account_manager_id IN (?, ?, ..)` plus optional month bounds.
/// Returns the clause and its bound values in placeholder order.
fn scope_filter(ids: &[AccountManagerId], range: &MonthRange) -> (String, Vec<Value>) {
    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut clause = format!("account_manager_id IN ({placeholders})");
    let mut values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
    if let Some(start) = range.start {
        clause.push_str(" AND month >= ?");
        values.push(Value::Text(start.to_string()));
    }
    if let Some(end) = range.end {
        clause.push_str(" AND month <= ?");
        values.push(Value::Text(end.to_string()));
    }
    (clause, values)
}

impl DashStore {
    // ── Monthly metrics ───────────────────────────────────────────

    /// Upsert by (account manager, month). Never creates a second row for
    /// the same key; an existing row keeps its id.
    pub fn upsert_metric_row(
        &self,
        account_manager_id: AccountManagerId,
        month: Month,
        v: &MetricValues,
    ) -> DashResult<MetricRowId> {
        let id: MetricRowId = self.conn.query_row(
            "INSERT INTO metric_monthly (
                id, account_manager_id, month, net_retention, gross_retention,
                renewal_premium, lost_premium, new_biz_premium,
                policy_count_start, policy_count_end
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(account_manager_id, month) DO UPDATE SET
                net_retention      = excluded.net_retention,
                gross_retention    = excluded.gross_retention,
                renewal_premium    = excluded.renewal_premium,
                lost_premium       = excluded.lost_premium,
                new_biz_premium    = excluded.new_biz_premium,
                policy_count_start = excluded.policy_count_start,
                policy_count_end   = excluded.policy_count_end
             RETURNING id",
            params![
                uuid::Uuid::new_v4().to_string(),
                account_manager_id,
                month,
                v.net_retention_pct,
                v.gross_retention_pct,
                v.renewal_premium,
                v.lost_premium,
                v.new_biz_premium,
                v.policy_count_start,
                v.policy_count_end,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Rows for the given account managers within `range`,
    /// ordered by month ascending, then account manager id ascending.
    /// An empty id set reads nothing.
    pub fn query_rows(
        &self,
        ids: &[AccountManagerId],
        range: &MonthRange,
    ) -> DashResult<Vec<MetricRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (clause, values) = scope_filter(ids, range);
        let sql = format!(
            "SELECT id, account_manager_id, month, net_retention, gross_retention,
                    renewal_premium, lost_premium, new_biz_premium,
                    policy_count_start, policy_count_end
             FROM metric_monthly
             WHERE {clause}
             ORDER BY month ASC, account_manager_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), metric_row_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Distinct months with data for the given account managers, ascending.
    /// Ignores any month range (feeds the range picker).
    pub fn available_months(&self, ids: &[AccountManagerId]) -> DashResult<Vec<Month>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (clause, values) = scope_filter(ids, &MonthRange::unbounded());
        let sql = format!(
            "SELECT DISTINCT month FROM metric_monthly WHERE {clause} ORDER BY month ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, Month>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Total metric rows (for tests and summaries).
    pub fn metric_row_count(&self) -> DashResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM metric_monthly", [], |row| row.get(0))?;
        Ok(count)
    }
}
