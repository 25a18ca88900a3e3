use super::DashStore;
use crate::{
    error::{DashError, DashResult},
    metrics::AccountManager,
    types::AccountManagerId,
};
use rusqlite::{params, OptionalExtension, Row};

fn account_manager_from_row(row: &Row<'_>) -> rusqlite::Result<AccountManager> {
    Ok(AccountManager {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        active: row.get::<_, i32>(3)? != 0,
    })
}

impl DashStore {
    // ── Account manager ───────────────────────────────────────────

    /// Insert or rename an account manager keyed by email. Returns its id.
    pub fn upsert_account_manager(&self, name: &str, email: &str) -> DashResult<AccountManagerId> {
        let id: AccountManagerId = self.conn.query_row(
            "INSERT INTO account_manager (name, email, active) VALUES (?1, ?2, 1)
             ON CONFLICT(email) DO UPDATE SET name = excluded.name
             RETURNING id",
            params![name, email],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn set_account_manager_active(&self, id: AccountManagerId, active: bool) -> DashResult<()> {
        let changed = self.conn.execute(
            "UPDATE account_manager SET active = ?1 WHERE id = ?2",
            params![if active { 1 } else { 0 }, id],
        )?;
        if changed == 0 {
            return Err(DashError::AccountManagerNotFound { id });
        }
        Ok(())
    }

    pub fn find_account_manager(&self, id: AccountManagerId) -> DashResult<Option<AccountManager>> {
        let am = self
            .conn
            .query_row(
                "SELECT id, name, email, active FROM account_manager WHERE id = ?1",
                params![id],
                account_manager_from_row,
            )
            .optional()?;
        Ok(am)
    }

    /// Exact email match; callers pass the normalized (lowercased) email.
    pub fn find_account_manager_by_email(&self, email: &str) -> DashResult<Option<AccountManager>> {
        let am = self
            .conn
            .query_row(
                "SELECT id, name, email, active FROM account_manager WHERE email = ?1",
                params![email],
                account_manager_from_row,
            )
            .optional()?;
        Ok(am)
    }

    /// Active account managers ordered by name, for the selector.
    pub fn active_account_managers(&self) -> DashResult<Vec<AccountManager>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, active FROM account_manager
             WHERE active = 1
             ORDER BY name ASC, id ASC",
        )?;
        let rows = stmt.query_map([], account_manager_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
