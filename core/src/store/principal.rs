use super::DashStore;
use crate::{
    error::DashResult,
    principal::{Principal, StoredPrincipal},
    types::AccountManagerId,
};
use rusqlite::{params, OptionalExtension};

impl DashStore {
    // ── Principal ─────────────────────────────────────────────────

    /// Upsert by email. Name, role and link are written in one statement;
    /// an existing principal keeps its id.
    pub fn upsert_principal(&self, principal: &Principal) -> DashResult<String> {
        let id: String = self.conn.query_row(
            "INSERT INTO app_user (id, email, name, role, am_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(email) DO UPDATE SET
                 name  = excluded.name,
                 role  = excluded.role,
                 am_id = excluded.am_id
             RETURNING id",
            params![
                &principal.id,
                &principal.email,
                &principal.display_name,
                principal.role.label(),
                principal.role.linked_entity(),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn find_principal(&self, email: &str) -> DashResult<Option<StoredPrincipal>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, name, email, role, am_id FROM app_user WHERE email = ?1",
                params![email],
                |row| {
                    Ok(StoredPrincipal {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        email: row.get(2)?,
                        role_label: row.get(3)?,
                        am_id: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    /// Administrative relink of a principal. Takes effect on the next
    /// session refresh.
    pub fn set_principal_link(&self, email: &str, am_id: Option<AccountManagerId>) -> DashResult<usize> {
        let changed = self.conn.execute(
            "UPDATE app_user SET am_id = ?1 WHERE email = ?2",
            params![am_id, email],
        )?;
        Ok(changed)
    }

    /// Overwrite the raw role label (for administrative tooling and tests).
    pub fn set_principal_role_label(&self, email: &str, label: &str) -> DashResult<usize> {
        let changed = self.conn.execute(
            "UPDATE app_user SET role = ?1 WHERE email = ?2",
            params![label, email],
        )?;
        Ok(changed)
    }

    pub fn principal_count(&self) -> DashResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM app_user", [], |row| row.get(0))?;
        Ok(count)
    }
}
