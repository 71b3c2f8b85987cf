//! Database schema initialization and migrations.

use log::warn;

use crate::error::{DatabaseResultExt, Result};

/// Version stamped into `PRAGMA user_version` once the schema is current.
pub const SCHEMA_VERSION: i64 = 1;

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations()?;

        Ok(())
    }

    /// Current `user_version` of the open database.
    pub fn schema_version(&self) -> Result<i64> {
        self.connection
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .db_context("Failed to read schema version")
    }

    /// Stamps fresh databases and flags ones written by a newer release.
    fn apply_migrations(&self) -> Result<()> {
        let version = self.schema_version()?;
        if version > SCHEMA_VERSION {
            warn!("Database schema v{version} is newer than supported v{SCHEMA_VERSION}");
            return Ok(());
        }
        if version < SCHEMA_VERSION {
            self.connection
                .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .db_context("Failed to update schema version")?;
        }
        Ok(())
    }
}
