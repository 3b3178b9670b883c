//! SQLite record store
//!
//! One `companies` table, upserted by INN. The pool is shared; each
//! persist call holds a connection only for its single statement.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use tracing::{debug, info};

use super::RecordSink;
use crate::error::{LookupError, LookupResult};
use crate::types::{ExtractedRecord, PersistedId};

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    inn TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    ogrn TEXT NOT NULL DEFAULT '',
    kpp TEXT,
    address TEXT,
    status TEXT NOT NULL,
    in_registry INTEGER NOT NULL,
    registry_message TEXT NOT NULL,
    registration_date TEXT,
    authorized_capital TEXT,
    main_activity TEXT,
    taxes_value TEXT,
    taxes_full TEXT,
    source TEXT NOT NULL,
    parsed_at TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_companies_in_registry ON companies(in_registry);
";

const UPSERT_SQL: &str = r"
INSERT INTO companies (
    inn, name, ogrn, kpp, address, status, in_registry, registry_message,
    registration_date, authorized_capital, main_activity, taxes_value, taxes_full,
    source, parsed_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(inn) DO UPDATE SET
    name = excluded.name,
    ogrn = excluded.ogrn,
    kpp = excluded.kpp,
    address = excluded.address,
    status = excluded.status,
    in_registry = excluded.in_registry,
    registry_message = excluded.registry_message,
    registration_date = excluded.registration_date,
    authorized_capital = excluded.authorized_capital,
    main_activity = excluded.main_activity,
    taxes_value = excluded.taxes_value,
    taxes_full = excluded.taxes_full,
    source = excluded.source,
    parsed_at = excluded.parsed_at,
    updated_at = CURRENT_TIMESTAMP
RETURNING id
";

fn storage_error(context: &str, error: sqlx::Error) -> LookupError {
    LookupError::PersistenceFailed(format!("{context}: {error}"))
}

/// Stored row, as read back by [`SqliteRecordStore::find_by_inn`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCompany {
    pub id: i64,
    pub inn: String,
    pub name: String,
    pub ogrn: String,
    pub in_registry: bool,
    pub taxes_full: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (creating if missing) the database at `db_path`
    ///
    /// # Errors
    ///
    /// [`LookupError::PersistenceFailed`] if the file cannot be opened or the schema applied.
    pub async fn open(db_path: &Path) -> LookupResult<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LookupError::PersistenceFailed(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| storage_error("failed to open database", e))?;

        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .map_err(|e| storage_error("failed to initialize schema", e))?;

        info!("Record store ready at {}", db_path.display());
        Ok(Self { pool })
    }

    pub async fn find_by_inn(&self, inn: &str) -> LookupResult<Option<StoredCompany>> {
        let row: Option<(i64, String, String, String, bool, Option<String>, String)> =
            sqlx::query_as(
                "SELECT id, inn, name, ogrn, in_registry, taxes_full, source \
                 FROM companies WHERE inn = ?",
            )
            .bind(inn)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("failed to query company", e))?;

        Ok(row.map(
            |(id, inn, name, ogrn, in_registry, taxes_full, source)| StoredCompany {
                id,
                inn,
                name,
                ogrn,
                in_registry,
                taxes_full,
                source,
            },
        ))
    }

    pub async fn count(&self) -> LookupResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("failed to count companies", e))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl RecordSink for SqliteRecordStore {
    async fn persist(&self, record: &ExtractedRecord) -> LookupResult<PersistedId> {
        let (taxes_value, taxes_full) = match &record.taxes {
            Some(taxes) => (Some(taxes.value.as_str()), Some(taxes.full.as_str())),
            None => (None, None),
        };

        let id: i64 = sqlx::query_scalar(UPSERT_SQL)
            .bind(&record.primary_id)
            .bind(&record.name)
            .bind(&record.ogrn)
            .bind(record.kpp.as_deref())
            .bind(record.address.as_deref())
            .bind(&record.status)
            .bind(record.in_registry)
            .bind(&record.registry_message)
            .bind(record.registration_date.as_deref())
            .bind(record.authorized_capital.as_deref())
            .bind(record.main_activity.as_deref())
            .bind(taxes_value)
            .bind(taxes_full)
            .bind(record.source.as_str())
            .bind(record.parsed_at.to_rfc3339())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("failed to upsert company", e))?;

        debug!("Persisted INN {} as row {}", record.primary_id, id);
        Ok(PersistedId(id))
    }
}
