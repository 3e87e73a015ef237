use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::config::{ConfigPaths, StorageOptions};
use crate::error::{StorageContext, StoreError, StoreResult};
use crate::model::{format_date, parse_date, ApplicationDraft, JobApplication, Status};

mod schema;

pub use schema::latest_version as latest_schema_version;

const SELECT_COLUMNS: &str = "id,
        job_title,
        company_name,
        location,
        application_date,
        status,
        salary_range,
        job_description,
        notes,
        created_at,
        updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: usize,
    pub version: u32,
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&*self.db_path).with_storage_context(|| {
            format!("opening database {}", self.db_path.display())
        })?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn schema_version(&self) -> StoreResult<u32> {
        self.with_connection(schema::current_version)
    }

    /// Inserts a validated draft and returns the identifier SQLite assigned.
    pub fn create(&self, draft: &ApplicationDraft) -> StoreResult<i64> {
        let record = draft.validate()?;
        self.with_connection(|conn| {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            conn.execute(
                "INSERT INTO job_applications
                    (job_title, company_name, location, application_date, status,
                     salary_range, job_description, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    record.job_title,
                    record.company_name,
                    record.location,
                    format_date(record.application_date),
                    record.status.label(),
                    record.salary_range,
                    record.job_description,
                    record.notes,
                    now
                ],
            )
            .storage_context("inserting application")?;
            let id = conn.last_insert_rowid();
            tracing::info!(id, company = %record.company_name, "created application");
            Ok(id)
        })
    }

    /// Every application, newest application date first.
    pub fn read_all(&self) -> StoreResult<Vec<JobApplication>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {SELECT_COLUMNS}
                 FROM job_applications
                 ORDER BY application_date DESC, id DESC"
            );
            let mut stmt = conn
                .prepare(&sql)
                .storage_context("preparing application listing")?;
            let records = stmt
                .query_map([], map_application)
                .storage_context("listing applications")?
                .collect::<rusqlite::Result<Vec<_>>>()
                .storage_context("decoding applications")?;
            Ok(records)
        })
    }

    pub fn fetch(&self, id: i64) -> StoreResult<Option<JobApplication>> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {SELECT_COLUMNS} FROM job_applications WHERE id = ?1");
            conn.query_row(&sql, params![id], map_application)
                .optional()
                .with_storage_context(|| format!("fetching application {id}"))
        })
    }

    /// Overwrites every mutable field. Returns `false` when `id` is unknown.
    pub fn update(&self, id: i64, draft: &ApplicationDraft) -> StoreResult<bool> {
        let record = draft.validate()?;
        self.with_connection(|conn| {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            let updated = conn
                .execute(
                    "UPDATE job_applications
                     SET job_title = ?1,
                         company_name = ?2,
                         location = ?3,
                         application_date = ?4,
                         status = ?5,
                         salary_range = ?6,
                         job_description = ?7,
                         notes = ?8,
                         updated_at = MAX(created_at, ?9)
                     WHERE id = ?10",
                    params![
                        record.job_title,
                        record.company_name,
                        record.location,
                        format_date(record.application_date),
                        record.status.label(),
                        record.salary_range,
                        record.job_description,
                        record.notes,
                        now,
                        id
                    ],
                )
                .with_storage_context(|| format!("updating application {id}"))?;
            if updated == 0 {
                tracing::debug!(id, "update skipped, application not found");
                return Ok(false);
            }
            tracing::info!(id, "updated application");
            Ok(true)
        })
    }

    /// Returns `false` when there was nothing to delete.
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| {
            let deleted = conn
                .execute("DELETE FROM job_applications WHERE id = ?1", params![id])
                .with_storage_context(|| format!("deleting application {id}"))?;
            if deleted == 0 {
                tracing::debug!(id, "delete skipped, application not found");
                return Ok(false);
            }
            tracing::info!(id, "deleted application");
            Ok(true)
        })
    }

    /// Count per status currently in the table; absent statuses are omitted.
    pub fn status_counts(&self) -> StoreResult<BTreeMap<Status, usize>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT status, COUNT(*)
                     FROM job_applications
                     GROUP BY status",
                )
                .storage_context("preparing status counts")?;
            let rows = stmt
                .query_map([], |row| {
                    let status = decode_status(row, 0)?;
                    let count: i64 = row.get(1)?;
                    Ok((status, count as usize))
                })
                .storage_context("counting applications by status")?;
            let mut counts = BTreeMap::new();
            for row in rows {
                let (status, count) = row.storage_context("decoding status counts")?;
                counts.insert(status, count);
            }
            Ok(counts)
        })
    }
}

fn map_application(row: &Row<'_>) -> rusqlite::Result<JobApplication> {
    let raw_date: String = row.get(4)?;
    let application_date = parse_date(&raw_date).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("invalid application date '{raw_date}'").into(),
        )
    })?;
    Ok(JobApplication {
        id: row.get(0)?,
        job_title: row.get(1)?,
        company_name: row.get(2)?,
        location: row.get(3)?,
        application_date,
        status: decode_status(row, 5)?,
        salary_range: row.get(6)?,
        job_description: row.get(7)?,
        notes: row.get(8)?,
        created_at: decode_timestamp(row, 9)?,
        updated_at: decode_timestamp(row, 10)?,
    })
}

fn decode_status(row: &Row<'_>, index: usize) -> rusqlite::Result<Status> {
    let raw: String = row.get(index)?;
    Status::from_str(&raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("unknown status '{raw}'").into(),
        )
    })
}

fn decode_timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<OffsetDateTime> {
    let epoch: i64 = row.get(index)?;
    OffsetDateTime::from_unix_timestamp(epoch)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, err.into()))
}

/// Opens (creating if needed) the database and runs pending migrations once.
pub fn init(paths: &ConfigPaths, storage: &StorageOptions) -> StoreResult<StorageHandle> {
    let (handle, report) = init_with_report(paths, storage)?;
    if report.applied > 0 {
        tracing::info!(version = report.version, "database schema ready");
    }
    Ok(handle)
}

pub fn init_with_report(
    paths: &ConfigPaths,
    storage: &StorageOptions,
) -> StoreResult<(StorageHandle, MigrationReport)> {
    let db_path = &paths.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::DataDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut conn = Connection::open(db_path)
        .with_storage_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    let applied = schema::apply(&mut conn)?;
    let version = schema::current_version(&conn)?;
    Ok((
        StorageHandle {
            db_path: Arc::new(db_path.clone()),
            options: Arc::new(storage.clone()),
        },
        MigrationReport { applied, version },
    ))
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> StoreResult<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .storage_context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", storage.synchronous.pragma_value())
        .storage_context("setting synchronous mode")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .storage_context("setting wal_autocheckpoint")?;
    Ok(())
}
