use rusqlite::Connection;

use crate::error::{StorageContext, StoreResult};

/// Ordered schema steps. `PRAGMA user_version` records how many have run, so
/// each entry executes exactly once per database.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS job_applications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_title TEXT NOT NULL,
        company_name TEXT NOT NULL,
        location TEXT NOT NULL,
        application_date TEXT NOT NULL,
        status TEXT NOT NULL,
        salary_range TEXT,
        job_description TEXT,
        notes TEXT,
        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS job_applications_date_idx
        ON job_applications (application_date DESC, id DESC);
    CREATE INDEX IF NOT EXISTS job_applications_status_idx
        ON job_applications (status);
    "#,
];

pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get::<_, u32>(0))
        .storage_context("reading schema version")
}

/// Brings the schema up to date and returns the number of steps applied.
pub fn apply(conn: &mut Connection) -> StoreResult<usize> {
    let current = current_version(conn)? as usize;
    if current >= MIGRATIONS.len() {
        return Ok(0);
    }

    let tx = conn
        .transaction()
        .storage_context("starting migration transaction")?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current) {
        tx.execute_batch(sql)
            .with_storage_context(|| format!("applying schema migration {}", index + 1))?;
    }
    tx.pragma_update(None, "user_version", MIGRATIONS.len() as u32)
        .storage_context("recording schema version")?;
    tx.commit().storage_context("committing schema migrations")?;

    let applied = MIGRATIONS.len() - current;
    tracing::info!(from = current, to = MIGRATIONS.len(), "applied schema migrations");
    Ok(applied)
}
