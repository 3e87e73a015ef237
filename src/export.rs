//! Serialises application records to CSV or JSON.
//!
//! Columns are the entity's field names, one row per record, no index column.
//! Absent optional fields are written as empty cells (CSV) or `null` (JSON).

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::model::{format_date, parse_date, ApplicationDraft, JobApplication, Status};

pub const CSV_HEADER: [&str; 11] = [
    "id",
    "job_title",
    "company_name",
    "location",
    "application_date",
    "status",
    "salary_range",
    "job_description",
    "notes",
    "created_at",
    "updated_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("unsupported export format '{other}' (expected csv or json)")),
        }
    }
}

/// One exported line. Field order defines the CSV header.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub id: i64,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub application_date: String,
    #[serde_as(as = "DisplayFromStr")]
    pub status: Status,
    pub salary_range: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&JobApplication> for ExportRow {
    fn from(record: &JobApplication) -> Self {
        Self {
            id: record.id,
            job_title: record.job_title.clone(),
            company_name: record.company_name.clone(),
            location: record.location.clone(),
            application_date: format_date(record.application_date),
            status: record.status,
            salary_range: record.salary_range.clone(),
            job_description: record.job_description.clone(),
            notes: record.notes.clone(),
            created_at: format_timestamp(record.created_at),
            updated_at: format_timestamp(record.updated_at),
        }
    }
}

impl ExportRow {
    pub fn application_date(&self) -> Option<Date> {
        parse_date(&self.application_date)
    }

    /// The user-entered fields as a candidate record, ready for the store.
    pub fn to_draft(&self) -> ApplicationDraft {
        ApplicationDraft {
            job_title: self.job_title.clone(),
            company_name: self.company_name.clone(),
            location: self.location.clone(),
            application_date: self.application_date(),
            status: Some(self.status),
            salary_range: self.salary_range.clone(),
            job_description: self.job_description.clone(),
            notes: self.notes.clone(),
        }
    }
}

pub fn write_csv<W: Write>(records: &[JobApplication], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv_writer
            .write_record(CSV_HEADER)
            .context("writing csv header")?;
    }
    for record in records {
        csv_writer
            .serialize(ExportRow::from(record))
            .with_context(|| format!("writing csv row for application {}", record.id))?;
    }
    csv_writer.flush().context("flushing csv output")?;
    Ok(())
}

pub fn to_csv_string(records: &[JobApplication]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    String::from_utf8(buffer).context("csv output was not utf-8")
}

pub fn write_json<W: Write>(records: &[JobApplication], writer: W) -> Result<()> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    serde_json::to_writer_pretty(writer, &rows).context("writing json export")?;
    Ok(())
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ExportRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<ExportRow>()
        .enumerate()
        .map(|(index, row)| row.with_context(|| format!("parsing csv row {}", index + 1)))
        .collect()
}

/// `job_applications_YYYYMMDD.<ext>`
pub fn default_file_name(format: ExportFormat, today: Date) -> String {
    let stamp = today
        .format(format_description!("[year][month][day]"))
        .unwrap_or_else(|_| "export".to_string());
    format!("job_applications_{stamp}.{}", format.extension())
}

/// Writes `records` to `path` (or a dated file inside `dir`) and returns the path used.
pub fn export_to_file(
    records: &[JobApplication],
    format: ExportFormat,
    path: Option<&Path>,
    dir: &Path,
    today: Date,
) -> Result<PathBuf> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => dir.join(default_file_name(format, today)),
    };
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating export directory {}", parent.display()))?;
    }
    let file = File::create(&target)
        .with_context(|| format!("creating export file {}", target.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Csv => write_csv(records, &mut writer)?,
        ExportFormat::Json => write_json(records, &mut writer)?,
    }
    writer.flush().context("flushing export file")?;
    tracing::info!(
        path = %target.display(),
        rows = records.len(),
        %format,
        "exported applications"
    );
    Ok(target)
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(
        raw.trim(),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .ok()
    .map(PrimitiveDateTime::assume_utc)
}
