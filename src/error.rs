//! Error types shared by the store, the filter parser and the front ends.
//!
//! The CLI and dashboard work in `anyhow::Result`; these enums exist so callers
//! can tell a rejected form apart from a broken database.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Required fields of an application, named the way the form labels them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequiredField {
    JobTitle,
    CompanyName,
    Location,
    ApplicationDate,
    Status,
}

impl RequiredField {
    pub fn label(self) -> &'static str {
        match self {
            RequiredField::JobTitle => "job title",
            RequiredField::CompanyName => "company name",
            RequiredField::Location => "location",
            RequiredField::ApplicationDate => "application date",
            RequiredField::Status => "status",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate record was rejected before touching the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required {}: {}", plural(.0.len()), join_fields(.0))]
    MissingFields(Vec<RequiredField>),
}

impl ValidationError {
    pub fn missing(&self) -> &[RequiredField] {
        match self {
            ValidationError::MissingFields(fields) => fields,
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "field"
    } else {
        "fields"
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine refused the operation. Surfaced as-is, never retried.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("creating data directory {}: {source}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// `anyhow::Context` in miniature for rusqlite calls inside the store.
pub(crate) trait StorageContext<T> {
    fn storage_context(self, context: &str) -> StoreResult<T>;

    fn with_storage_context<F>(self, f: F) -> StoreResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> StorageContext<T> for std::result::Result<T, rusqlite::Error> {
    fn storage_context(self, context: &str) -> StoreResult<T> {
        self.map_err(|source| StoreError::Storage {
            context: context.to_string(),
            source,
        })
    }

    fn with_storage_context<F>(self, f: F) -> StoreResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| StoreError::Storage {
            context: f(),
            source,
        })
    }
}

/// A textual filter query could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown status '{0}'")]
    UnknownStatus(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid date range '{0}', expected FROM..TO")]
    InvalidRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_every_missing_field() {
        let err = ValidationError::MissingFields(vec![
            RequiredField::JobTitle,
            RequiredField::Location,
        ]);
        assert_eq!(
            err.to_string(),
            "missing required fields: job title, location"
        );
    }

    #[test]
    fn single_missing_field_reads_singular() {
        let err = ValidationError::MissingFields(vec![RequiredField::Status]);
        assert_eq!(err.to_string(), "missing required field: status");
    }

    #[test]
    fn storage_context_wraps_engine_error() {
        let result: std::result::Result<(), rusqlite::Error> =
            Err(rusqlite::Error::QueryReturnedNoRows);
        let err = result.storage_context("reading row").unwrap_err();
        assert!(err.to_string().starts_with("reading row: "));
    }
}
