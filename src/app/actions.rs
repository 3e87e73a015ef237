use anyhow::{bail, Context, Result};
use time::Date;

use crate::config::ExportOptions;
use crate::export;
use crate::model::{ApplicationDraft, JobApplication};
use crate::storage::StorageHandle;

/// Runs store and export effects for the dashboard and reports a status line.
pub struct ActionDispatcher<'a> {
    storage: &'a StorageHandle,
    export: &'a ExportOptions,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(storage: &'a StorageHandle, export: &'a ExportOptions) -> Self {
        Self { storage, export }
    }

    pub fn create(&self, draft: &ApplicationDraft) -> Result<String> {
        let id = self
            .storage
            .create(draft)
            .context("saving new application")?;
        tracing::info!(id, "application created from dashboard");
        Ok(format!(
            "Added application #{id} ({})",
            draft.company_name.trim()
        ))
    }

    pub fn update(&self, id: i64, draft: &ApplicationDraft) -> Result<String> {
        let found = self
            .storage
            .update(id, draft)
            .with_context(|| format!("updating application {id}"))?;
        if !found {
            bail!("application #{id} no longer exists");
        }
        tracing::info!(id, "application updated from dashboard");
        Ok(format!("Updated application #{id}"))
    }

    pub fn delete(&self, id: i64) -> Result<String> {
        let found = self
            .storage
            .delete(id)
            .with_context(|| format!("deleting application {id}"))?;
        Ok(if found {
            tracing::info!(id, "application deleted from dashboard");
            format!("Deleted application #{id}")
        } else {
            format!("Application #{id} was already gone")
        })
    }

    /// Writes the rows currently shown to a dated file in the export directory.
    pub fn export(&self, visible: &[JobApplication], today: Date) -> Result<String> {
        let path = export::export_to_file(
            visible,
            self.export.format,
            None,
            &self.export.directory,
            today,
        )?;
        Ok(format!(
            "Exported {} application(s) to {}",
            visible.len(),
            path.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use crate::model::Status;
    use crate::storage::tests::{draft, init_storage};
    use time::macros::date;

    #[test]
    fn dispatcher_reports_each_outcome() -> Result<()> {
        let (temp, storage) = init_storage()?;
        let options = ExportOptions {
            directory: temp.path().join("exports"),
            format: ExportFormat::Json,
        };
        let dispatcher = ActionDispatcher::new(&storage, &options);

        let message = dispatcher.create(&draft(
            "Engineer",
            "Acme",
            date!(2024 - 01 - 05),
            Status::Applied,
        ))?;
        assert!(message.starts_with("Added application #"));
        let records = storage.read_all()?;
        let id = records[0].id;

        let mut changed = records[0].to_draft();
        changed.status = Some(Status::Offered);
        assert_eq!(dispatcher.update(id, &changed)?, format!("Updated application #{id}"));
        let missing = dispatcher
            .update(id + 100, &changed)
            .expect_err("unknown id must fail");
        assert!(missing.to_string().contains("no longer exists"));

        let exported = dispatcher.export(&storage.read_all()?, date!(2024 - 02 - 01))?;
        assert!(exported.contains("job_applications_20240201.json"));

        assert_eq!(dispatcher.delete(id)?, format!("Deleted application #{id}"));
        assert!(dispatcher.delete(id)?.contains("already gone"));
        Ok(())
    }

    #[test]
    fn invalid_draft_surfaces_validation_message() -> Result<()> {
        let (temp, storage) = init_storage()?;
        let options = ExportOptions {
            directory: temp.path().join("exports"),
            format: ExportFormat::Csv,
        };
        let err = ActionDispatcher::new(&storage, &options)
            .create(&ApplicationDraft::default())
            .expect_err("blank draft must be rejected");
        assert!(format!("{err:#}").contains("missing required fields"));
        Ok(())
    }
}
