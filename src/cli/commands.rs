use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::Date;

use crate::app::App;
use crate::charts;
use crate::config::{AppConfig, ConfigPaths, StorageOptions};
use crate::export::{self, ExportFormat};
use crate::metrics::{self, format_rate};
use crate::model::{format_date, parse_date, today, ApplicationDraft, JobApplication, Status};
use crate::search::{self, parse_query};
use crate::storage::{self, StorageHandle};

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Filter query: free text plus status:<name>, from:/to:<YYYY-MM-DD>, date:<a>..<b>
    #[arg()]
    pub query: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Print at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    /// Application identifier
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Job title
    #[arg(long)]
    pub title: String,
    /// Company name
    #[arg(long)]
    pub company: String,
    /// Location (city, "Remote", ...)
    #[arg(long)]
    pub location: String,
    /// Application date as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<Date>,
    /// Status label, e.g. "Phone Screen" or phone-screen
    #[arg(long, default_value = "Applied")]
    pub status: Status,
    #[arg(long)]
    pub salary: Option<String>,
    /// Job description. If omitted, read from piped stdin.
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

/// Only the flags given are changed. An empty string clears an optional field.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Application identifier
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<Date>,
    #[arg(long)]
    pub status: Option<Status>,
    #[arg(long)]
    pub salary: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Destination file (defaults to a dated file in the export directory)
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// csv or json (defaults to the configured format)
    #[arg(long)]
    pub format: Option<ExportFormat>,
}

fn parse_date_arg(raw: &str) -> Result<Date, String> {
    parse_date(raw).ok_or_else(|| format!("'{raw}' is not a YYYY-MM-DD date"))
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn add_application(storage: &StorageHandle, args: AddArgs) -> Result<()> {
    let description = match args.description.clone() {
        Some(text) => Some(text),
        None => read_stdin()?,
    };
    let id = create_from_args(storage, args, description, today())?;
    println!("Created application #{id}");
    Ok(())
}

fn create_from_args(
    storage: &StorageHandle,
    args: AddArgs,
    description: Option<String>,
    today: Date,
) -> Result<i64> {
    let draft = ApplicationDraft {
        job_title: args.title,
        company_name: args.company,
        location: args.location,
        application_date: Some(args.date.unwrap_or(today)),
        status: Some(args.status),
        salary_range: args.salary,
        job_description: description,
        notes: args.notes,
    };
    let id = storage.create(&draft).context("creating application")?;
    Ok(id)
}

pub fn list_applications(storage: &StorageHandle, args: &ListArgs) -> Result<()> {
    print!("{}", run_list(storage, args)?);
    Ok(())
}

fn run_list(storage: &StorageHandle, args: &ListArgs) -> Result<String> {
    let mut records = select(storage, &args.query)?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    if records.is_empty() {
        return Ok("No applications found.\n".to_string());
    }
    let mut out = String::new();
    for record in &records {
        let _ = writeln!(
            &mut out,
            "#{:<5} {}  {:<19}  {}",
            record.id,
            format_date(record.application_date),
            record.status.label(),
            record.headline()
        );
        let _ = writeln!(&mut out, "       {}", record.location);
    }
    Ok(out)
}

pub fn show_application(storage: &StorageHandle, args: &IdArgs) -> Result<()> {
    print!("{}", run_show(storage, args.id)?);
    Ok(())
}

fn run_show(storage: &StorageHandle, id: i64) -> Result<String> {
    let Some(record) = storage
        .fetch(id)
        .with_context(|| format!("loading application {id}"))?
    else {
        bail!("application #{id} not found");
    };
    let mut out = String::new();
    let _ = writeln!(&mut out, "#{}  {}", record.id, record.headline());
    let field = |out: &mut String, label: &str, value: &str| {
        let _ = writeln!(out, "  {label:<16} {value}");
    };
    field(&mut out, "Location", &record.location);
    field(&mut out, "Applied", &format_date(record.application_date));
    field(&mut out, "Status", record.status.label());
    field(&mut out, "Salary", record.salary_range.as_deref().unwrap_or("-"));
    field(&mut out, "Created", &export::format_timestamp(record.created_at));
    field(&mut out, "Updated", &export::format_timestamp(record.updated_at));
    if let Some(description) = &record.job_description {
        let _ = writeln!(&mut out, "\n  Description\n{}", indent(description));
    }
    if let Some(notes) = &record.notes {
        let _ = writeln!(&mut out, "\n  Notes\n{}", indent(notes));
    }
    Ok(out)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn update_application(storage: &StorageHandle, args: UpdateArgs) -> Result<()> {
    println!("{}", run_update(storage, args)?);
    Ok(())
}

fn run_update(storage: &StorageHandle, args: UpdateArgs) -> Result<String> {
    let id = args.id;
    let Some(existing) = storage
        .fetch(id)
        .with_context(|| format!("loading application {id}"))?
    else {
        bail!("application #{id} not found");
    };
    let mut draft = existing.to_draft();
    if let Some(title) = args.title {
        draft.job_title = title;
    }
    if let Some(company) = args.company {
        draft.company_name = company;
    }
    if let Some(location) = args.location {
        draft.location = location;
    }
    if let Some(date) = args.date {
        draft.application_date = Some(date);
    }
    if let Some(status) = args.status {
        draft.status = Some(status);
    }
    if args.salary.is_some() {
        draft.salary_range = args.salary;
    }
    if args.description.is_some() {
        draft.job_description = args.description;
    }
    if args.notes.is_some() {
        draft.notes = args.notes;
    }
    if draft == existing.to_draft() {
        return Ok(format!("Application #{id} unchanged"));
    }
    if !storage
        .update(id, &draft)
        .with_context(|| format!("updating application {id}"))?
    {
        bail!("application #{id} not found");
    }
    Ok(format!("Updated application #{id}"))
}

pub fn delete_application(storage: &StorageHandle, args: &IdArgs) -> Result<()> {
    println!("{}", run_delete(storage, args.id)?);
    Ok(())
}

fn run_delete(storage: &StorageHandle, id: i64) -> Result<String> {
    let removed = storage
        .delete(id)
        .with_context(|| format!("deleting application {id}"))?;
    if !removed {
        bail!("application #{id} not found");
    }
    Ok(format!("Deleted application #{id}"))
}

pub fn print_stats(config: &AppConfig, storage: &StorageHandle, args: &QueryArgs) -> Result<()> {
    print!(
        "{}",
        run_stats(storage, args, config.dashboard.top_companies)?
    );
    Ok(())
}

fn run_stats(storage: &StorageHandle, args: &QueryArgs, top_limit: usize) -> Result<String> {
    let records = select(storage, args)?;
    let figures = metrics::compute(&records);
    let mut out = String::new();
    let _ = writeln!(&mut out, "Total applications  {}", figures.total);
    let _ = writeln!(&mut out, "Response rate       {}", format_rate(figures.response_rate));
    let _ = writeln!(&mut out, "Interview rate      {}", format_rate(figures.interview_rate));
    let _ = writeln!(&mut out, "Offer rate          {}", format_rate(figures.offer_rate));
    if records.is_empty() {
        return Ok(out);
    }

    // unfiltered breakdown comes straight from the store's GROUP BY
    let distribution = if args.query.is_empty() {
        let counts = storage.status_counts().context("counting by status")?;
        charts::distribution_from_counts(&counts)
    } else {
        charts::status_distribution(&records)
    };
    let _ = writeln!(&mut out, "\nBy status");
    for slice in distribution {
        let _ = writeln!(
            &mut out,
            "  {:<20} {:>4}  {:>6}",
            slice.status.label(),
            slice.count,
            format_rate(slice.share * 100.0)
        );
    }

    let timeline = charts::timeline(&records);
    if let (Some(first), Some(last)) = (timeline.first_date(), timeline.last_date()) {
        let _ = writeln!(
            &mut out,
            "\nTimeline  {} .. {}  ({} active days, busiest {} in a day)",
            format_date(first),
            format_date(last),
            timeline.points.len(),
            timeline.peak_daily()
        );
    }

    let _ = writeln!(&mut out, "\nTop companies");
    for entry in charts::top_companies(&records, top_limit) {
        let _ = writeln!(&mut out, "  {:<30} {:>4}", entry.company, entry.count);
    }
    Ok(out)
}

pub fn export_applications(
    config: &AppConfig,
    storage: &StorageHandle,
    args: &ExportArgs,
) -> Result<()> {
    let path = run_export(config, storage, args, today())?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn run_export(
    config: &AppConfig,
    storage: &StorageHandle,
    args: &ExportArgs,
    today: Date,
) -> Result<PathBuf> {
    let records = select(storage, &args.query)?;
    let format = args.format.unwrap_or(config.export.format);
    export::export_to_file(
        &records,
        format,
        args.output.as_deref(),
        &config.export.directory,
        today,
    )
}

pub fn run_migrate(paths: &ConfigPaths, options: &StorageOptions) -> Result<String> {
    let (handle, report) =
        storage::init_with_report(paths, options).context("migrating application store")?;
    Ok(format!(
        "{} migration(s) applied; schema version {} (latest {}) at {}\n",
        report.applied,
        report.version,
        storage::latest_schema_version(),
        handle.database_path().display()
    ))
}

/// Every record, narrowed by the parsed query when one is given.
fn select(storage: &StorageHandle, args: &QueryArgs) -> Result<Vec<JobApplication>> {
    let criteria = parse_query(&args.query.join(" ")).context("parsing filter query")?;
    let records = storage.read_all().context("loading applications")?;
    Ok(search::filter(&records, &criteria))
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading job description from stdin")?;
    if buf.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{draft, init_storage, temp_paths};
    use time::macros::date;

    type TestResult<T = ()> = Result<T>;

    fn seed(storage: &StorageHandle) -> TestResult<Vec<i64>> {
        Ok(vec![
            storage.create(&draft(
                "Backend Engineer",
                "Acme",
                date!(2024 - 01 - 03),
                Status::TechnicalInterview,
            ))?,
            storage.create(&draft(
                "Data Analyst",
                "Globex",
                date!(2024 - 01 - 01),
                Status::Applied,
            ))?,
            storage.create(&draft(
                "Platform Engineer",
                "Acme",
                date!(2024 - 01 - 01),
                Status::Offered,
            ))?,
        ])
    }

    fn query(text: &str) -> QueryArgs {
        QueryArgs {
            query: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[test]
    fn add_defaults_date_and_keeps_description() -> TestResult {
        let (_temp, storage) = init_storage()?;
        let args = AddArgs {
            title: "SRE".into(),
            company: "Initech".into(),
            location: "Austin".into(),
            date: None,
            status: Status::PhoneScreen,
            salary: Some("  ".into()),
            description: None,
            notes: None,
        };
        let id = create_from_args(
            &storage,
            args,
            Some("On-call rotation".into()),
            date!(2024 - 05 - 01),
        )?;
        let record = storage.fetch(id)?.expect("created record");
        assert_eq!(record.application_date, date!(2024 - 05 - 01));
        assert_eq!(record.job_description.as_deref(), Some("On-call rotation"));
        assert_eq!(record.salary_range, None);
        Ok(())
    }

    #[test]
    fn add_rejects_blank_required_fields() -> TestResult {
        let (_temp, storage) = init_storage()?;
        let args = AddArgs {
            title: " ".into(),
            company: "Initech".into(),
            location: "".into(),
            date: None,
            status: Status::Applied,
            salary: None,
            description: None,
            notes: None,
        };
        let err = create_from_args(&storage, args, None, date!(2024 - 05 - 01))
            .expect_err("blank fields");
        let message = format!("{err:#}");
        assert!(message.contains("job title, location"));
        assert!(storage.read_all()?.is_empty());
        Ok(())
    }

    #[test]
    fn list_filters_with_query_syntax() -> TestResult {
        let (_temp, storage) = init_storage()?;
        seed(&storage)?;
        let output = run_list(
            &storage,
            &ListArgs {
                query: query("engineer status:offered"),
                limit: None,
            },
        )?;
        assert!(output.contains("Acme - Platform Engineer"));
        assert!(!output.contains("Backend"));

        let limited = run_list(
            &storage,
            &ListArgs {
                query: QueryArgs::default(),
                limit: Some(1),
            },
        )?;
        assert_eq!(limited.lines().count(), 2);
        assert!(limited.contains("Backend Engineer"));
        Ok(())
    }

    #[test]
    fn list_reports_bad_query() -> TestResult {
        let (_temp, storage) = init_storage()?;
        let err = run_list(
            &storage,
            &ListArgs {
                query: query("from:yesterday"),
                limit: None,
            },
        )
        .expect_err("invalid date");
        assert!(format!("{err:#}").contains("yesterday"));
        Ok(())
    }

    #[test]
    fn show_update_delete_round() -> TestResult {
        let (_temp, storage) = init_storage()?;
        let ids = seed(&storage)?;
        let id = ids[1];

        let shown = run_show(&storage, id)?;
        assert!(shown.contains("Globex - Data Analyst"));
        assert!(shown.contains("Salary           -"));

        let message = run_update(
            &storage,
            UpdateArgs {
                id,
                status: Some(Status::Rejected),
                notes: Some("auto reply".into()),
                ..UpdateArgs::default()
            },
        )?;
        assert_eq!(message, format!("Updated application #{id}"));
        let record = storage.fetch(id)?.expect("record");
        assert_eq!(record.status, Status::Rejected);
        assert_eq!(record.notes.as_deref(), Some("auto reply"));
        assert_eq!(record.company_name, "Globex");

        let unchanged = run_update(
            &storage,
            UpdateArgs {
                id,
                ..UpdateArgs::default()
            },
        )?;
        assert!(unchanged.ends_with("unchanged"));

        run_delete(&storage, id)?;
        assert!(run_show(&storage, id).is_err());
        assert!(run_delete(&storage, id).is_err());
        assert!(run_update(
            &storage,
            UpdateArgs {
                id,
                ..UpdateArgs::default()
            }
        )
        .is_err());
        Ok(())
    }

    #[test]
    fn stats_cover_metrics_and_charts() -> TestResult {
        let (_temp, storage) = init_storage()?;
        seed(&storage)?;
        let output = run_stats(&storage, &QueryArgs::default(), 10)?;
        assert!(output.contains("Total applications  3"));
        assert!(output.contains("Response rate       66.7%"));
        assert!(output.contains("Interview rate      33.3%"));
        assert!(output.contains("2024-01-01 .. 2024-01-03"));
        let acme = output
            .lines()
            .position(|l| l.trim_start().starts_with("Acme"))
            .expect("acme listed");
        let globex = output
            .lines()
            .position(|l| l.trim_start().starts_with("Globex"))
            .expect("globex listed");
        assert!(acme < globex);

        let empty = run_stats(&storage, &query("nobody"), 10)?;
        assert!(empty.contains("Total applications  0"));
        assert!(empty.contains("Offer rate          0.0%"));
        assert!(!empty.contains("By status"));
        Ok(())
    }

    #[test]
    fn export_honours_query_and_format() -> TestResult {
        let (temp, storage) = init_storage()?;
        seed(&storage)?;
        let mut config = AppConfig::default();
        config.export.directory = temp.path().join("exports");
        let path = run_export(
            &config,
            &storage,
            &ExportArgs {
                query: query("acme"),
                output: None,
                format: None,
            },
            date!(2024 - 02 - 02),
        )?;
        assert_eq!(path, temp.path().join("exports/job_applications_20240202.csv"));
        let rows = export::parse_csv(std::fs::File::open(&path)?)?;
        assert_eq!(rows.len(), 2);

        let json_path = temp.path().join("out/all.json");
        run_export(
            &config,
            &storage,
            &ExportArgs {
                query: QueryArgs::default(),
                output: Some(json_path.clone()),
                format: Some(ExportFormat::Json),
            },
            date!(2024 - 02 - 02),
        )?;
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
        assert_eq!(value.as_array().map(Vec::len), Some(3));
        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> TestResult {
        let temp = tempfile::TempDir::new()?;
        let paths = temp_paths(&temp);
        let options = StorageOptions::default();
        let first = run_migrate(&paths, &options)?;
        assert!(first.starts_with(&format!(
            "{} migration(s) applied",
            storage::latest_schema_version()
        )));
        assert!(first.trim_end().ends_with(&paths.database_path.display().to_string()));
        let second = run_migrate(&paths, &options)?;
        assert!(second.starts_with("0 migration(s) applied"));
        Ok(())
    }
}
