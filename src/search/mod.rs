use std::collections::BTreeSet;
use std::str::FromStr;

use time::{Date, Duration};

use crate::error::QueryError;
use crate::model::{format_date, parse_date, JobApplication, Status};

/// Inclusive calendar range. A range whose start is after its end matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Either bound may be open; missing bounds extend to the calendar limits.
    pub fn between(start: Option<Date>, end: Option<Date>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(Self {
            start: start.unwrap_or(Date::MIN),
            end: end.unwrap_or(Date::MAX),
        })
    }

    /// The last `days` days up to and including `today`.
    pub fn last_days(today: Date, days: u32) -> Self {
        let span = i64::from(days.saturating_sub(1));
        let start = today
            .checked_sub(Duration::days(span))
            .unwrap_or(Date::MIN);
        Self { start, end: today }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn label(&self) -> String {
        match (self.start == Date::MIN, self.end == Date::MAX) {
            (true, true) => "any date".to_string(),
            (true, false) => format!("until {}", format_date(self.end)),
            (false, true) => format!("since {}", format_date(self.start)),
            (false, false) => format!("{} .. {}", format_date(self.start), format_date(self.end)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub statuses: BTreeSet<Status>,
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty() && self.statuses.is_empty() && self.date_range.is_none()
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_statuses<I: IntoIterator<Item = Status>>(mut self, statuses: I) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn matches(&self, record: &JobApplication) -> bool {
        matches_text(record, self.search_term.trim())
            && matches_status(record, &self.statuses)
            && matches_date(record, self.date_range.as_ref())
    }

    /// Short description of each active predicate, for status bars and CLI headers.
    pub fn chips(&self) -> Vec<String> {
        let mut chips = Vec::new();
        let term = self.search_term.trim();
        if !term.is_empty() {
            chips.push(format!("\"{term}\""));
        }
        if !self.statuses.is_empty() {
            let names = self
                .statuses
                .iter()
                .map(|status| status.label())
                .collect::<Vec<_>>()
                .join(" | ");
            chips.push(format!("status: {names}"));
        }
        if let Some(range) = &self.date_range {
            chips.push(range.label());
        }
        chips
    }
}

/// Keeps the records that satisfy every active predicate, in input order.
pub fn filter(records: &[JobApplication], criteria: &FilterCriteria) -> Vec<JobApplication> {
    if criteria.is_empty() {
        return records.to_vec();
    }
    let filtered: Vec<JobApplication> = records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect();
    tracing::debug!(
        input = records.len(),
        output = filtered.len(),
        "filtered applications"
    );
    filtered
}

fn matches_text(record: &JobApplication, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    [&record.job_title, &record.company_name, &record.location]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_status(record: &JobApplication, statuses: &BTreeSet<Status>) -> bool {
    statuses.is_empty() || statuses.contains(&record.status)
}

fn matches_date(record: &JobApplication, range: Option<&DateRange>) -> bool {
    range.map_or(true, |range| range.contains(record.application_date))
}

/// Parses `status:<name> from:<date> to:<date> date:<from>..<to>` plus free text.
///
/// Free-text tokens are joined with single spaces into the search term.
/// Repeated `status:` tokens accumulate; later date bounds narrow earlier ones.
pub fn parse_query(input: &str) -> Result<FilterCriteria, QueryError> {
    let mut criteria = FilterCriteria::default();
    let mut terms = Vec::new();
    let mut from: Option<Date> = None;
    let mut to: Option<Date> = None;

    for raw in input.split_whitespace() {
        if let Some(name) = raw.strip_prefix("status:") {
            criteria.statuses.insert(parse_status(name)?);
            continue;
        }
        if let Some(value) = raw.strip_prefix("from:") {
            from = narrow_start(from, parse_query_date(value)?);
            continue;
        }
        if let Some(value) = raw.strip_prefix("to:") {
            to = narrow_end(to, parse_query_date(value)?);
            continue;
        }
        if let Some(bounds) = raw.strip_prefix("date:") {
            let (start, end) = parse_range(bounds)?;
            if let Some(start) = start {
                from = narrow_start(from, start);
            }
            if let Some(end) = end {
                to = narrow_end(to, end);
            }
            continue;
        }
        terms.push(raw);
    }

    criteria.search_term = terms.join(" ");
    criteria.date_range = DateRange::between(from, to);
    Ok(criteria)
}

pub fn parse_status(name: &str) -> Result<Status, QueryError> {
    Status::from_str(name.trim()).map_err(|_| QueryError::UnknownStatus(name.to_string()))
}

fn parse_query_date(value: &str) -> Result<Date, QueryError> {
    parse_date(value).ok_or_else(|| QueryError::InvalidDate(value.to_string()))
}

fn parse_range(bounds: &str) -> Result<(Option<Date>, Option<Date>), QueryError> {
    let parts: Vec<&str> = bounds.split("..").collect();
    match parts.as_slice() {
        [single] if !single.is_empty() => {
            let date = parse_query_date(single)?;
            Ok((Some(date), Some(date)))
        }
        [start, end] => {
            let start = if start.is_empty() {
                None
            } else {
                Some(parse_query_date(start)?)
            };
            let end = if end.is_empty() {
                None
            } else {
                Some(parse_query_date(end)?)
            };
            Ok((start, end))
        }
        _ => Err(QueryError::InvalidRange(bounds.to_string())),
    }
}

fn narrow_start(current: Option<Date>, candidate: Date) -> Option<Date> {
    Some(current.map_or(candidate, |existing| existing.max(candidate)))
}

fn narrow_end(current: Option<Date>, candidate: Date) -> Option<Date> {
    Some(current.map_or(candidate, |existing| existing.min(candidate)))
}
