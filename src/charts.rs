//! Reshapes application records into series the dashboard can plot.
//!
//! Every transform accepts an empty slice and returns an empty result.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use time::Date;

use crate::model::{JobApplication, Status};

pub const TOP_COMPANY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSlice {
    pub status: Status,
    pub count: usize,
    /// Fraction of the whole, `0.0..=1.0`.
    pub share: f64,
}

/// Per-status counts recomputed from `records`, in enumeration order.
pub fn status_distribution(records: &[JobApplication]) -> Vec<StatusSlice> {
    let mut counts: BTreeMap<Status, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.status).or_default() += 1;
    }
    distribution_from_counts(&counts)
}

/// Same shape as [`status_distribution`], built from store-side counts.
pub fn distribution_from_counts(counts: &BTreeMap<Status, usize>) -> Vec<StatusSlice> {
    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(status, count)| StatusSlice {
            status: *status,
            count: *count,
            share: *count as f64 / total as f64,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePoint {
    pub date: Date,
    pub count: usize,
    pub cumulative: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub points: Vec<TimelinePoint>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn daily(&self) -> Vec<(Date, usize)> {
        self.points.iter().map(|p| (p.date, p.count)).collect()
    }

    pub fn cumulative(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.cumulative).collect()
    }

    pub fn peak_daily(&self) -> usize {
        self.points.iter().map(|p| p.count).max().unwrap_or(0)
    }

    pub fn first_date(&self) -> Option<Date> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.points.last().map(|p| p.date)
    }
}

/// Applications per day, ascending, with a running total.
pub fn timeline(records: &[JobApplication]) -> Timeline {
    let mut per_day: BTreeMap<Date, usize> = BTreeMap::new();
    for record in records {
        *per_day.entry(record.application_date).or_default() += 1;
    }
    let mut running = 0usize;
    let points = per_day
        .into_iter()
        .map(|(date, count)| {
            running += count;
            TimelinePoint {
                date,
                count,
                cumulative: running,
            }
        })
        .collect();
    Timeline { points }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyCount {
    pub company: String,
    pub count: usize,
}

/// Companies by application count, highest first, at most `limit` entries.
/// Equal counts keep the order in which the companies first appear.
pub fn top_companies(records: &[JobApplication], limit: usize) -> Vec<CompanyCount> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for record in records {
        *counts.entry(record.company_name.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<CompanyCount> = counts
        .into_iter()
        .map(|(company, count)| CompanyCount {
            company: company.to_string(),
            count,
        })
        .collect();
    // stable: ties stay in first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn application(id: i64, company: &str, day: Date, status: Status) -> JobApplication {
        JobApplication {
            id,
            job_title: "Engineer".into(),
            company_name: company.into(),
            location: "Remote".into(),
            application_date: day,
            status,
            salary_range: None,
            job_description: None,
            notes: None,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn transforms_tolerate_empty_input() {
        assert!(status_distribution(&[]).is_empty());
        assert!(distribution_from_counts(&BTreeMap::new()).is_empty());
        assert!(timeline(&[]).is_empty());
        assert!(top_companies(&[], TOP_COMPANY_LIMIT).is_empty());
    }

    #[test]
    fn timeline_groups_sorts_and_accumulates() {
        let records = vec![
            application(1, "Acme", date!(2024 - 01 - 03), Status::Applied),
            application(2, "Acme", date!(2024 - 01 - 01), Status::Applied),
            application(3, "Beta", date!(2024 - 01 - 01), Status::Rejected),
        ];
        let series = timeline(&records);
        assert_eq!(
            series.daily(),
            vec![(date!(2024 - 01 - 01), 2), (date!(2024 - 01 - 03), 1)]
        );
        assert_eq!(series.cumulative(), vec![2, 3]);
        assert_eq!(series.peak_daily(), 2);
        assert_eq!(series.first_date(), Some(date!(2024 - 01 - 01)));
        assert_eq!(series.last_date(), Some(date!(2024 - 01 - 03)));
    }

    #[test]
    fn top_companies_ranks_and_truncates_to_ten() {
        let mut records = Vec::new();
        for index in 0..10 {
            records.push(application(
                index,
                &format!("Company {index}"),
                date!(2024 - 01 - 01),
                Status::Applied,
            ));
        }
        records.push(application(10, "Repeat Corp", date!(2024 - 01 - 02), Status::Applied));
        records.push(application(11, "Repeat Corp", date!(2024 - 01 - 03), Status::Offered));

        let ranked = top_companies(&records, TOP_COMPANY_LIMIT);
        assert_eq!(ranked.len(), 10);
        assert_eq!(
            ranked[0],
            CompanyCount {
                company: "Repeat Corp".into(),
                count: 2
            }
        );
        assert_eq!(ranked[1].company, "Company 0");
        assert_eq!(ranked[9].company, "Company 8");
    }

    #[test]
    fn status_distribution_reports_shares_in_enum_order() {
        let records = vec![
            application(1, "Acme", date!(2024 - 01 - 01), Status::Rejected),
            application(2, "Beta", date!(2024 - 01 - 01), Status::Applied),
            application(3, "Gamma", date!(2024 - 01 - 01), Status::Applied),
            application(4, "Delta", date!(2024 - 01 - 01), Status::Applied),
        ];
        let slices = status_distribution(&records);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].status, Status::Applied);
        assert_eq!(slices[0].count, 3);
        assert_eq!(slices[0].share, 0.75);
        assert_eq!(slices[1].status, Status::Rejected);
        assert_eq!(slices[1].share, 0.25);
    }

    #[test]
    fn distribution_from_counts_skips_zero_entries() {
        let counts: BTreeMap<Status, usize> =
            [(Status::Offered, 1), (Status::Withdrawn, 0)].into_iter().collect();
        let slices = distribution_from_counts(&counts);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].share, 1.0);
    }
}
