use crate::model::JobApplication;

/// Headline figures for a collection of applications.
///
/// Rates are percentages in `0.0..=100.0`, kept unrounded; use
/// [`format_rate`] when showing them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub total: usize,
    pub response_rate: f64,
    pub interview_rate: f64,
    pub offer_rate: f64,
}

pub fn compute(records: &[JobApplication]) -> Metrics {
    let total = records.len();
    if total == 0 {
        return Metrics::default();
    }

    let mut responded = 0usize;
    let mut interviewed = 0usize;
    let mut offered = 0usize;
    for record in records {
        if !record.status.awaiting_response() {
            responded += 1;
        }
        if record.status.is_interview_stage() {
            interviewed += 1;
        }
        if record.status.is_offer() {
            offered += 1;
        }
    }

    let metrics = Metrics {
        total,
        response_rate: percentage(responded, total),
        interview_rate: percentage(interviewed, total),
        offer_rate: percentage(offered, total),
    };
    tracing::debug!(?metrics, "computed metrics");
    metrics
}

fn percentage(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}

pub fn format_rate(rate: f64) -> String {
    format!("{rate:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use time::macros::{date, datetime};

    fn with_statuses(statuses: &[Status]) -> Vec<JobApplication> {
        statuses
            .iter()
            .enumerate()
            .map(|(index, status)| JobApplication {
                id: index as i64 + 1,
                job_title: "Engineer".into(),
                company_name: format!("Company {index}"),
                location: "Remote".into(),
                application_date: date!(2024 - 01 - 01),
                status: *status,
                salary_range: None,
                job_description: None,
                notes: None,
                created_at: datetime!(2024-01-01 0:00 UTC),
                updated_at: datetime!(2024-01-01 0:00 UTC),
            })
            .collect()
    }

    #[test]
    fn empty_collection_has_zero_rates() {
        let metrics = compute(&[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.response_rate, 0.0);
        assert_eq!(metrics.interview_rate, 0.0);
        assert_eq!(metrics.offer_rate, 0.0);
    }

    #[test]
    fn mixed_pipeline_rates() {
        let records = with_statuses(&[
            Status::Applied,
            Status::PhoneScreen,
            Status::TechnicalInterview,
            Status::Offered,
        ]);
        let metrics = compute(&records);
        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.response_rate, 75.0);
        assert_eq!(metrics.interview_rate, 50.0);
        assert_eq!(metrics.offer_rate, 25.0);
    }

    #[test]
    fn follow_up_counts_as_no_response() {
        let records = with_statuses(&[Status::FollowUp, Status::Applied, Status::Withdrawn]);
        let metrics = compute(&records);
        assert!((metrics.response_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.offer_rate, 0.0);
    }

    #[test]
    fn accepted_is_an_offer_but_not_an_interview() {
        let records = with_statuses(&[Status::Accepted, Status::FinalInterview]);
        let metrics = compute(&records);
        assert_eq!(metrics.offer_rate, 50.0);
        assert_eq!(metrics.interview_rate, 50.0);
        assert_eq!(metrics.response_rate, 100.0);
    }

    #[test]
    fn rates_round_only_when_formatted() {
        let records = with_statuses(&[Status::Offered, Status::Applied, Status::Applied]);
        let metrics = compute(&records);
        assert!((metrics.offer_rate - 33.333_333).abs() < 1e-5);
        assert_eq!(format_rate(metrics.offer_rate), "33.3%");
        assert_eq!(format_rate(0.0), "0.0%");
    }
}
