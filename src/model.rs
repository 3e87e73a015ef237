use std::fmt;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::{RequiredField, ValidationError};

/// The fixed set of states an application moves through.
///
/// The stored and displayed form is the `to_string` label. Parsing is
/// case-insensitive and also accepts the hyphenated spelling used on the
/// command line (`phone-screen`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    IntoStaticStr,
    strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Status {
    #[strum(to_string = "Applied")]
    Applied,
    #[strum(to_string = "Phone Screen", serialize = "phone-screen")]
    PhoneScreen,
    #[strum(to_string = "Technical Interview", serialize = "technical-interview")]
    TechnicalInterview,
    #[strum(to_string = "Onsite Interview", serialize = "onsite-interview")]
    OnsiteInterview,
    #[strum(to_string = "Final Interview", serialize = "final-interview")]
    FinalInterview,
    #[strum(to_string = "Offered")]
    Offered,
    #[strum(to_string = "Accepted")]
    Accepted,
    #[strum(to_string = "Rejected")]
    Rejected,
    #[strum(to_string = "Withdrawn")]
    Withdrawn,
    #[strum(to_string = "Follow-up", serialize = "followup", serialize = "follow up")]
    FollowUp,
}

impl Status {
    pub fn label(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = Status> {
        Status::iter()
    }

    /// Applied and Follow-up are the two states that still wait on the employer.
    pub fn awaiting_response(self) -> bool {
        matches!(self, Status::Applied | Status::FollowUp)
    }

    /// Phone screen through final round.
    pub fn is_interview_stage(self) -> bool {
        matches!(
            self,
            Status::PhoneScreen
                | Status::TechnicalInterview
                | Status::OnsiteInterview
                | Status::FinalInterview
        )
    }

    pub fn is_offer(self) -> bool {
        matches!(self, Status::Offered | Status::Accepted)
    }

    /// Next status in enumeration order, wrapping around. Used by the form picker.
    pub fn cycle(self, step: isize) -> Status {
        let all: Vec<Status> = Status::iter().collect();
        let len = all.len() as isize;
        let index = all.iter().position(|s| *s == self).unwrap_or(0) as isize;
        all[(index + step).rem_euclid(len) as usize]
    }
}

/// A persisted application row. Only the store constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobApplication {
    pub id: i64,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub application_date: Date,
    pub status: Status,
    pub salary_range: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl JobApplication {
    /// Short label used in pickers and confirmations.
    pub fn headline(&self) -> String {
        format!("{} - {}", self.company_name, self.job_title)
    }

    pub fn to_draft(&self) -> ApplicationDraft {
        ApplicationDraft {
            job_title: self.job_title.clone(),
            company_name: self.company_name.clone(),
            location: self.location.clone(),
            application_date: Some(self.application_date),
            status: Some(self.status),
            salary_range: self.salary_range.clone(),
            job_description: self.job_description.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// A candidate record coming from a form or the command line.
///
/// Required fields may be blank or absent here; [`ApplicationDraft::validate`]
/// reports every one that is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub application_date: Option<Date>,
    pub status: Option<Status>,
    pub salary_range: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
}

/// A draft that passed validation: required text trimmed and non-empty,
/// optional text either meaningful or `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidApplication {
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub application_date: Date,
    pub status: Status,
    pub salary_range: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
}

impl ApplicationDraft {
    pub fn validate(&self) -> Result<ValidApplication, ValidationError> {
        let job_title = self.job_title.trim();
        let company_name = self.company_name.trim();
        let location = self.location.trim();

        let mut missing = Vec::new();
        if job_title.is_empty() {
            missing.push(RequiredField::JobTitle);
        }
        if company_name.is_empty() {
            missing.push(RequiredField::CompanyName);
        }
        if location.is_empty() {
            missing.push(RequiredField::Location);
        }
        if self.application_date.is_none() {
            missing.push(RequiredField::ApplicationDate);
        }
        if self.status.is_none() {
            missing.push(RequiredField::Status);
        }

        match (self.application_date, self.status) {
            (Some(application_date), Some(status)) if missing.is_empty() => Ok(ValidApplication {
                job_title: job_title.to_string(),
                company_name: company_name.to_string(),
                location: location.to_string(),
                application_date,
                status,
                salary_range: non_blank(self.salary_range.as_deref()),
                job_description: non_blank(self.job_description.as_deref()),
                notes: non_blank(self.notes.as_deref()),
            }),
            _ => Err(ValidationError::MissingFields(missing)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// The local calendar date, or UTC when the local offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

impl fmt::Display for JobApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} at {} ({}) [{}] {}",
            self.id,
            self.job_title,
            self.company_name,
            self.location,
            self.status,
            format_date(self.application_date)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;
    use time::macros::date;

    fn complete_draft() -> ApplicationDraft {
        ApplicationDraft {
            job_title: " Backend Engineer ".into(),
            company_name: "Acme".into(),
            location: "Remote".into(),
            application_date: Some(date!(2024 - 03 - 01)),
            status: Some(Status::Applied),
            salary_range: Some("   ".into()),
            job_description: None,
            notes: Some(" referral ".into()),
        }
    }

    #[test]
    fn status_labels_round_trip_through_from_str() {
        for status in Status::all() {
            assert_eq!(Status::from_str(status.label()), Ok(status));
        }
        assert_eq!(Status::all().count(), 10);
    }

    #[test]
    fn status_parsing_accepts_cli_spellings() {
        assert_eq!(Status::from_str("phone-screen"), Ok(Status::PhoneScreen));
        assert_eq!(Status::from_str("FOLLOW-UP"), Ok(Status::FollowUp));
        assert_eq!(Status::from_str("offered"), Ok(Status::Offered));
        assert!(Status::from_str("Ghosted").is_err());
    }

    #[test]
    fn interview_stages_are_the_four_rounds() {
        let stages: Vec<_> = Status::all().filter(|s| s.is_interview_stage()).collect();
        assert_eq!(
            stages,
            vec![
                Status::PhoneScreen,
                Status::TechnicalInterview,
                Status::OnsiteInterview,
                Status::FinalInterview
            ]
        );
    }

    #[test]
    fn cycle_wraps_in_both_directions() {
        assert_eq!(Status::FollowUp.cycle(1), Status::Applied);
        assert_eq!(Status::Applied.cycle(-1), Status::FollowUp);
        assert_eq!(Status::Applied.cycle(2), Status::TechnicalInterview);
    }

    #[test]
    fn validate_trims_and_drops_blank_optionals() {
        let valid = complete_draft().validate().expect("valid draft");
        assert_eq!(valid.job_title, "Backend Engineer");
        assert_eq!(valid.salary_range, None);
        assert_eq!(valid.notes.as_deref(), Some("referral"));
    }

    #[test]
    fn validate_reports_all_missing_fields() {
        let draft = ApplicationDraft {
            job_title: "  ".into(),
            company_name: "Acme".into(),
            ..ApplicationDraft::default()
        };
        let err = draft.validate().unwrap_err();
        assert_matches!(err, ValidationError::MissingFields(ref fields) => {
            assert_eq!(
                fields,
                &vec![
                    RequiredField::JobTitle,
                    RequiredField::Location,
                    RequiredField::ApplicationDate,
                    RequiredField::Status
                ]
            );
        });
    }

    #[test]
    fn dates_use_iso_calendar_format() {
        assert_eq!(format_date(date!(2024 - 01 - 03)), "2024-01-03");
        assert_eq!(parse_date(" 2024-01-03 "), Some(date!(2024 - 01 - 03)));
        assert_eq!(parse_date("01/03/2024"), None);
    }
}
