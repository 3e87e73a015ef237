use crate::charts::{self, CompanyCount, StatusSlice, Timeline};
use crate::metrics::{self, Metrics};
use crate::model::JobApplication;
use crate::search::{self, FilterCriteria};

/// Everything one frame draws, derived from the full record set and the
/// current criteria. Metrics and charts describe the filtered rows.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub total_records: usize,
    pub visible: Vec<JobApplication>,
    pub metrics: Metrics,
    pub distribution: Vec<StatusSlice>,
    pub timeline: Timeline,
    pub top_companies: Vec<CompanyCount>,
}

impl Dashboard {
    pub fn build(records: &[JobApplication], criteria: &FilterCriteria, top_limit: usize) -> Self {
        let visible = search::filter(records, criteria);
        Self {
            total_records: records.len(),
            metrics: metrics::compute(&visible),
            distribution: charts::status_distribution(&visible),
            timeline: charts::timeline(&visible),
            top_companies: charts::top_companies(&visible, top_limit),
            visible,
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.visible.len() != self.total_records
    }
}
