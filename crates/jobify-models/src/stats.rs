//! Per-user application statistics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::job::JobStatus;

/// Count of jobs per status. Every status is present, zero when unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub interview: u64,
    pub declined: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: JobStatus, count: u64) {
        match status {
            JobStatus::Pending => self.pending += count,
            JobStatus::Interview => self.interview += count,
            JobStatus::Declined => self.declined += count,
        }
    }
}

/// Number of applications created in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyCount {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    pub count: u64,
}

/// Client-facing monthly entry, e.g. `{"date": "Aug 2024", "count": 3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyApplications {
    pub date: String,
    pub count: u64,
}

impl From<MonthlyCount> for MonthlyApplications {
    fn from(value: MonthlyCount) -> Self {
        let date = NaiveDate::from_ymd_opt(value.year, value.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", value.year, value.month));
        Self {
            date,
            count: value.count,
        }
    }
}

/// Raw statistics as produced by a store.
///
/// `monthly` holds the most recent months, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStats {
    pub by_status: StatusCounts,
    pub monthly: Vec<MonthlyCount>,
}

impl JobStats {
    /// Number of recent months reported.
    pub const MONTHS: usize = 6;

    /// Monthly entries in chronological order, as clients chart them.
    pub fn monthly_applications(&self) -> Vec<MonthlyApplications> {
        self.monthly
            .iter()
            .take(Self::MONTHS)
            .rev()
            .copied()
            .map(MonthlyApplications::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_applications_are_chronological() {
        let stats = JobStats {
            by_status: StatusCounts::default(),
            monthly: vec![
                MonthlyCount { year: 2024, month: 2, count: 1 },
                MonthlyCount { year: 2024, month: 1, count: 4 },
                MonthlyCount { year: 2023, month: 12, count: 2 },
            ],
        };

        let monthly = stats.monthly_applications();
        assert_eq!(monthly[0], MonthlyApplications { date: "Dec 2023".into(), count: 2 });
        assert_eq!(monthly[2], MonthlyApplications { date: "Feb 2024".into(), count: 1 });
    }

    #[test]
    fn test_status_counts() {
        let mut counts = StatusCounts::default();
        counts.add(JobStatus::Interview, 2);
        counts.add(JobStatus::Pending, 1);
        counts.add(JobStatus::Interview, 1);
        assert_eq!(counts, StatusCounts { pending: 1, interview: 3, declined: 0 });
    }
}
