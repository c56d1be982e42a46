//! Job list queries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus, JobType, ParseEnumError};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Highest page number a client may request. Keeps the skip count within
/// the signed 64-bit range the document store accepts.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_LIMIT;

/// Sort order for job lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobSort {
    /// Newest first.
    #[default]
    #[serde(rename = "latest")]
    Latest,
    /// Oldest first.
    #[serde(rename = "oldest")]
    Oldest,
    /// Position ascending.
    #[serde(rename = "a-z")]
    PositionAsc,
    /// Position descending.
    #[serde(rename = "z-a")]
    PositionDesc,
}

impl FromStr for JobSort {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(JobSort::Latest),
            "oldest" => Ok(JobSort::Oldest),
            "a-z" => Ok(JobSort::PositionAsc),
            "z-a" => Ok(JobSort::PositionDesc),
            other => Err(ParseEnumError {
                kind: "sort order",
                value: other.to_string(),
            }),
        }
    }
}

/// Filter, search, sort and page over one user's jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub owner: String,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
    /// Case-insensitive substring of the position.
    pub search: Option<String>,
    pub sort: JobSort,
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
}

impl JobQuery {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            status: None,
            job_type: None,
            search: None,
            sort: JobSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Number of matching jobs to skip before this page.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Check whether a job passes the filters (ignores paging).
    pub fn matches(&self, job: &Job) -> bool {
        if job.created_by != self.owner {
            return false;
        }
        if self.status.is_some_and(|status| status != job.status) {
            return false;
        }
        if self.job_type.is_some_and(|job_type| job_type != job.job_type) {
            return false;
        }
        match &self.search {
            Some(term) => job.position.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }
}

/// One page of jobs plus the total count across pages.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: u64,
}

impl JobPage {
    pub fn num_of_pages(&self, limit: u64) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!("a-z".parse::<JobSort>().unwrap(), JobSort::PositionAsc);
        assert_eq!("oldest".parse::<JobSort>().unwrap(), JobSort::Oldest);
        assert!("random".parse::<JobSort>().is_err());
    }

    #[test]
    fn test_skip_and_page_count() {
        let mut query = JobQuery::for_owner("u1");
        assert_eq!(query.skip(), 0);
        query.page = 3;
        query.limit = 5;
        assert_eq!(query.skip(), 10);

        query.page = u64::MAX;
        assert_eq!(query.skip(), u64::MAX);

        query.page = MAX_PAGE;
        query.limit = MAX_PAGE_LIMIT;
        assert!(query.skip() <= i64::MAX as u64);

        let page = JobPage { jobs: Vec::new(), total: 11 };
        assert_eq!(page.num_of_pages(5), 3);
        assert_eq!(page.num_of_pages(0), 0);
    }
}
