//! Job application records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location used when a user or job does not specify one.
pub const DEFAULT_LOCATION: &str = "my city";

/// Error returned when parsing an enum from its wire name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Status of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Interview,
    Declined,
    #[default]
    Pending,
}

impl JobStatus {
    pub const ALL: [JobStatus; 3] = [JobStatus::Pending, JobStatus::Interview, JobStatus::Declined];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Interview => "interview",
            JobStatus::Declined => "declined",
            JobStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "job status",
                value: s.to_string(),
            })
    }
}

/// Employment type of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Remote,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Remote,
        JobType::Internship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Remote => "remote",
            JobType::Internship => "internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|job_type| job_type.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "job type",
                value: s.to_string(),
            })
    }
}

/// A stored job application.
///
/// Serialized with the field names clients already consume (`_id`,
/// `jobType`, `createdBy`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub job_type: JobType,
    pub job_location: String,
    /// Id of the owning user.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Check whether `user_id` owns this job.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}

/// Fields required to create a job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub job_type: JobType,
    pub job_location: String,
    pub created_by: String,
}

impl NewJob {
    pub fn new(
        created_by: impl Into<String>,
        company: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            position: position.into(),
            status: JobStatus::default(),
            job_type: JobType::default(),
            job_location: DEFAULT_LOCATION.to_string(),
            created_by: created_by.into(),
        }
    }
}

/// Partial update of a job. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
    pub job_location: Option<String>,
}

impl JobUpdate {
    /// Apply the update to an in-memory job, bumping `updated_at`.
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(company) = &self.company {
            job.company = company.clone();
        }
        if let Some(position) = &self.position {
            job.position = position.clone();
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(location) = &self.job_location {
            job.job_location = location.clone();
        }
        job.updated_at = Utc::now();
    }
}
