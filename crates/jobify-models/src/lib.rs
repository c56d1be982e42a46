//! Shared data models for the Jobify backend.
//!
//! This crate provides Serde-serializable types for:
//! - Users and their public profile
//! - Job applications, their status and type
//! - List queries (filtering, search, sorting, pagination)
//! - Per-user application statistics

pub mod job;
pub mod query;
pub mod stats;
pub mod user;

// Re-export common types
pub use job::{Job, JobStatus, JobType, JobUpdate, NewJob, ParseEnumError, DEFAULT_LOCATION};
pub use query::{JobPage, JobQuery, JobSort, DEFAULT_PAGE_LIMIT, MAX_PAGE, MAX_PAGE_LIMIT};
pub use stats::{JobStats, MonthlyApplications, MonthlyCount, StatusCounts};
pub use user::{normalize_email, NewUser, ProfileUpdate, User, UserRecord, DEFAULT_LAST_NAME};
