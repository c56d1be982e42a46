//! Repository interfaces shared by the MongoDB and in-memory backends.

use std::sync::Arc;

use async_trait::async_trait;

use jobify_models::{Job, JobPage, JobQuery, JobStats, JobUpdate, NewJob, NewUser, ProfileUpdate, User, UserRecord};

use crate::error::StoreResult;

/// User account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `StoreError::Duplicate` if the email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    /// Replace the profile fields. Returns `None` if the user does not exist.
    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> StoreResult<Option<User>>;
}

/// Job application storage.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: NewJob) -> StoreResult<Job>;

    async fn get(&self, id: &str) -> StoreResult<Option<Job>>;

    async fn list(&self, query: &JobQuery) -> StoreResult<JobPage>;

    /// Apply a partial update. Returns `None` if the job does not exist.
    async fn update(&self, id: &str, update: &JobUpdate) -> StoreResult<Option<Job>>;

    /// Returns true if a job was removed.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    async fn stats(&self, owner: &str) -> StoreResult<JobStats>;
}

/// Repository handles bound to a live connection.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub jobs: Arc<dyn JobStore>,
}

impl Repositories {
    pub fn new(users: Arc<dyn UserStore>, jobs: Arc<dyn JobStore>) -> Self {
        Self { users, jobs }
    }
}

/// A backend that can be connected on demand.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Ensure the connection is live and hand out repositories bound to it.
    async fn connect(&self) -> StoreResult<Repositories>;

    async fn is_connected(&self) -> bool;

    /// Drop the connection. The next `connect` dials again.
    async fn disconnect(&self);
}
