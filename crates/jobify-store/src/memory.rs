//! In-memory backend implementing the same repository contracts.
//!
//! Ids are real ObjectId hex strings so id validation behaves exactly as
//! with MongoDB.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{Datelike, Utc};
use tokio::sync::RwLock;

use jobify_models::{
    normalize_email, Job, JobPage, JobQuery, JobSort, JobStats, JobUpdate, MonthlyCount, NewJob, NewUser,
    ProfileUpdate, User, UserRecord,
};

use crate::documents::parse_id;
use crate::error::{StoreError, StoreResult};
use crate::repos::{DataSource, JobStore, Repositories, UserStore};

#[derive(Default)]
struct Inner {
    users: RwLock<HashMap<String, UserRecord>>,
    jobs: RwLock<HashMap<String, Job>>,
    connected: AtomicBool,
    unreachable: AtomicBool,
    connects: AtomicUsize,
    job_operations: AtomicUsize,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `connect` always fails, as if the server were down.
    pub fn unreachable() -> Self {
        let store = Self::default();
        store.set_unreachable(true);
        store
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of successful `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Number of calls made through the [`JobStore`] interface.
    pub fn job_operations(&self) -> usize {
        self.inner.job_operations.load(Ordering::SeqCst)
    }

    pub async fn job_count(&self) -> usize {
        self.inner.jobs.read().await.len()
    }

    fn touch_jobs(&self) {
        self.inner.job_operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource for MemoryStore {
    async fn connect(&self) -> StoreResult<Repositories> {
        if self.inner.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::connection("memory store is unreachable"));
        }
        self.inner.connected.store(true, Ordering::SeqCst);
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Repositories::new(Arc::new(self.clone()), Arc::new(self.clone())))
    }

    async fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) {
        self.inner.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.inner.users.write().await;
        if users.values().any(|r| r.user.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let record = UserRecord {
            user: User {
                id: ObjectId::new().to_hex(),
                name: user.name,
                email: user.email,
                last_name: user.last_name,
                location: user.location,
            },
            password_hash: user.password_hash,
        };
        users.insert(record.user.id.clone(), record.clone());
        Ok(record.user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let users = self.inner.users.read().await;
        Ok(users.values().find(|r| r.user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        parse_id(id)?;
        let users = self.inner.users.read().await;
        Ok(users.get(id).map(|r| r.user.clone()))
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        parse_id(id)?;
        let mut users = self.inner.users.write().await;

        let email = normalize_email(&update.email);
        if users.values().any(|r| r.user.email == email && r.user.id != id) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        Ok(users.get_mut(id).map(|record| {
            update.apply_to(&mut record.user);
            record.user.clone()
        }))
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job: NewJob) -> StoreResult<Job> {
        self.touch_jobs();
        parse_id(&job.created_by)?;

        let now = Utc::now();
        let job = Job {
            id: ObjectId::new().to_hex(),
            company: job.company,
            position: job.position,
            status: job.status,
            job_type: job.job_type,
            job_location: job.job_location,
            created_by: job.created_by,
            created_at: now,
            updated_at: now,
        };
        self.inner.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Job>> {
        self.touch_jobs();
        parse_id(id)?;
        Ok(self.inner.jobs.read().await.get(id).cloned())
    }

    async fn list(&self, query: &JobQuery) -> StoreResult<JobPage> {
        self.touch_jobs();
        parse_id(&query.owner)?;

        let jobs = self.inner.jobs.read().await;
        let mut matching: Vec<Job> = jobs.values().filter(|j| query.matches(j)).cloned().collect();

        // ObjectId hex sorts by creation within one process, which breaks
        // timestamp ties the same way MongoDB's `_id` tiebreaker does.
        match query.sort {
            JobSort::Latest => matching.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id))),
            JobSort::Oldest => matching.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id))),
            JobSort::PositionAsc => matching.sort_by(|a, b| a.position.cmp(&b.position)),
            JobSort::PositionDesc => matching.sort_by(|a, b| b.position.cmp(&a.position)),
        }

        let total = matching.len() as u64;
        let skip = usize::try_from(query.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let jobs = matching.into_iter().skip(skip).take(limit).collect();
        Ok(JobPage { jobs, total })
    }

    async fn update(&self, id: &str, update: &JobUpdate) -> StoreResult<Option<Job>> {
        self.touch_jobs();
        parse_id(id)?;
        let mut jobs = self.inner.jobs.write().await;
        Ok(jobs.get_mut(id).map(|job| {
            update.apply_to(job);
            job.clone()
        }))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.touch_jobs();
        parse_id(id)?;
        Ok(self.inner.jobs.write().await.remove(id).is_some())
    }

    async fn stats(&self, owner: &str) -> StoreResult<JobStats> {
        self.touch_jobs();
        parse_id(owner)?;

        let jobs = self.inner.jobs.read().await;
        let mut stats = JobStats::default();
        let mut months: BTreeMap<(i32, u32), u64> = BTreeMap::new();

        for job in jobs.values().filter(|j| j.is_owned_by(owner)) {
            stats.by_status.add(job.status, 1);
            *months
                .entry((job.created_at.year(), job.created_at.month()))
                .or_default() += 1;
        }

        stats.monthly = months
            .into_iter()
            .rev()
            .take(JobStats::MONTHS)
            .map(|((year, month), count)| MonthlyCount { year, month, count })
            .collect();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use jobify_models::{JobStatus, JobType};

    use super::*;

    fn owner() -> String {
        ObjectId::new().to_hex()
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        UserStore::create(&store, NewUser::new("Ada", "ada@example.com", "h")).await.unwrap();

        let err = UserStore::create(&store, NewUser::new("Ada 2", "ADA@example.com", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(field) if field == "email"));
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        let me = owner();
        let other = owner();

        for (position, status) in [
            ("Backend Engineer", JobStatus::Pending),
            ("Frontend Engineer", JobStatus::Interview),
            ("Designer", JobStatus::Pending),
            ("Data Engineer", JobStatus::Declined),
        ] {
            let mut job = NewJob::new(&me, "Acme", position);
            job.status = status;
            JobStore::create(&store, job).await.unwrap();
        }
        JobStore::create(&store, NewJob::new(&other, "Other", "Engineer")).await.unwrap();

        let mut query = JobQuery::for_owner(&me);
        query.search = Some("engineer".into());
        query.sort = JobSort::PositionAsc;
        let page = store.list(&query).await.unwrap();
        assert_eq!(page.total, 3);
        let positions: Vec<_> = page.jobs.iter().map(|j| j.position.as_str()).collect();
        assert_eq!(positions, ["Backend Engineer", "Data Engineer", "Frontend Engineer"]);

        query.limit = 2;
        query.page = 2;
        let page = store.list(&query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].position, "Frontend Engineer");

        let mut query = JobQuery::for_owner(&me);
        query.status = Some(JobStatus::Pending);
        assert_eq!(store.list(&query).await.unwrap().total, 2);

        query.status = None;
        query.job_type = Some(JobType::Remote);
        assert_eq!(store.list(&query).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_latest_sort_uses_creation_order() {
        let store = MemoryStore::new();
        let me = owner();
        for position in ["first", "second", "third"] {
            JobStore::create(&store, NewJob::new(&me, "Acme", position)).await.unwrap();
        }

        let page = store.list(&JobQuery::for_owner(&me)).await.unwrap();
        let positions: Vec<_> = page.jobs.iter().map(|j| j.position.as_str()).collect();
        assert_eq!(positions, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_stats_counts_by_status_and_month() {
        let store = MemoryStore::new();
        let me = owner();
        for status in [JobStatus::Pending, JobStatus::Interview, JobStatus::Interview] {
            let mut job = NewJob::new(&me, "Acme", "Engineer");
            job.status = status;
            JobStore::create(&store, job).await.unwrap();
        }

        let stats = store.stats(&me).await.unwrap();
        assert_eq!(stats.by_status.pending, 1);
        assert_eq!(stats.by_status.interview, 2);
        assert_eq!(stats.by_status.declined, 0);
        assert_eq!(stats.monthly.len(), 1);
        assert_eq!(stats.monthly[0].count, 3);
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(JobStore::get(&store, "123").await, Err(StoreError::InvalidId(_))));
        assert!(matches!(store.delete("zzz").await, Err(StoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_to_connect() {
        let store = MemoryStore::unreachable();
        let err = store.connect().await.err().unwrap();
        assert!(err.is_connection());
        assert!(!store.is_connected().await);

        store.set_unreachable(false);
        store.connect().await.unwrap();
        assert!(store.is_connected().await);
        assert_eq!(store.connect_count(), 1);
    }
}
