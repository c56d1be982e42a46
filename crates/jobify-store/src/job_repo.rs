//! MongoDB repository for job applications.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use tracing::{debug, info};

use jobify_models::{Job, JobPage, JobQuery, JobSort, JobStats, JobStatus, JobUpdate, MonthlyCount, NewJob};

use crate::documents::{parse_id, JobDocument, JOBS};
use crate::error::{StoreError, StoreResult};
use crate::repos::JobStore;

/// Repository for `jobs` documents.
pub struct MongoJobRepository {
    jobs: Collection<JobDocument>,
}

impl MongoJobRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            jobs: database.collection(JOBS),
        }
    }
}

/// Build the filter document for a list query.
fn list_filter(query: &JobQuery) -> StoreResult<Document> {
    let mut filter = doc! { "createdBy": parse_id(&query.owner)? };
    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    if let Some(job_type) = query.job_type {
        filter.insert("jobType", job_type.as_str());
    }
    if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
        filter.insert(
            "position",
            doc! { "$regex": regex::escape(term), "$options": "i" },
        );
    }
    Ok(filter)
}

fn sort_document(sort: JobSort) -> Document {
    match sort {
        JobSort::Latest => doc! { "createdAt": -1, "_id": -1 },
        JobSort::Oldest => doc! { "createdAt": 1, "_id": 1 },
        JobSort::PositionAsc => doc! { "position": 1 },
        JobSort::PositionDesc => doc! { "position": -1 },
    }
}

/// Build the `$set` document for a partial update.
fn update_document(update: &JobUpdate) -> Document {
    let mut set = doc! { "updatedAt": bson::DateTime::from_chrono(Utc::now()) };
    if let Some(company) = &update.company {
        set.insert("company", company.clone());
    }
    if let Some(position) = &update.position {
        set.insert("position", position.clone());
    }
    if let Some(status) = update.status {
        set.insert("status", status.as_str());
    }
    if let Some(job_type) = update.job_type {
        set.insert("jobType", job_type.as_str());
    }
    if let Some(location) = &update.job_location {
        set.insert("jobLocation", location.clone());
    }
    doc! { "$set": set }
}

/// `$sum` results come back as int32 or int64 depending on magnitude.
fn count_of(doc: &Document) -> u64 {
    match doc.get("count") {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        _ => 0,
    }
}

#[async_trait]
impl JobStore for MongoJobRepository {
    async fn create(&self, job: NewJob) -> StoreResult<Job> {
        let doc = JobDocument::from_new(job)?;
        self.jobs.insert_one(&doc).await?;
        info!("Created job record: {}", doc.id);
        Ok(doc.into_job())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Job>> {
        let oid = parse_id(id)?;
        let doc = self.jobs.find_one(doc! { "_id": oid }).await?;
        Ok(doc.map(JobDocument::into_job))
    }

    async fn list(&self, query: &JobQuery) -> StoreResult<JobPage> {
        let filter = list_filter(query)?;
        let total = self.jobs.count_documents(filter.clone()).await?;

        let limit = i64::try_from(query.limit).map_err(StoreError::serialization)?;
        let docs: Vec<JobDocument> = self
            .jobs
            .find(filter)
            .sort(sort_document(query.sort))
            .skip(query.skip())
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        debug!(owner = %query.owner, total, returned = docs.len(), "Listed jobs");
        Ok(JobPage {
            jobs: docs.into_iter().map(JobDocument::into_job).collect(),
            total,
        })
    }

    async fn update(&self, id: &str, update: &JobUpdate) -> StoreResult<Option<Job>> {
        let oid = parse_id(id)?;
        let doc = self
            .jobs
            .find_one_and_update(doc! { "_id": oid }, update_document(update))
            .return_document(ReturnDocument::After)
            .await?;
        Ok(doc.map(JobDocument::into_job))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let oid = parse_id(id)?;
        let result = self.jobs.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn stats(&self, owner: &str) -> StoreResult<JobStats> {
        let owner = parse_id(owner)?;
        let mut stats = JobStats::default();

        let mut by_status = self
            .jobs
            .aggregate(vec![
                doc! { "$match": { "createdBy": owner } },
                doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
            ])
            .await?;
        while let Some(row) = by_status.try_next().await? {
            let status = row
                .get_str("_id")
                .ok()
                .and_then(|s| s.parse::<JobStatus>().ok());
            if let Some(status) = status {
                stats.by_status.add(status, count_of(&row));
            }
        }

        let mut monthly = self
            .jobs
            .aggregate(vec![
                doc! { "$match": { "createdBy": owner } },
                doc! { "$group": {
                    "_id": { "year": { "$year": "$createdAt" }, "month": { "$month": "$createdAt" } },
                    "count": { "$sum": 1 },
                } },
                doc! { "$sort": { "_id.year": -1, "_id.month": -1 } },
                doc! { "$limit": JobStats::MONTHS as i64 },
            ])
            .await?;
        while let Some(row) = monthly.try_next().await? {
            let key = row.get_document("_id").map_err(StoreError::serialization)?;
            let year = key.get_i32("year").map_err(StoreError::serialization)?;
            let month = key.get_i32("month").map_err(StoreError::serialization)?;
            stats.monthly.push(MonthlyCount {
                year,
                month: month.max(1) as u32,
                count: count_of(&row),
            });
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;

    use super::*;

    #[test]
    fn test_list_filter_escapes_search() {
        let owner = ObjectId::new();
        let mut query = JobQuery::for_owner(owner.to_hex());
        query.status = Some(JobStatus::Interview);
        query.search = Some("c++ (senior)".into());

        let filter = list_filter(&query).unwrap();
        assert_eq!(filter.get_object_id("createdBy").unwrap(), owner);
        assert_eq!(filter.get_str("status").unwrap(), "interview");
        assert!(filter.get("jobType").is_none());

        let position = filter.get_document("position").unwrap();
        assert_eq!(position.get_str("$regex").unwrap(), r"c\+\+ \(senior\)");
        assert_eq!(position.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_list_filter_rejects_bad_owner() {
        let query = JobQuery::for_owner("nope");
        assert!(matches!(list_filter(&query), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn test_update_document_only_sets_present_fields() {
        let update = JobUpdate {
            position: Some("Staff Engineer".into()),
            ..Default::default()
        };
        let doc = update_document(&update);
        let set = doc.get_document("$set").unwrap();
        assert_eq!(set.get_str("position").unwrap(), "Staff Engineer");
        assert!(set.get("company").is_none());
        assert!(set.get_datetime("updatedAt").is_ok());
    }

    #[test]
    fn test_count_of_accepts_both_int_widths() {
        assert_eq!(count_of(&doc! { "count": 3_i32 }), 3);
        assert_eq!(count_of(&doc! { "count": 7_i64 }), 7);
        assert_eq!(count_of(&doc! {}), 0);
    }
}
