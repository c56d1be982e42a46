//! BSON document shapes stored in the `users` and `jobs` collections.

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobify_models::{Job, JobStatus, JobType, NewJob, NewUser, User, UserRecord};

use crate::error::{StoreError, StoreResult};

pub(crate) const USERS: &str = "users";
pub(crate) const JOBS: &str = "jobs";

/// Parse a client-supplied id into an ObjectId.
pub(crate) fn parse_id(id: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| StoreError::invalid_id(id))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub last_name: String,
    pub location: String,
}

impl UserDocument {
    pub fn from_new(user: NewUser) -> Self {
        Self {
            id: ObjectId::new(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            last_name: user.last_name,
            location: user.location,
        }
    }

    pub fn into_user(self) -> User {
        self.into_record().user
    }

    pub fn into_record(self) -> UserRecord {
        UserRecord {
            user: User {
                id: self.id.to_hex(),
                name: self.name,
                email: self.email,
                last_name: self.last_name,
                location: self.location,
            },
            password_hash: self.password,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub job_type: JobType,
    pub job_location: String,
    pub created_by: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl JobDocument {
    pub fn from_new(job: NewJob) -> StoreResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: ObjectId::new(),
            company: job.company,
            position: job.position,
            status: job.status,
            job_type: job.job_type,
            job_location: job.job_location,
            created_by: parse_id(&job.created_by)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn into_job(self) -> Job {
        Job {
            id: self.id.to_hex(),
            company: self.company,
            position: self.position,
            status: self.status,
            job_type: self.job_type,
            job_location: self.job_location,
            created_by: self.created_by.to_hex(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_document_roundtrip_through_bson() {
        let owner = ObjectId::new().to_hex();
        let doc = JobDocument::from_new(NewJob::new(&owner, "Acme", "Engineer")).unwrap();

        let raw = bson::to_document(&doc).unwrap();
        assert!(raw.get_object_id("_id").is_ok());
        assert!(raw.get_object_id("createdBy").is_ok());
        assert!(raw.get_datetime("createdAt").is_ok());
        assert_eq!(raw.get_str("jobType").unwrap(), "full-time");
        assert_eq!(raw.get_str("status").unwrap(), "pending");

        let back: JobDocument = bson::from_document(raw).unwrap();
        let job = back.into_job();
        assert_eq!(job.created_by, owner);
        assert_eq!(job.company, "Acme");
    }

    #[test]
    fn test_job_requires_valid_owner_id() {
        let err = JobDocument::from_new(NewJob::new("not-an-id", "Acme", "Engineer")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }

    #[test]
    fn test_user_record_keeps_hash_out_of_user() {
        let doc = UserDocument::from_new(NewUser::new("Ada", "ada@example.com", "$argon2id$hash"));
        let record = doc.into_record();
        assert_eq!(record.password_hash, "$argon2id$hash");
        assert_eq!(record.user.email, "ada@example.com");
    }
}
