//! Job application handlers.
//!
//! Every handler here runs behind `require_auth` and only ever touches jobs
//! owned by the caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use jobify_models::{
    Job, JobQuery, JobSort, JobStatus, JobType, JobUpdate, MonthlyApplications, NewJob, StatusCounts,
    MAX_PAGE, MAX_PAGE_LIMIT,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{JsonBody, QueryParams, Repos};
use crate::handlers::{ensure_present, required, MessageResponse};

/// Message for a job owned by someone else.
pub const NOT_AUTHORIZED_MESSAGE: &str = "Not authorized to access this route";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[validate(length(max = 50, message = "Company must be at most 50 characters"))]
    pub company: Option<String>,
    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
    #[validate(length(max = 100, message = "Job location must be at most 100 characters"))]
    pub job_location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedJobResponse {
    pub updated_job: Job,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub total_jobs: u64,
    pub num_of_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub default_stats: StatusCounts,
    pub monthly_applications: Vec<MonthlyApplications>,
}

/// Raw list parameters. Parsed by hand so bad values get a clear message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsParams {
    pub status: Option<String>,
    pub job_type: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListJobsParams {
    /// Build the store query for `owner`.
    pub fn into_query(self, owner: &str) -> ApiResult<JobQuery> {
        let mut query = JobQuery::for_owner(owner);

        query.status = parse_filter(self.status)?;
        query.job_type = parse_filter(self.job_type)?;
        query.search = self.search.filter(|s| !s.is_empty());

        if let Some(sort) = self.sort.filter(|s| !s.is_empty()) {
            query.sort = sort
                .parse::<JobSort>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
        }
        if let Some(page) = self.page {
            query.page = parse_positive("page", &page)?;
            if query.page > MAX_PAGE {
                return Err(ApiError::bad_request(format!("page must not exceed {}", MAX_PAGE)));
            }
        }
        if let Some(limit) = self.limit {
            query.limit = parse_positive("limit", &limit)?.min(MAX_PAGE_LIMIT);
        }

        Ok(query)
    }
}

/// `all` or an empty value means no filter.
fn parse_filter<T>(value: Option<String>) -> ApiResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.as_deref() {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ApiError::bad_request(e.to_string())),
    }
}

fn parse_positive(name: &str, raw: &str) -> ApiResult<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ApiError::bad_request(format!("{} must be a positive integer", name)))
}

/// Ensure the caller owns `job`. The response never says whose job it is.
fn check_permissions(user: &AuthUser, job: &Job) -> ApiResult<()> {
    if job.is_owned_by(&user.user_id) {
        return Ok(());
    }
    warn!(user_id = %user.user_id, job_id = %job.id, "Denied access to job owned by another user");
    Err(ApiError::unauthorized(NOT_AUTHORIZED_MESSAGE))
}

fn no_job(id: &str) -> ApiError {
    ApiError::not_found(format!("No job with id {}", id))
}

/// `POST /api/v1/jobs`
pub async fn create_job(
    Repos(repos): Repos,
    user: AuthUser,
    JsonBody(request): JsonBody<JobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    ensure_present(&[&request.company, &request.position])?;
    request.validate()?;

    let mut new_job = NewJob::new(&user.user_id, required(request.company)?, required(request.position)?);
    if let Some(status) = request.status {
        new_job.status = status;
    }
    if let Some(job_type) = request.job_type {
        new_job.job_type = job_type;
    }
    if let Some(location) = request.job_location.filter(|l| !l.is_empty()) {
        new_job.job_location = location;
    }

    let job = repos.jobs.create(new_job).await?;
    info!(user_id = %user.user_id, job_id = %job.id, "Created job");
    Ok((StatusCode::CREATED, Json(JobResponse { job })))
}

/// `GET /api/v1/jobs`
pub async fn list_jobs(
    Repos(repos): Repos,
    user: AuthUser,
    QueryParams(params): QueryParams<ListJobsParams>,
) -> ApiResult<Json<JobListResponse>> {
    let query = params.into_query(&user.user_id)?;
    let page = repos.jobs.list(&query).await?;
    let num_of_pages = page.num_of_pages(query.limit);

    Ok(Json(JobListResponse {
        jobs: page.jobs,
        total_jobs: page.total,
        num_of_pages,
    }))
}

/// `GET /api/v1/jobs/stats`
pub async fn show_stats(Repos(repos): Repos, user: AuthUser) -> ApiResult<Json<StatsResponse>> {
    let stats = repos.jobs.stats(&user.user_id).await?;
    Ok(Json(StatsResponse {
        default_stats: stats.by_status,
        monthly_applications: stats.monthly_applications(),
    }))
}

/// `GET /api/v1/jobs/:id`
pub async fn get_job(Repos(repos): Repos, user: AuthUser, Path(id): Path<String>) -> ApiResult<Json<JobResponse>> {
    let job = repos.jobs.get(&id).await?.ok_or_else(|| no_job(&id))?;
    check_permissions(&user, &job)?;
    Ok(Json(JobResponse { job }))
}

/// `PATCH /api/v1/jobs/:id`
pub async fn update_job(
    Repos(repos): Repos,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<JobRequest>,
) -> ApiResult<Json<UpdatedJobResponse>> {
    ensure_present(&[&request.company, &request.position])?;
    request.validate()?;

    let job = repos.jobs.get(&id).await?.ok_or_else(|| no_job(&id))?;
    check_permissions(&user, &job)?;

    let update = JobUpdate {
        company: request.company,
        position: request.position,
        status: request.status,
        job_type: request.job_type,
        job_location: request.job_location.filter(|l| !l.is_empty()),
    };
    let updated_job = repos.jobs.update(&id, &update).await?.ok_or_else(|| no_job(&id))?;

    info!(user_id = %user.user_id, job_id = %id, "Updated job");
    Ok(Json(UpdatedJobResponse { updated_job }))
}

/// `DELETE /api/v1/jobs/:id`
pub async fn delete_job(
    Repos(repos): Repos,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let job = repos.jobs.get(&id).await?.ok_or_else(|| no_job(&id))?;
    check_permissions(&user, &job)?;

    if !repos.jobs.delete(&id).await? {
        return Err(no_job(&id));
    }

    info!(user_id = %user.user_id, job_id = %id, "Deleted job");
    Ok(Json(MessageResponse {
        message: "Success! Job removed".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_params() {
        let query = ListJobsParams::default().into_query("owner").unwrap();
        assert_eq!(query, JobQuery::for_owner("owner"));
    }

    #[test]
    fn test_list_params_parsing() {
        let params = ListJobsParams {
            status: Some("interview".into()),
            job_type: Some("all".into()),
            search: Some("rust".into()),
            sort: Some("a-z".into()),
            page: Some("3".into()),
            limit: Some("500".into()),
        };
        let query = params.into_query("owner").unwrap();
        assert_eq!(query.status, Some(JobStatus::Interview));
        assert_eq!(query.job_type, None);
        assert_eq!(query.search.as_deref(), Some("rust"));
        assert_eq!(query.sort, JobSort::PositionAsc);
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_bad_list_params_rejected() {
        for params in [
            ListJobsParams {
                status: Some("hired".into()),
                ..Default::default()
            },
            ListJobsParams {
                sort: Some("newest".into()),
                ..Default::default()
            },
            ListJobsParams {
                page: Some("0".into()),
                ..Default::default()
            },
            ListJobsParams {
                limit: Some("ten".into()),
                ..Default::default()
            },
            ListJobsParams {
                page: Some((MAX_PAGE + 1).to_string()),
                ..Default::default()
            },
        ] {
            let err = params.into_query("owner").unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_foreign_job_is_denied_generically() {
        let mut job = Job {
            id: "64b7f0c2a1b2c3d4e5f60718".into(),
            company: "Acme".into(),
            position: "Engineer".into(),
            status: JobStatus::Pending,
            job_type: JobType::FullTime,
            job_location: "Berlin".into(),
            created_by: "owner".into(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let intruder = AuthUser {
            user_id: "intruder".into(),
        };

        let err = check_permissions(&intruder, &job).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), NOT_AUTHORIZED_MESSAGE);

        job.created_by = "intruder".into();
        assert!(check_permissions(&intruder, &job).is_ok());
    }
}
