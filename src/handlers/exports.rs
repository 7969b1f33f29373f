use std::path::Path as FsPath;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::handlers::AppState;
use crate::middleware::AuthenticatedUser;
use crate::models::{ExportJob, JobStatus};
use crate::services::JobService;

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ExportJob> for JobResponse {
    fn from(job: ExportJob) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            result: job.result_path,
            error: job.error,
        }
    }
}

/// Kick off a CSV export of the caller's reservations. Returns immediately
/// with a job id to poll.
pub async fn submit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<JobResponse>)> {
    let job =
        JobService::submit_export(state.database.pool(), &state.config.export_dir, user.id)
            .await?;
    Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job))))
}

pub async fn poll(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>> {
    let job = authorized_job(&state, &user, job_id).await?;
    Ok(Json(JobResponse::from(job)))
}

/// Serve the finished CSV as an attachment.
pub async fn download(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(job_id): Path<Uuid>,
) -> Result<Response> {
    let job = authorized_job(&state, &user, job_id).await?;

    if job.status != JobStatus::Success {
        return Err(AppError::State(format!(
            "export job is {:?}, nothing to download",
            job.status
        )));
    }
    let filename = job.result_path.ok_or(AppError::NotFound("export file"))?;

    let body = tokio::fs::read(FsPath::new(&state.config.export_dir).join(&filename)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// A user may only see their own export jobs; admins may see any.
async fn authorized_job(
    state: &AppState,
    user: &AuthenticatedUser,
    job_id: Uuid,
) -> Result<ExportJob> {
    let job = JobService::poll(state.database.pool(), job_id).await?;
    if !user.is_admin() && job.user_id != user.id {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}
