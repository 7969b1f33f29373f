use sqlx::PgPool;
use uuid::Uuid;

use crate::database::queries::JobQueries;
use crate::errors::{AppError, Result};
use crate::models::ExportJob;
use crate::services::exporter::CsvExporter;

/// Tracked background work. A submit returns immediately with a job id; the
/// export itself runs on a detached task and records its outcome on the job
/// row, which `poll` reads back.
pub struct JobService;

impl JobService {
    /// Create a pending export job and kick off the CSV write in the
    /// background. The returned job is already persisted, so a crash of the
    /// worker task leaves a pollable `pending` record rather than a ghost.
    pub async fn submit_export(
        pool: &PgPool,
        export_dir: &str,
        user_id: i64,
    ) -> Result<ExportJob> {
        let job_id = Uuid::new_v4();
        let job = JobQueries::insert(pool, job_id, user_id).await?;

        let pool = pool.clone();
        let export_dir = export_dir.to_string();
        tokio::spawn(async move {
            match CsvExporter::export_for_user(&pool, &export_dir, user_id).await {
                Ok(filename) => {
                    if let Err(e) = JobQueries::mark_success(&pool, job_id, &filename).await {
                        tracing::error!(%job_id, error = %e, "failed to record export success");
                    }
                }
                Err(e) => {
                    tracing::error!(%job_id, user_id, error = %e, "reservation export failed");
                    if let Err(e) = JobQueries::mark_failed(&pool, job_id, &e.to_string()).await {
                        tracing::error!(%job_id, error = %e, "failed to record export failure");
                    }
                }
            }
        });

        tracing::info!(%job_id, user_id, "export job submitted");
        Ok(job)
    }

    pub async fn poll(pool: &PgPool, job_id: Uuid) -> Result<ExportJob> {
        JobQueries::find_by_id(pool, job_id)
            .await?
            .ok_or(AppError::NotFound("export job"))
    }
}
