//! Runs one pipeline per job, at most `workers` at a time.
//!
//! Jobs never share bundles; workers share only the immutable services.
//! A failed job is recorded and the batch moves on.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::models::{FinalizedMaterials, JobPosting, MaterialsBundle, Profile, SanitizedProfile};
use crate::pipeline::orchestrator::{MaterialsPipeline, PipelineError, PipelineServices};

/// Backs off after repeated quota failures so the remaining jobs are not
/// burned against an exhausted quota.
#[derive(Debug)]
pub struct QuotaGuard {
    consecutive: AtomicU32,
    threshold: u32,
    cooldown: Duration,
}

impl QuotaGuard {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            consecutive: AtomicU32::new(0),
            threshold: threshold.max(1),
            cooldown,
        }
    }

    pub fn record_quota_failure(&self) -> u32 {
        self.consecutive.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_success(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }

    /// Sleeps out the cooldown when the failure threshold has been reached.
    pub async fn wait_if_exhausted(&self) {
        let failures = self.consecutive_failures();
        if failures < self.threshold {
            return;
        }
        warn!(
            "{} consecutive quota failures; cooling down for {}s",
            failures,
            self.cooldown.as_secs()
        );
        tokio::time::sleep(self.cooldown).await;
        self.record_success();
    }
}

/// One job's entry in the failure report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedJob {
    pub job_id: String,
    pub title: String,
    pub code: String,
    pub message: String,
}

/// Everything a batch produced, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Bundles exactly as generated, before scoring and refinement.
    pub generated: Vec<MaterialsBundle>,
    pub finalized: Vec<FinalizedMaterials>,
    pub failed: Vec<FailedJob>,
}

struct JobResult {
    generated: Option<MaterialsBundle>,
    outcome: Result<FinalizedMaterials, FailedJob>,
}

/// Runs the full pipeline for every job, bounded by `config.workers`.
pub async fn run_batch(
    jobs: Vec<JobPosting>,
    profile: &Profile,
    services: Arc<PipelineServices>,
) -> BatchReport {
    let total = jobs.len();
    if total == 0 {
        info!("No jobs to process");
        return BatchReport::default();
    }

    let workers = services.config.workers.max(1);
    info!("Processing {} jobs with {} workers", total, workers);

    let profile = Arc::new(profile.sanitized());
    let semaphore = Arc::new(Semaphore::new(workers));
    let guard = Arc::new(QuotaGuard::new(
        services.config.quota_failure_threshold,
        services.config.quota_cooldown,
    ));

    let labels: Vec<(String, String)> = jobs.iter().map(|j| (j.id.clone(), j.title.clone())).collect();
    let mut set = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let profile = Arc::clone(&profile);
        let services = Arc::clone(&services);
        let semaphore = Arc::clone(&semaphore);
        let guard = Arc::clone(&guard);

        set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    guard.wait_if_exhausted().await;
                    process_job(job, profile, services, &guard).await
                }
                Err(e) => JobResult {
                    generated: None,
                    outcome: Err(failed(&job, "GENERATION_FAILED", e.to_string())),
                },
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => error!("Worker task failed: {}", e),
        }
    }

    let mut report = BatchReport::default();
    for (slot, (job_id, title)) in slots.into_iter().zip(labels) {
        let result = slot.unwrap_or_else(|| JobResult {
            generated: None,
            outcome: Err(FailedJob {
                job_id,
                title,
                code: "GENERATION_FAILED".to_string(),
                message: "worker task aborted".to_string(),
            }),
        });
        report.generated.extend(result.generated);
        match result.outcome {
            Ok(finalized) => report.finalized.push(finalized),
            Err(failure) => report.failed.push(failure),
        }
    }

    info!(
        "Batch complete: {} finalized, {} failed of {}",
        report.finalized.len(),
        report.failed.len(),
        total
    );
    report
}

async fn process_job(
    job: JobPosting,
    profile: Arc<SanitizedProfile>,
    services: Arc<PipelineServices>,
    guard: &QuotaGuard,
) -> JobResult {
    let label = job.clone();
    let mut pipeline = MaterialsPipeline::new(job, profile, services);

    let outcome = match pipeline.generate().await {
        Ok(()) => {
            guard.record_success();
            pipeline.complete().await
        }
        Err(e) => Err(e),
    };
    let generated = pipeline.generated().cloned();

    let outcome = match outcome {
        Ok(finalized) => Ok(finalized),
        Err(PipelineError::Generation(error)) => {
            if error.is_quota() {
                let streak = guard.record_quota_failure();
                warn!("Quota failure streak: {}", streak);
            }
            error!("Job {} failed: {} ({})", label.id, error, error.code());
            Err(failed(&label, error.code(), error.to_string()))
        }
        Err(e) => {
            error!("Job {} aborted: {}", label.id, e);
            Err(failed(&label, "GENERATION_FAILED", e.to_string()))
        }
    };

    JobResult { generated, outcome }
}

fn failed(job: &JobPosting, code: &str, message: String) -> FailedJob {
    FailedJob {
        job_id: job.id.clone(),
        title: job.title.clone(),
        code: code.to_string(),
        message,
    }
}
