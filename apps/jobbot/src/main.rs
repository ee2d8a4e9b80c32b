mod config;
mod errors;
mod generation;
mod llm_client;
mod models;
mod pipeline;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::fit::evaluate_job_fit;
use crate::llm_client::{GeminiClient, GenerationClient};
use crate::pipeline::{run_batch, MaterialsStore, PipelineServices};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobbot v{}", env!("CARGO_PKG_VERSION"));

    // Inputs
    let store = MaterialsStore::new(&config.data_dir);
    let profile = store.load_profile()?;
    let jobs = store.load_jobs()?;
    info!(
        "Loaded profile ({} skills) and {} selected jobs from {}",
        profile.skills.len(),
        jobs.len(),
        config.data_dir.display()
    );

    // Initialize generation client
    let gemini = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
        config.pipeline.request_timeout,
    )?;
    info!("Generation client initialized (model: {})", gemini.model());
    let client = GenerationClient::new(
        Arc::new(gemini),
        config.pipeline.max_generation_attempts,
        config.pipeline.request_timeout,
    );

    if config.evaluate_fit {
        let sanitized = profile.sanitized();
        for job in &jobs {
            match evaluate_job_fit(&client, job, &sanitized, config.pipeline.description_chars).await {
                Ok(fit) => info!(
                    "Fit for '{}' at {}: {}/10 ({:.2}% skills) - {}",
                    job.title,
                    job.company_name(),
                    fit.fit_score,
                    fit.skill_match_percentage,
                    fit.explanation
                ),
                Err(e) => warn!("Could not evaluate fit for {} ({}): {}", job.id, e.code(), e),
            }
        }
    }

    let services = Arc::new(PipelineServices::new(client, config.pipeline.clone()));
    let report = run_batch(jobs, &profile, services).await;

    // Persist; one failed write should not lose the others
    let writes = [
        store.save_generated(&report.generated),
        store.save_finalized(&report.finalized),
        store.save_failed(&report.failed),
    ];
    let mut write_failures = 0;
    for result in writes {
        if let Err(e) = result {
            error!("Failed to persist results ({}): {}", e.code(), e);
            write_failures += 1;
        }
    }

    for failure in &report.failed {
        warn!(
            "Failed: {} '{}' [{}] {}",
            failure.job_id, failure.title, failure.code, failure.message
        );
    }
    info!(
        "Done: {} generated, {} finalized, {} failed",
        report.generated.len(),
        report.finalized.len(),
        report.failed.len()
    );

    if write_failures > 0 {
        anyhow::bail!("{write_failures} result file(s) could not be written");
    }
    Ok(())
}
