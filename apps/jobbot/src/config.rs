use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MODEL};

/// Tunables shared by every pipeline in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Jobs processed concurrently.
    pub workers: usize,
    /// Per generation request.
    pub request_timeout: Duration,
    /// Result pages fetched by the job search stage.
    pub max_pages: u32,
    /// Oldest posting age the job search stage accepts.
    pub max_age_days: u32,
    /// Total attempts for a structured call that keeps returning malformed JSON.
    pub max_generation_attempts: u32,
    pub max_keywords: usize,
    /// Characters of the job description sent with keyword, resume and fit prompts.
    pub description_chars: usize,
    /// Consecutive quota failures that trigger a cooldown.
    pub quota_failure_threshold: u32,
    pub quota_cooldown: Duration,
    /// Draft a full resume from the suggestions before scoring.
    pub draft_resume: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            request_timeout: Duration::from_secs(30),
            max_pages: 3,
            max_age_days: 15,
            max_generation_attempts: DEFAULT_MAX_ATTEMPTS,
            max_keywords: 20,
            description_chars: 4000,
            quota_failure_threshold: 2,
            quota_cooldown: Duration::from_secs(60),
            draft_resume: true,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub data_dir: PathBuf,
    pub evaluate_fit: bool,
    pub rust_log: String,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            workers: parse_env("JOBBOT_WORKERS", defaults.workers)?.max(1),
            request_timeout: Duration::from_secs(parse_env(
                "JOBBOT_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            max_generation_attempts: parse_env(
                "JOBBOT_MAX_ATTEMPTS",
                defaults.max_generation_attempts,
            )?
            .max(1),
            quota_cooldown: Duration::from_secs(parse_env(
                "JOBBOT_QUOTA_COOLDOWN_SECS",
                defaults.quota_cooldown.as_secs(),
            )?),
            draft_resume: parse_env("JOBBOT_DRAFT_RESUME", defaults.draft_resume)?,
            ..defaults
        };

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            data_dir: std::env::var("JOBBOT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            evaluate_fit: parse_env("JOBBOT_EVALUATE_FIT", false)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            pipeline,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.workers, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.max_age_days, 15);
        assert_eq!(config.max_generation_attempts, 3);
        assert_eq!(config.quota_failure_threshold, 2);
        assert!(config.draft_resume);
    }

    #[test]
    fn test_parse_env_reports_bad_values() {
        std::env::set_var("JOBBOT_TEST_WORKERS_BAD", "five");
        let err = parse_env::<usize>("JOBBOT_TEST_WORKERS_BAD", 5).unwrap_err();
        assert!(err.to_string().contains("JOBBOT_TEST_WORKERS_BAD"));

        std::env::set_var("JOBBOT_TEST_WORKERS_OK", " 8 ");
        assert_eq!(parse_env::<usize>("JOBBOT_TEST_WORKERS_OK", 5).unwrap(), 8);
        assert_eq!(parse_env::<usize>("JOBBOT_TEST_WORKERS_UNSET", 5).unwrap(), 5);
    }
}
