//! How well the profile matches a posting.
//!
//! Two signals:
//! - `skill_match_percentage`: share of profile skills that appear in the
//!   description (case-insensitive substring), computed locally
//! - `fit_score`: the model's 1–10 rating with a short explanation and role summary
//!
//! Informational only. Nothing ranks or filters jobs by it.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generation::prompt_builder::{excerpt, fill_template};
use crate::generation::prompts::FIT_PROMPT_TEMPLATE;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerationClient, GenerationError, GenerationRequest};
use crate::models::{JobPosting, SanitizedProfile};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFit {
    pub job_id: String,
    /// 1 – 10
    pub fit_score: u8,
    pub explanation: String,
    pub summary: String,
    /// 0 – 100, rounded to 2 decimals
    pub skill_match_percentage: f64,
    pub matched_skills: Vec<String>,
}

#[derive(Deserialize)]
struct FitResponse {
    fit_score: f64,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    summary: String,
}

/// Profile skills found in `description`, lower-cased and sorted, with their share.
pub fn skill_match(skills: &[String], description: &str) -> (f64, Vec<String>) {
    let lowered: Vec<String> = skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if lowered.is_empty() {
        return (0.0, Vec::new());
    }

    let description = description.to_lowercase();
    let mut matched: Vec<String> = lowered
        .iter()
        .filter(|skill| description.contains(skill.as_str()))
        .cloned()
        .collect();
    matched.sort();
    matched.dedup();

    let hits = lowered
        .iter()
        .filter(|skill| description.contains(skill.as_str()))
        .count();
    let percentage = (hits as f64 / lowered.len() as f64 * 10_000.0).round() / 100.0;
    (percentage, matched)
}

pub async fn evaluate_job_fit(
    client: &GenerationClient,
    job: &JobPosting,
    profile: &SanitizedProfile,
    description_chars: usize,
) -> Result<JobFit, GenerationError> {
    let profile_json = serde_json::to_string_pretty(profile)
        .map_err(|e| GenerationError::GenerationFailed(format!("Failed to build fit prompt: {e}")))?;
    let prompt = fill_template(
        FIT_PROMPT_TEMPLATE,
        &[
            ("profile_json", profile_json.as_str()),
            ("description", excerpt(job.description(), description_chars)),
        ],
    );

    let response: FitResponse = client
        .generate_json(&GenerationRequest::new(JSON_ONLY_SYSTEM, prompt))
        .await?;
    let (skill_match_percentage, matched_skills) = skill_match(&profile.skills, job.description());

    let fit = JobFit {
        job_id: job.id.clone(),
        fit_score: response.fit_score.round().clamp(1.0, 10.0) as u8,
        explanation: response.explanation.trim().to_string(),
        summary: response.summary.trim().to_string(),
        skill_match_percentage,
        matched_skills,
    };
    info!(
        "Job fit for {}: {}/10, skill match {:.2}%",
        job.id, fit.fit_score, fit.skill_match_percentage
    );
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::{client, Reply, ScriptedGenerator};
    use crate::models::Profile;
    use serde_json::json;

    const MARKER: &str = "Rate the job fit on a scale of 1-10";

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_skill_match_counts_case_insensitively() {
        let (pct, matched) =
            skill_match(&skills(&["SQL", "Python", "Go Lang"]), "We use python and sql daily.");
        assert_eq!(pct, 66.67);
        assert_eq!(matched, vec!["python".to_string(), "sql".to_string()]);
    }

    #[test]
    fn test_skill_match_without_skills_is_zero() {
        assert_eq!(skill_match(&[], "anything"), (0.0, Vec::new()));
    }

    #[tokio::test]
    async fn test_fit_score_is_clamped() {
        let generator = Arc::new(ScriptedGenerator::new().on(
            MARKER,
            vec![Reply::json(json!({
                "fit_score": 14,
                "explanation": "Strong overlap",
                "summary": "Data role"
            }))],
        ));
        let job = JobPosting {
            id: "job-9".to_string(),
            full_description: Some("Python and SQL".to_string()),
            ..Default::default()
        };
        let profile = Profile {
            skills: skills(&["Python", "Rust"]),
            ..Default::default()
        }
        .sanitized();

        let fit = evaluate_job_fit(&client(generator), &job, &profile, 4000)
            .await
            .unwrap();
        assert_eq!(fit.fit_score, 10);
        assert_eq!(fit.skill_match_percentage, 50.0);
        assert_eq!(fit.matched_skills, vec!["python".to_string()]);
        assert_eq!(fit.summary, "Data role");
    }

    #[tokio::test]
    async fn test_missing_fit_score_is_malformed() {
        let generator = Arc::new(
            ScriptedGenerator::new().on(MARKER, vec![Reply::json(json!({"explanation": "?"}))]),
        );
        let err = evaluate_job_fit(
            &client(generator),
            &JobPosting::default(),
            &Profile::default().sanitized(),
            4000,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_RESPONSE");
    }
}
