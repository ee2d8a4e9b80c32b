//! Validation — a career-coach review of a bundle.
//!
//! Always yields a feedback list. Service failures collapse to the single
//! sentinel item so the orchestrator can tell "no feedback" from "no review".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::prompt_builder::fill_template;
use crate::generation::prompts::VALIDATION_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{IGNORE_PERSONAL_INFO_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{GenerationClient, GenerationRequest};
use crate::models::{MaterialsBundle, QuestionAnswer};

pub const VALIDATION_FAILED: &str = "Failed to get validation";

/// Contact details are stripped on purpose, so feedback asking for them is noise.
/// Matches a request or absence phrase directly attached to a personal-info term:
/// "add your phone number", "missing contact information", "email address is missing".
static PERSONAL_INFO_COMPLAINT: Lazy<Regex> = Lazy::new(|| {
    let info = r"(?:contact\s+(?:information|info|details)|phone\s+number|email\s+address|(?:mailing|home)\s+address)";
    let name = r"(?:your|applicant'?s|candidate'?s)\s+(?:full\s+)?name";
    let trigger = r"(?:add|include|provide|missing|lacks?|lacking|without|no)";
    Regex::new(&format!(
        r"(?i)\b{trigger}\s+(?:(?:your|the|a|an|applicant'?s|candidate'?s)\s+)?{info}\b|\b{trigger}\s+{name}\b|\b(?:{info}|{name})\s+(?:is|are)\s+(?:missing|absent|not\s+(?:included|provided|listed))\b"
    ))
    .expect("personal info pattern is valid")
});

#[derive(Serialize)]
struct ReviewView<'a> {
    cover_letter: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refined_resume: Option<&'a str>,
    resume_suggestions: &'a [String],
    question_answers: &'a [QuestionAnswer],
}

#[derive(Deserialize)]
struct ValidationResponse {
    #[serde(default)]
    validation_feedback: Vec<String>,
}

pub fn is_failure_sentinel(feedback: &[String]) -> bool {
    !feedback.is_empty() && feedback.iter().all(|item| item == VALIDATION_FAILED)
}

/// Reviews `materials` and returns actionable feedback; empty means "no changes".
pub async fn validate_materials(client: &GenerationClient, materials: &MaterialsBundle) -> Vec<String> {
    let view = ReviewView {
        cover_letter: &materials.cover_letter,
        refined_resume: materials.refined_resume.as_deref(),
        resume_suggestions: &materials.resume_suggestions,
        question_answers: &materials.question_answers,
    };
    let materials_json = match serde_json::to_string_pretty(&view) {
        Ok(json) => json,
        Err(e) => {
            warn!("Could not serialize materials for {}: {}", materials.job_id, e);
            return vec![VALIDATION_FAILED.to_string()];
        }
    };

    let prompt = fill_template(
        VALIDATION_PROMPT_TEMPLATE,
        &[
            ("ignore_personal_info", IGNORE_PERSONAL_INFO_INSTRUCTION),
            ("materials_json", materials_json.as_str()),
        ],
    );
    let request = GenerationRequest::new(JSON_ONLY_SYSTEM, prompt);

    match client.generate_json::<ValidationResponse>(&request).await {
        Ok(response) => {
            let feedback: Vec<String> = response
                .validation_feedback
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty() && !mentions_personal_info(item))
                .collect();
            info!("Validation for {}: {} feedback items", materials.job_id, feedback.len());
            feedback
        }
        Err(e) => {
            warn!("Validation failed for {} ({}): {}", materials.job_id, e.code(), e);
            vec![VALIDATION_FAILED.to_string()]
        }
    }
}

fn mentions_personal_info(item: &str) -> bool {
    PERSONAL_INFO_COMPLAINT.is_match(item)
}
