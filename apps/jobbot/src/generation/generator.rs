//! Materials Generation — one structured generation call per job.
//!
//! Flow: extract questions → build prompt → generate_json (bounded retry) →
//!       normalize into a fresh `MaterialsBundle`.
//!
//! Hard failures (`MALFORMED_RESPONSE`, `QUOTA_EXCEEDED`, `GENERATION_FAILED`)
//! are returned to the orchestrator unchanged.

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::generation::prompt_builder::{build_materials_request, PromptConfig};
use crate::generation::questions::extract_questions;
use crate::llm_client::{GenerationClient, GenerationError};
use crate::models::{JobPosting, MaterialsBundle, QuestionAnswer, SanitizedProfile};

// ────────────────────────────────────────────────────────────────────────────
// Typed response boundary
// ────────────────────────────────────────────────────────────────────────────

/// The JSON object the model must return. Unknown keys are ignored;
/// a missing `cover_letter` makes the response malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedMaterials {
    pub cover_letter: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub resume_suggestions: Vec<String>,
    #[serde(default)]
    pub question_answers: Vec<RawQuestionAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestionAnswer {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accepts either a list of suggestions or one newline-separated bullet string.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::Many(items) => items,
        StringOrList::One(text) => text
            .lines()
            .map(|line| {
                let line = line.trim_start();
                ["- ", "* ", "• "]
                    .iter()
                    .find_map(|marker| line.strip_prefix(marker))
                    .unwrap_or(line)
                    .to_string()
            })
            .collect(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

impl GeneratedMaterials {
    pub fn into_bundle(self, job_id: &str) -> MaterialsBundle {
        let question_answers = self
            .question_answers
            .into_iter()
            .filter(|qa| !qa.question.trim().is_empty())
            .map(|qa| QuestionAnswer {
                question: qa.question.trim().to_string(),
                answer: qa.answer.trim().to_string(),
            })
            .collect();

        MaterialsBundle::new(
            job_id,
            self.cover_letter.trim().to_string(),
            self.resume_suggestions,
            question_answers,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Generates a fresh bundle for `job`. `instruction` is empty on the first attempt.
pub async fn generate_materials(
    client: &GenerationClient,
    job: &JobPosting,
    profile: &SanitizedProfile,
    instruction: &str,
) -> Result<MaterialsBundle, GenerationError> {
    info!("Generating materials for: {} ({})", job.title, job.id);

    let questions = extract_questions(job.description());
    let request = build_materials_request(&PromptConfig {
        profile,
        job,
        instruction,
        questions: &questions,
    })
    .map_err(|e| GenerationError::GenerationFailed(format!("Failed to build prompt: {e}")))?;

    let generated: GeneratedMaterials = client.generate_json(&request).await?;
    let bundle = generated.into_bundle(&job.id);

    info!(
        "Generated materials for {}: {} suggestions, {} answers",
        job.id,
        bundle.resume_suggestions.len(),
        bundle.question_answers.len()
    );
    Ok(bundle)
}
