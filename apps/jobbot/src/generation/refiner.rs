//! Refinement — applies validation feedback to a bundle.
//!
//! Only `cover_letter` and `refined_resume` are rewritten, each on its own:
//! a missing or blank field keeps the current value. Everything else,
//! including the keyword cache, is carried over. On any failure the input
//! bundle is returned untouched.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::prompt_builder::fill_template;
use crate::generation::prompts::REFINE_PROMPT_TEMPLATE;
use crate::generation::validator::is_failure_sentinel;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerationClient, GenerationError, GenerationRequest};
use crate::models::MaterialsBundle;

#[derive(Serialize)]
struct RefineView<'a> {
    cover_letter: &'a str,
    refined_resume: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefinedMaterials {
    #[serde(default)]
    cover_letter: Option<String>,
    #[serde(default)]
    refined_resume: Option<String>,
}

/// Returns a revised copy of `materials`, or `materials` unchanged when the
/// feedback is empty, is only the validation-failure sentinel, or the call fails.
pub async fn refine_materials(
    client: &GenerationClient,
    materials: MaterialsBundle,
    feedback: &[String],
) -> MaterialsBundle {
    if feedback.is_empty() || is_failure_sentinel(feedback) {
        info!("No actionable feedback for {}; skipping refinement", materials.job_id);
        return materials;
    }

    match request_revision(client, &materials, feedback).await {
        Ok(revised) => {
            let cover_letter = non_blank(revised.cover_letter);
            let resume = non_blank(revised.refined_resume);
            if cover_letter.is_none() && resume.is_none() {
                warn!("Refinement for {} returned nothing usable; keeping original", materials.job_id);
                return materials;
            }

            let mut refined = materials;
            if let Some(cover_letter) = cover_letter {
                refined.cover_letter = cover_letter;
            }
            if resume.is_some() {
                refined.refined_resume = resume;
            }
            info!("Refined materials for {}", refined.job_id);
            refined
        }
        Err(e) => {
            warn!("Refinement failed for {} ({}): {}", materials.job_id, e.code(), e);
            materials
        }
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.map(|f| f.trim().to_string()).filter(|f| !f.is_empty())
}

async fn request_revision(
    client: &GenerationClient,
    materials: &MaterialsBundle,
    feedback: &[String],
) -> Result<RefinedMaterials, GenerationError> {
    let resume_text = materials.resume_text();
    let to_json = |e: serde_json::Error| {
        GenerationError::GenerationFailed(format!("Failed to build refinement prompt: {e}"))
    };
    let materials_json = serde_json::to_string_pretty(&RefineView {
        cover_letter: &materials.cover_letter,
        refined_resume: &resume_text,
    })
    .map_err(to_json)?;
    let feedback_json = serde_json::to_string_pretty(feedback).map_err(to_json)?;

    let prompt = fill_template(
        REFINE_PROMPT_TEMPLATE,
        &[
            ("materials_json", materials_json.as_str()),
            ("feedback_json", feedback_json.as_str()),
        ],
    );
    client
        .generate_json(&GenerationRequest::new(JSON_ONLY_SYSTEM, prompt))
        .await
}
