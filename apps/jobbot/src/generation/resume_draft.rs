//! Refined resume drafting: a full resume text built from the profile, the
//! job description and the generated suggestions. Best effort; `None` on failure.

use tracing::{info, warn};

use crate::generation::prompt_builder::{excerpt, fill_template};
use crate::generation::prompts::RESUME_DRAFT_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{NO_PERSONAL_INFO_INSTRUCTION, WRITER_SYSTEM};
use crate::llm_client::{GenerationClient, GenerationError, GenerationRequest};
use crate::models::{JobPosting, MaterialsBundle, SanitizedProfile};

pub async fn draft_resume(
    client: &GenerationClient,
    job: &JobPosting,
    profile: &SanitizedProfile,
    materials: &MaterialsBundle,
    description_chars: usize,
) -> Option<String> {
    match request_draft(client, job, profile, materials, description_chars).await {
        Ok(text) if !text.is_empty() => {
            info!("Drafted refined resume for {} ({} chars)", job.id, text.len());
            Some(text)
        }
        Ok(_) => {
            warn!("Resume draft for {} was empty", job.id);
            None
        }
        Err(e) => {
            warn!("Resume draft failed for {} ({}): {}", job.id, e.code(), e);
            None
        }
    }
}

async fn request_draft(
    client: &GenerationClient,
    job: &JobPosting,
    profile: &SanitizedProfile,
    materials: &MaterialsBundle,
    description_chars: usize,
) -> Result<String, GenerationError> {
    let to_failure =
        |e: serde_json::Error| GenerationError::GenerationFailed(format!("Failed to build resume prompt: {e}"));
    let profile_json = serde_json::to_string_pretty(profile).map_err(to_failure)?;
    let suggestions_json =
        serde_json::to_string_pretty(&materials.resume_suggestions).map_err(to_failure)?;

    let prompt = fill_template(
        RESUME_DRAFT_PROMPT_TEMPLATE,
        &[
            ("no_personal_info", NO_PERSONAL_INFO_INSTRUCTION),
            ("profile_json", profile_json.as_str()),
            ("description", excerpt(job.description(), description_chars)),
            ("suggestions_json", suggestions_json.as_str()),
        ],
    );
    client
        .generate_text(&GenerationRequest::new(WRITER_SYSTEM, prompt))
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::{client, Reply, ScriptedGenerator};
    use crate::models::Profile;

    const MARKER: &str = "Create a professional resume based on the applicant profile";

    fn job() -> JobPosting {
        JobPosting {
            id: "job-5".to_string(),
            full_description: Some("Need Terraform.".to_string()),
            ..Default::default()
        }
    }

    fn materials() -> MaterialsBundle {
        MaterialsBundle::new("job-5", "Letter".to_string(), vec!["Add **Terraform**".to_string()], vec![])
    }

    #[tokio::test]
    async fn test_draft_returns_trimmed_text() {
        let generator = Arc::new(ScriptedGenerator::new().on(
            MARKER,
            vec![Reply::Text("\n## Skills\n- Terraform\n".to_string())],
        ));
        let draft = draft_resume(
            &client(generator.clone()),
            &job(),
            &Profile::default().sanitized(),
            &materials(),
            4000,
        )
        .await;
        assert_eq!(draft.as_deref(), Some("## Skills\n- Terraform"));
        assert_eq!(generator.calls(MARKER), 1);
    }

    #[tokio::test]
    async fn test_failure_yields_none() {
        let generator = Arc::new(ScriptedGenerator::new().on(MARKER, vec![Reply::Quota]));
        let draft = draft_resume(
            &client(generator),
            &job(),
            &Profile::default().sanitized(),
            &materials(),
            4000,
        )
        .await;
        assert!(draft.is_none());
    }
}
