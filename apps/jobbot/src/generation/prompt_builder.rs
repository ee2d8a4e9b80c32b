//! Prompt Builder — turns (profile, job, instruction, questions) into a generation request.
//!
//! Pure: the same inputs always produce the same request. Wording lives in
//! `generation::prompts`; this module only serializes inputs and substitutes them.

use serde::Serialize;

use crate::generation::prompts::{
    MATERIALS_PROMPT_TEMPLATE, NO_INSTRUCTIONS, NO_QUESTIONS,
};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_PERSONAL_INFO_INSTRUCTION};
use crate::llm_client::GenerationRequest;
use crate::models::{JobPosting, SanitizedProfile};

/// Everything the materials prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptConfig<'a> {
    pub profile: &'a SanitizedProfile,
    pub job: &'a JobPosting,
    /// Free-form caller instruction; empty on the first generation attempt.
    pub instruction: &'a str,
    pub questions: &'a [String],
}

#[derive(Serialize)]
struct JobView<'a> {
    title: &'a str,
    company: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ats_platform: Option<&'a str>,
}

/// Builds the materials generation request.
pub fn build_materials_request(
    config: &PromptConfig<'_>,
) -> Result<GenerationRequest, serde_json::Error> {
    let profile_json = serde_json::to_string_pretty(config.profile)?;
    let job_json = serde_json::to_string_pretty(&JobView {
        title: &config.job.title,
        company: config.job.company_name(),
        description: config.job.description(),
        ats_platform: config.job.ats_platform.as_deref(),
    })?;

    let instruction = match config.instruction.trim() {
        "" => NO_INSTRUCTIONS.to_string(),
        text => text.to_string(),
    };
    let questions = if config.questions.is_empty() {
        NO_QUESTIONS.to_string()
    } else {
        serde_json::to_string(config.questions)?
    };

    let prompt = fill_template(
        MATERIALS_PROMPT_TEMPLATE,
        &[
            ("no_personal_info", NO_PERSONAL_INFO_INSTRUCTION),
            ("profile_json", profile_json.as_str()),
            ("job_json", job_json.as_str()),
            ("instruction", instruction.as_str()),
            ("questions", questions.as_str()),
        ],
    );

    Ok(GenerationRequest::new(JSON_ONLY_SYSTEM, prompt))
}

/// Substitutes `{key}` placeholders in a single pass over the template.
///
/// Substituted values are never re-scanned, so job text or instructions that
/// happen to contain `{...}` are inserted verbatim.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = values.iter().find(|(key, _)| {
            tail.len() > key.len() + 1
                && tail[1..].starts_with(key)
                && tail[1 + key.len()..].starts_with('}')
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// First `max_chars` characters of `text`, on a char boundary.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
