use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A single application question and the generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Simulated applicant-tracking-system keyword match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    /// 0 – 100, rounded to 2 decimals
    pub score: f64,
    pub matched_keywords: BTreeSet<String>,
    pub missing_keywords: BTreeSet<String>,
}

impl AtsScore {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Keywords extracted for one job description.
///
/// `description_digest` is the SHA-256 of the description the keywords were
/// extracted from; a cache whose digest differs from the current description is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCache {
    pub keywords: Vec<String>,
    pub description_digest: String,
}

impl KeywordCache {
    pub fn new(description: &str, keywords: Vec<String>) -> Self {
        Self {
            keywords,
            description_digest: description_digest(description),
        }
    }

    pub fn is_valid_for(&self, description: &str) -> bool {
        self.description_digest == description_digest(description)
    }
}

fn description_digest(description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(description.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cover letter, resume content and Q&A generated for one job.
///
/// Created at generation, mutated in place by scoring, validation and
/// refinement, frozen by wrapping it in [`FinalizedMaterials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialsBundle {
    pub job_id: String,
    /// New on every (re)generation.
    pub generation_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Body text only, no header or contact block.
    pub cover_letter: String,
    pub resume_suggestions: Vec<String>,
    #[serde(default)]
    pub refined_resume: Option<String>,
    pub question_answers: Vec<QuestionAnswer>,
    #[serde(default)]
    pub ats_score: Option<AtsScore>,
    #[serde(default)]
    pub ats_keywords_cache: Option<KeywordCache>,
    #[serde(default)]
    pub validation_feedback: Vec<String>,
}

impl MaterialsBundle {
    pub fn new(
        job_id: impl Into<String>,
        cover_letter: String,
        resume_suggestions: Vec<String>,
        question_answers: Vec<QuestionAnswer>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            generation_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            cover_letter,
            resume_suggestions,
            refined_resume: None,
            question_answers,
            ats_score: None,
            ats_keywords_cache: None,
            validation_feedback: Vec::new(),
        }
    }

    /// Resume text the ATS sees: the refined resume when present, otherwise
    /// the suggestions joined by spaces.
    pub fn resume_text(&self) -> String {
        match &self.refined_resume {
            Some(resume) => resume.clone(),
            None => self.resume_suggestions.join(" "),
        }
    }

    /// Cover letter and resume text concatenated.
    pub fn ats_corpus(&self) -> String {
        format!("{} {}", self.cover_letter, self.resume_text())
    }
}

/// A bundle the caller accepted. Read-only from here on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedMaterials {
    materials: MaterialsBundle,
    finalized_at: DateTime<Utc>,
}

impl FinalizedMaterials {
    pub(crate) fn new(materials: MaterialsBundle) -> Self {
        Self {
            materials,
            finalized_at: Utc::now(),
        }
    }

    pub fn materials(&self) -> &MaterialsBundle {
        &self.materials
    }

    pub fn job_id(&self) -> &str {
        &self.materials.job_id
    }
}
