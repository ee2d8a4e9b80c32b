//! ATS Scoring — simulated applicant-tracking-system keyword match.
//!
//! Keywords come from one extraction call per job description and are cached
//! on the bundle, so re-scoring after refinement never calls the service again.
//!
//! Algorithm (`score_materials`):
//! 1. corpus = cover letter + resume text (refined resume, else joined suggestions)
//! 2. matched = keywords whose lower-case form occurs in the lower-case corpus
//! 3. missing = keywords − matched
//! 4. score = 100 × |matched| / |keywords|, rounded to 2 decimals; 0 when no keywords
//!
//! Scoring is advisory: every failure degrades to a zero score.

use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;
use tracing::{info, warn};

use crate::generation::prompt_builder::{excerpt, fill_template};
use crate::generation::prompts::KEYWORDS_PROMPT_TEMPLATE;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerationClient, GenerationError, GenerationRequest};
use crate::models::{AtsScore, JobPosting, KeywordCache, MaterialsBundle};

pub const DEFAULT_MAX_KEYWORDS: usize = 20;
pub const DEFAULT_DESCRIPTION_CHARS: usize = 4000;

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordResponse {
    List(Vec<String>),
    Object { keywords: Vec<String> },
}

/// Extracts salient keywords from a job description via the generation service.
#[derive(Clone)]
pub struct KeywordExtractor {
    client: GenerationClient,
    max_keywords: usize,
    description_chars: usize,
}

impl KeywordExtractor {
    pub fn new(client: GenerationClient, max_keywords: usize, description_chars: usize) -> Self {
        Self {
            client,
            max_keywords,
            description_chars,
        }
    }

    pub async fn extract(&self, description: &str) -> Result<Vec<String>, GenerationError> {
        let max_keywords = self.max_keywords.to_string();
        let prompt = fill_template(
            KEYWORDS_PROMPT_TEMPLATE,
            &[
                ("max_keywords", max_keywords.as_str()),
                ("description", excerpt(description, self.description_chars)),
            ],
        );
        let request = GenerationRequest::new(JSON_ONLY_SYSTEM, prompt);

        let raw = match self.client.generate_json::<KeywordResponse>(&request).await? {
            KeywordResponse::List(keywords) | KeywordResponse::Object { keywords } => keywords,
        };
        Ok(normalize_keywords(raw, self.max_keywords))
    }
}

/// Trims, drops empties, de-duplicates case-insensitively (first spelling wins)
/// and keeps at most `max` keywords in their original order.
pub fn normalize_keywords(raw: Vec<String>, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(max)
        .collect()
}

/// Pure keyword match of `materials` against `keywords`.
pub fn score_materials(keywords: &[String], materials: &MaterialsBundle) -> AtsScore {
    let keyword_set: BTreeSet<String> = keywords.iter().cloned().collect();
    if keyword_set.is_empty() {
        return AtsScore::zero();
    }

    let corpus = materials.ats_corpus().to_lowercase();
    let (matched, missing): (BTreeSet<String>, BTreeSet<String>) = keyword_set
        .into_iter()
        .partition(|k| corpus.contains(&k.to_lowercase()));

    let total = matched.len() + missing.len();
    let score = round2(matched.len() as f64 / total as f64 * 100.0);

    AtsScore {
        score,
        matched_keywords: matched,
        missing_keywords: missing,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores bundles against a job, maintaining the bundle's keyword cache.
#[derive(Clone)]
pub struct AtsScorer {
    extractor: KeywordExtractor,
}

impl AtsScorer {
    pub fn new(extractor: KeywordExtractor) -> Self {
        Self { extractor }
    }

    /// Scores `materials` against `job`, extracting keywords when no valid
    /// cache exists. Stores the result in `materials.ats_score`. Never fails.
    pub async fn score(&self, job: &JobPosting, materials: &mut MaterialsBundle) -> AtsScore {
        let description = job.description();
        let score = if description.trim().is_empty() {
            warn!("Job {} has no description; ATS score is 0", job.id);
            AtsScore::zero()
        } else {
            match self.cached_keywords(job, materials).await {
                Some(keywords) => score_materials(&keywords, materials),
                None => AtsScore::zero(),
            }
        };
        record(job, materials, score)
    }

    /// Scores against the cached keywords only; never calls the service.
    /// Without a cache valid for the current description the score is 0.
    pub fn rescore(&self, job: &JobPosting, materials: &mut MaterialsBundle) -> AtsScore {
        let score = match &materials.ats_keywords_cache {
            Some(cache) if cache.is_valid_for(job.description()) => {
                score_materials(&cache.keywords, materials)
            }
            _ => {
                warn!("No keyword cache for {}; rescore is 0", job.id);
                AtsScore::zero()
            }
        };
        record(job, materials, score)
    }

    /// Returns the cached keywords when they belong to the current description,
    /// extracting (and caching) them otherwise.
    async fn cached_keywords(
        &self,
        job: &JobPosting,
        materials: &mut MaterialsBundle,
    ) -> Option<Vec<String>> {
        let description = job.description();

        if let Some(cache) = &materials.ats_keywords_cache {
            if cache.is_valid_for(description) {
                info!("Using cached ATS keywords for {}", job.id);
                return Some(cache.keywords.clone());
            }
            info!("Job description changed for {}; dropping keyword cache", job.id);
            materials.ats_keywords_cache = None;
        }

        if materials.ats_corpus().trim().is_empty() {
            warn!("Materials for {} are empty; skipping keyword extraction", job.id);
            return None;
        }

        match self.extractor.extract(description).await {
            Ok(keywords) => {
                info!("Extracted and cached {} ATS keywords for {}", keywords.len(), job.id);
                materials.ats_keywords_cache = Some(KeywordCache::new(description, keywords.clone()));
                Some(keywords)
            }
            Err(e) => {
                warn!("Error extracting ATS keywords for {}: {}", job.id, e);
                None
            }
        }
    }
}

fn record(job: &JobPosting, materials: &mut MaterialsBundle, score: AtsScore) -> AtsScore {
    info!(
        "ATS score for {}: {:.2}% ({} matched, {} missing)",
        job.id,
        score.score,
        score.matched_keywords.len(),
        score.missing_keywords.len()
    );
    materials.ats_score = Some(score.clone());
    score
}
