//! Pipeline Orchestrator — drives one job through the materials lifecycle.
//!
//! Each operation checks the current state first; a call from the wrong state
//! returns `InvalidTransition` and changes nothing. Only generation failures are
//! hard: they move the job to `Failed`. Scoring, validation, drafting and
//! refinement degrade in place and always advance.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::generation::ats::{AtsScorer, KeywordExtractor};
use crate::generation::generator::generate_materials;
use crate::generation::refiner::refine_materials;
use crate::generation::resume_draft::draft_resume;
use crate::generation::validator::validate_materials;
use crate::llm_client::{GenerationClient, GenerationError};
use crate::models::{AtsScore, FinalizedMaterials, JobPosting, MaterialsBundle, SanitizedProfile};
use crate::pipeline::state::{PipelineState, Transition};

/// Immutable dependencies shared by every pipeline in a batch.
pub struct PipelineServices {
    pub client: GenerationClient,
    pub scorer: AtsScorer,
    pub config: PipelineConfig,
}

impl PipelineServices {
    pub fn new(client: GenerationClient, config: PipelineConfig) -> Self {
        let extractor =
            KeywordExtractor::new(client.clone(), config.max_keywords, config.description_chars);
        Self {
            client,
            scorer: AtsScorer::new(extractor),
            config,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot {action} in state {state}")]
    InvalidTransition {
        state: PipelineState,
        action: &'static str,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// What a full run produced for one job.
#[derive(Debug)]
pub enum PipelineOutcome {
    Finalized(FinalizedMaterials),
    Failed {
        job_id: String,
        error: GenerationError,
    },
}

pub struct MaterialsPipeline {
    job: JobPosting,
    profile: Arc<SanitizedProfile>,
    services: Arc<PipelineServices>,
    state: PipelineState,
    materials: Option<MaterialsBundle>,
    /// Snapshot of the bundle as it came out of the latest generation.
    generated: Option<MaterialsBundle>,
    history: Vec<Transition>,
}

impl MaterialsPipeline {
    pub fn new(
        job: JobPosting,
        profile: Arc<SanitizedProfile>,
        services: Arc<PipelineServices>,
    ) -> Self {
        Self {
            job,
            profile,
            services,
            state: PipelineState::Initial,
            materials: None,
            generated: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn materials(&self) -> Option<&MaterialsBundle> {
        self.materials.as_ref()
    }

    pub fn generated(&self) -> Option<&MaterialsBundle> {
        self.generated.as_ref()
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// INITIAL → GENERATED, or FAILED on a hard generation error.
    pub async fn generate(&mut self) -> Result<(), PipelineError> {
        self.require(PipelineState::Initial, "generate")?;
        self.generate_with("", "generate").await
    }

    /// Discards the current bundle and generates a new one with `instruction`.
    pub async fn regenerate(&mut self, instruction: &str) -> Result<(), PipelineError> {
        if !self.state.can_regenerate() {
            return Err(invalid(self.state, "regenerate"));
        }
        self.materials = None;
        self.generate_with(instruction, "regenerate").await
    }

    /// GENERATED → SCORED. Drafts a full resume first when configured to.
    pub async fn score(&mut self) -> Result<AtsScore, PipelineError> {
        self.require(PipelineState::Generated, "score")?;
        let services = Arc::clone(&self.services);
        let Some(materials) = self.materials.as_mut() else {
            return Err(invalid(self.state, "score"));
        };

        if services.config.draft_resume && materials.refined_resume.is_none() {
            let draft = draft_resume(
                &services.client,
                &self.job,
                &self.profile,
                materials,
                services.config.description_chars,
            )
            .await;
            materials.refined_resume = draft;
        }

        let score = services.scorer.score(&self.job, materials).await;
        self.transition(PipelineState::Scored, "score");
        Ok(score)
    }

    /// SCORED → VALIDATED. Returns the feedback stored on the bundle.
    pub async fn validate(&mut self) -> Result<Vec<String>, PipelineError> {
        self.require(PipelineState::Scored, "validate")?;
        let services = Arc::clone(&self.services);
        let Some(materials) = self.materials.as_mut() else {
            return Err(invalid(self.state, "validate"));
        };

        let feedback = validate_materials(&services.client, materials).await;
        materials.validation_feedback = feedback.clone();
        self.transition(PipelineState::Validated, "validate");
        Ok(feedback)
    }

    /// VALIDATED → REFINED, applying the stored validation feedback.
    pub async fn refine(&mut self) -> Result<(), PipelineError> {
        self.require(PipelineState::Validated, "refine")?;
        let Some(materials) = self.materials.take() else {
            return Err(invalid(self.state, "refine"));
        };

        let feedback = materials.validation_feedback.clone();
        let refined = refine_materials(&self.services.client, materials, &feedback).await;
        self.materials = Some(refined);
        self.transition(PipelineState::Refined, "refine");
        Ok(())
    }

    /// REFINED → RESCORED against the keywords cached at SCORED. Never
    /// extracts: without a cache the score is 0.
    pub fn rescore(&mut self) -> Result<AtsScore, PipelineError> {
        self.require(PipelineState::Refined, "rescore")?;
        let services = Arc::clone(&self.services);
        let Some(materials) = self.materials.as_mut() else {
            return Err(invalid(self.state, "rescore"));
        };

        let score = services.scorer.rescore(&self.job, materials);
        self.transition(PipelineState::Rescored, "rescore");
        Ok(score)
    }

    /// RESCORED → FINALIZED. The bundle leaves the pipeline read-only.
    pub fn finalize(&mut self) -> Result<FinalizedMaterials, PipelineError> {
        self.require(PipelineState::Rescored, "finalize")?;
        let Some(materials) = self.materials.take() else {
            return Err(invalid(self.state, "finalize"));
        };

        self.transition(PipelineState::Finalized, "finalize");
        Ok(FinalizedMaterials::new(materials))
    }

    /// Any non-terminal state → SKIPPED.
    pub fn skip(&mut self) -> Result<(), PipelineError> {
        if self.state.is_terminal() {
            return Err(invalid(self.state, "skip"));
        }
        self.transition(PipelineState::Skipped, "skip");
        Ok(())
    }

    /// Runs every stage in order from INITIAL.
    ///
    /// A hard generation failure is an outcome, not an error; `Err` means the
    /// pipeline was not in INITIAL.
    pub async fn run(&mut self) -> Result<PipelineOutcome, PipelineError> {
        self.require(PipelineState::Initial, "run")?;

        match self.generate().await {
            Ok(()) => {}
            Err(PipelineError::Generation(error)) => {
                return Ok(PipelineOutcome::Failed {
                    job_id: self.job.id.clone(),
                    error,
                })
            }
            Err(e) => return Err(e),
        }

        Ok(PipelineOutcome::Finalized(self.complete().await?))
    }

    /// Runs score, validate, refine, rescore and finalize from GENERATED.
    pub async fn complete(&mut self) -> Result<FinalizedMaterials, PipelineError> {
        self.require(PipelineState::Generated, "complete")?;
        self.score().await?;
        self.validate().await?;
        self.refine().await?;
        self.rescore()?;
        self.finalize()
    }

    // ── Internals ───────────────────────────────────────────────────────────

    async fn generate_with(
        &mut self,
        instruction: &str,
        action: &'static str,
    ) -> Result<(), PipelineError> {
        let result =
            generate_materials(&self.services.client, &self.job, &self.profile, instruction).await;

        match result {
            Ok(bundle) => {
                self.generated = Some(bundle.clone());
                self.materials = Some(bundle);
                self.transition(PipelineState::Generated, action);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Generation failed for {} ({}): {}",
                    self.job.id,
                    e.code(),
                    e
                );
                self.materials = None;
                self.transition(PipelineState::Failed, action);
                Err(e.into())
            }
        }
    }

    fn require(&self, expected: PipelineState, action: &'static str) -> Result<(), PipelineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(invalid(self.state, action))
        }
    }

    fn transition(&mut self, to: PipelineState, action: &'static str) {
        info!("Job {}: {} -> {} ({})", self.job.id, self.state, to, action);
        self.history.push(Transition {
            from: self.state,
            to,
            action,
            at: Utc::now(),
        });
        self.state = to;
    }
}

fn invalid(state: PipelineState, action: &'static str) -> PipelineError {
    PipelineError::InvalidTransition { state, action }
}
