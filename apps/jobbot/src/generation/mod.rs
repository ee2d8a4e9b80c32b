// Materials generation stages.
// Every stage talks to the generation service through llm_client::GenerationClient;
// none of them track pipeline state, that belongs to crate::pipeline.

pub mod ats;
pub mod fit;
pub mod generator;
pub mod prompt_builder;
pub mod prompts;
pub mod questions;
pub mod refiner;
pub mod resume_draft;
pub mod validator;
