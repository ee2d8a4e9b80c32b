// Per-job state machine, the bounded batch runner and on-disk persistence.

pub mod batch;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use batch::run_batch;
pub use orchestrator::PipelineServices;
pub use store::MaterialsStore;
