pub mod job;
pub mod materials;
pub mod profile;

pub use job::{Company, JobPosting};
pub use materials::{AtsScore, FinalizedMaterials, KeywordCache, MaterialsBundle, QuestionAnswer};
pub use profile::{ContactInfo, Profile, SanitizedProfile};
