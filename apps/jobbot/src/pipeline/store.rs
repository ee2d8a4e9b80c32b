//! JSON files under the data directory.
//!
//! Inputs: `profile.json`, `selected_jobs.json`.
//! Outputs: `generated_materials.json`, `edited_materials.json`, `failed_jobs.json`.
//! Outputs are written to a temp file in the same directory, then renamed.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::AppError;
use crate::models::{FinalizedMaterials, JobPosting, MaterialsBundle, Profile};
use crate::pipeline::batch::FailedJob;

pub const PROFILE_FILE: &str = "profile.json";
pub const SELECTED_JOBS_FILE: &str = "selected_jobs.json";
pub const GENERATED_FILE: &str = "generated_materials.json";
pub const EDITED_FILE: &str = "edited_materials.json";
pub const FAILED_FILE: &str = "failed_jobs.json";

#[derive(Debug, Clone)]
pub struct MaterialsStore {
    dir: PathBuf,
}

impl MaterialsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn load_profile(&self) -> Result<Profile, AppError> {
        self.read_required(PROFILE_FILE)
    }

    pub fn load_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        self.read_required(SELECTED_JOBS_FILE)
    }

    /// Merges `bundles` into `generated_materials.json`, replacing entries with the same job id.
    pub fn save_generated(&self, bundles: &[MaterialsBundle]) -> Result<(), AppError> {
        let existing: Vec<MaterialsBundle> = self.read_optional(GENERATED_FILE)?;
        let merged = merge_by_job_id(existing, bundles, |b| b.job_id.as_str());
        self.write_json(GENERATED_FILE, &merged)
    }

    /// Merges finalized bundles into `edited_materials.json`.
    pub fn save_finalized(&self, finalized: &[FinalizedMaterials]) -> Result<(), AppError> {
        let existing: Vec<FinalizedMaterials> = self.read_optional(EDITED_FILE)?;
        let merged = merge_by_job_id(existing, finalized, |f| f.job_id());
        self.write_json(EDITED_FILE, &merged)
    }

    /// Replaces `failed_jobs.json` with this run's failures.
    pub fn save_failed(&self, failed: &[FailedJob]) -> Result<(), AppError> {
        self.write_json(FAILED_FILE, &failed)
    }

    fn read_required<T: DeserializeOwned>(&self, file: &str) -> Result<T, AppError> {
        let path = self.path(file);
        if !path.exists() {
            return Err(AppError::MissingInput(path));
        }
        read_json(&path)
    }

    fn read_optional<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, AppError> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(T::default());
        }
        read_json(&path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), AppError> {
        let path = self.path(file);
        fs::create_dir_all(&self.dir).map_err(|e| AppError::io(&self.dir, e))?;

        let json = serde_json::to_vec_pretty(value).map_err(|e| AppError::json(&path, e))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| AppError::io(&self.dir, e))?;
        tmp.write_all(&json).map_err(|e| AppError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| AppError::io(&path, e.error))?;

        info!("Wrote {}", path.display());
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| AppError::json(path, e))
}

/// Existing entries for other jobs first, then `new` in order.
fn merge_by_job_id<T: Clone>(existing: Vec<T>, new: &[T], job_id: impl Fn(&T) -> &str) -> Vec<T> {
    let replaced: HashSet<&str> = new.iter().map(|item| job_id(item)).collect();
    let mut merged: Vec<T> = existing
        .into_iter()
        .filter(|item| !replaced.contains(job_id(item)))
        .collect();
    merged.extend(new.iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bundle(job_id: &str, letter: &str) -> MaterialsBundle {
        MaterialsBundle::new(job_id, letter.to_string(), vec![], vec![])
    }

    #[test]
    fn test_missing_inputs_are_reported() {
        let dir = tempdir().unwrap();
        let store = MaterialsStore::new(dir.path());
        let err = store.load_profile().unwrap_err();
        assert_eq!(err.code(), "MISSING_INPUT");
    }

    #[test]
    fn test_invalid_json_input() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SELECTED_JOBS_FILE), "{not json").unwrap();
        let err = MaterialsStore::new(dir.path()).load_jobs().unwrap_err();
        assert_eq!(err.code(), "JSON_ERROR");
    }

    #[test]
    fn test_loads_jobs_with_redirect_url_alias() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SELECTED_JOBS_FILE),
            r#"[{"id": "1", "title": "Engineer", "company": {"display_name": "Acme"},
                 "description": "Short", "redirect_url": "https://example.com/1"}]"#,
        )
        .unwrap();
        let jobs = MaterialsStore::new(dir.path()).load_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company_name(), "Acme");
        assert_eq!(jobs[0].url.as_deref(), Some("https://example.com/1"));
    }

    #[test]
    fn test_generated_materials_merge_by_job_id() {
        let dir = tempdir().unwrap();
        let store = MaterialsStore::new(dir.path());

        store
            .save_generated(&[bundle("a", "first"), bundle("b", "first")])
            .unwrap();
        store.save_generated(&[bundle("a", "second")]).unwrap();

        let saved: Vec<MaterialsBundle> = read_json(&store.path(GENERATED_FILE)).unwrap();
        let summary: Vec<(&str, &str)> = saved
            .iter()
            .map(|b| (b.job_id.as_str(), b.cover_letter.as_str()))
            .collect();
        assert_eq!(summary, vec![("b", "first"), ("a", "second")]);
    }

    #[test]
    fn test_finalized_round_trip_and_failed_overwrite() {
        let dir = tempdir().unwrap();
        let store = MaterialsStore::new(dir.path().join("nested"));

        let finalized = FinalizedMaterials::new(bundle("a", "letter"));
        store.save_finalized(std::slice::from_ref(&finalized)).unwrap();
        let saved: Vec<FinalizedMaterials> = read_json(&store.path(EDITED_FILE)).unwrap();
        assert_eq!(saved, vec![finalized]);

        let failure = FailedJob {
            job_id: "q".to_string(),
            title: "Role".to_string(),
            code: "QUOTA_EXCEEDED".to_string(),
            message: "quota".to_string(),
        };
        store.save_failed(&[failure]).unwrap();
        store.save_failed(&[]).unwrap();
        let raw = fs::read_to_string(store.path(FAILED_FILE)).unwrap();
        assert_eq!(raw.trim(), "[]");
    }
}
