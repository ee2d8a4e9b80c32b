use serde::{Deserialize, Serialize};

/// Hiring company as reported by the job board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub display_name: String,
}

/// A job posting produced by the search/scrape stage. Read-only to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: Company,
    /// Scraped full description (may contain HTML).
    #[serde(default)]
    pub full_description: Option<String>,
    /// Short description from the search API, used when no full description was scraped.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "redirect_url")]
    pub url: Option<String>,
    #[serde(default)]
    pub ats_url: Option<String>,
    /// e.g. "greenhouse", "lever", "workday"
    #[serde(default)]
    pub ats_platform: Option<String>,
}

impl JobPosting {
    /// The effective description: `full_description`, falling back to `description`.
    pub fn description(&self) -> &str {
        self.full_description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(self.description.as_deref())
            .unwrap_or("")
    }

    pub fn company_name(&self) -> &str {
        &self.company.display_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_prefers_full_description() {
        let job = JobPosting {
            id: "1".to_string(),
            full_description: Some("<p>Full text</p>".to_string()),
            description: Some("Snippet".to_string()),
            ..Default::default()
        };
        assert_eq!(job.description(), "<p>Full text</p>");
    }

    #[test]
    fn test_description_falls_back_when_full_is_blank() {
        let job = JobPosting {
            id: "1".to_string(),
            full_description: Some("   ".to_string()),
            description: Some("Snippet".to_string()),
            ..Default::default()
        };
        assert_eq!(job.description(), "Snippet");
    }

    #[test]
    fn test_description_empty_when_absent() {
        let job = JobPosting {
            id: "1".to_string(),
            ..Default::default()
        };
        assert_eq!(job.description(), "");
    }

    #[test]
    fn test_deserializes_adzuna_shape() {
        let json = r#"{
            "id": "4411",
            "title": "Backend Engineer",
            "company": {"display_name": "Test Corp"},
            "description": "We need Rust.",
            "redirect_url": "https://jobs.example.com/4411",
            "salary_min": 90000
        }"#;
        let job: JobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(job.company_name(), "Test Corp");
        assert_eq!(job.url.as_deref(), Some("https://jobs.example.com/4411"));
        assert_eq!(job.description(), "We need Rust.");
        assert!(job.ats_platform.is_none());
    }
}
