use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default)]
    pub graduation_year: String,
}

/// The user's structured resume data. Owned externally; never mutated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_summary: String,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub suggested_keywords: Vec<String>,
}

/// Profile copy with every personally-identifying field removed.
///
/// Prompt builders only accept this type, so name, contact details and
/// location cannot leak into generated text or bias fit scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SanitizedProfile {
    pub skills: Vec<String>,
    pub experience_summary: String,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
}

impl Profile {
    pub fn sanitized(&self) -> SanitizedProfile {
        SanitizedProfile {
            skills: self.skills.clone(),
            experience_summary: self.experience_summary.clone(),
            work_experience: self.work_experience.clone(),
            education: self.education.clone(),
            salary_range: self.salary_range.clone(),
            industry: self.industry.clone(),
            work_type: self.work_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> Profile {
        Profile {
            name: Some("Jane Doe".to_string()),
            contact_info: Some(ContactInfo {
                email: "jane@example.com".to_string(),
                phone: "555-0100".to_string(),
                linkedin: "linkedin.com/in/janedoe".to_string(),
            }),
            location: Some("Berlin".to_string()),
            skills: vec!["Python".to_string(), "SQL".to_string()],
            experience_summary: "Data engineer with 6 years of experience.".to_string(),
            salary_range: Some("$100,000 - $120,000 USD".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitized_profile_serialization_has_no_pii() {
        let json = serde_json::to_string(&full_profile().sanitized()).unwrap();
        assert!(!json.contains("Jane"));
        assert!(!json.contains("jane@example.com"));
        assert!(!json.contains("555-0100"));
        assert!(!json.contains("linkedin"));
        assert!(!json.contains("Berlin"));
        assert!(!json.contains("\"location\""));
    }

    #[test]
    fn test_sanitized_profile_keeps_professional_fields() {
        let sanitized = full_profile().sanitized();
        assert_eq!(sanitized.skills, vec!["Python", "SQL"]);
        assert_eq!(
            sanitized.experience_summary,
            "Data engineer with 6 years of experience."
        );
        assert_eq!(
            sanitized.salary_range.as_deref(),
            Some("$100,000 - $120,000 USD")
        );
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: Profile = serde_json::from_str(r#"{"skills": ["Rust"]}"#).unwrap();
        assert_eq!(profile.skills, vec!["Rust"]);
        assert!(profile.name.is_none());
        assert!(profile.work_experience.is_empty());
    }
}
