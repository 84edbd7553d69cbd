use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::payload::JobStatus;

pub const DEFAULT_JOB_TYPE: &str = "full-time";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_SALARY_PERIOD: &str = "year";
pub const DEFAULT_APPLICATION_METHOD: &str = "in_app";
pub const DEFAULT_VISIBILITY: &str = "public";
pub const DEFAULT_REMOTE_TYPE: &str = "remote";

/// A spoken-language requirement, e.g. English at "fluent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRequirement {
    pub language: String,
    #[serde(default)]
    pub proficiency: String,
}

/// Flat, UI-facing model of everything the posting wizard can edit.
///
/// Every field always holds a value: strings are `""` when empty, lists are
/// empty vectors, numbers and dates are `None`. Enum-like strings use the UI
/// spelling (`full-time`, `year`, `"Health Insurance"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    // Basic info
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub subcategory: String,
    pub job_type: String,
    pub experience_level: String,

    // Company
    pub company: String,
    pub company_website: String,
    pub company_size: String,
    pub industry: String,

    // Location
    pub location: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_remote: bool,
    pub remote_type: String,

    // Compensation
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: String,
    pub salary_period: String,
    pub is_negotiable: bool,
    pub is_confidential: bool,

    // Lists
    pub benefits: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub languages: Vec<LanguageRequirement>,
    pub other_requirements: Vec<String>,
    pub tags: Vec<String>,

    // Education / experience requirements
    pub education_level: String,
    pub education_field: String,
    pub education_required: bool,
    pub experience_years: Option<u32>,
    pub experience_description: String,

    // Application process
    pub application_method: String,
    pub deadline: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub contact_email: String,
    pub contact_phone: String,
    pub application_url: String,
    pub instructions: String,
    pub visibility: String,

    /// Status of the record this form was seeded from. Never written back;
    /// submits choose their own status.
    pub status: Option<JobStatus>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category_id: String::new(),
            subcategory: String::new(),
            job_type: DEFAULT_JOB_TYPE.to_string(),
            experience_level: String::new(),
            company: String::new(),
            company_website: String::new(),
            company_size: String::new(),
            industry: String::new(),
            location: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            latitude: None,
            longitude: None,
            is_remote: false,
            remote_type: String::new(),
            salary_min: None,
            salary_max: None,
            currency: DEFAULT_CURRENCY.to_string(),
            salary_period: DEFAULT_SALARY_PERIOD.to_string(),
            is_negotiable: false,
            is_confidential: false,
            benefits: Vec::new(),
            requirements: Vec::new(),
            responsibilities: Vec::new(),
            qualifications: Vec::new(),
            skills: Vec::new(),
            certifications: Vec::new(),
            languages: Vec::new(),
            other_requirements: Vec::new(),
            tags: Vec::new(),
            education_level: String::new(),
            education_field: String::new(),
            education_required: false,
            experience_years: None,
            experience_description: String::new(),
            application_method: DEFAULT_APPLICATION_METHOD.to_string(),
            deadline: None,
            start_date: None,
            contact_email: String::new(),
            contact_phone: String::new(),
            application_url: String::new(),
            instructions: String::new(),
            visibility: DEFAULT_VISIBILITY.to_string(),
            status: None,
        }
    }
}

/// The list-valued form fields that can be edited item by item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Benefits,
    Requirements,
    Responsibilities,
    Qualifications,
    Skills,
    Certifications,
    OtherRequirements,
    Tags,
}

impl ListField {
    pub fn name(&self) -> &'static str {
        match self {
            ListField::Benefits => "benefits",
            ListField::Requirements => "requirements",
            ListField::Responsibilities => "responsibilities",
            ListField::Qualifications => "qualifications",
            ListField::Skills => "skills",
            ListField::Certifications => "certifications",
            ListField::OtherRequirements => "otherRequirements",
            ListField::Tags => "tags",
        }
    }
}

impl FormState {
    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::Benefits => &self.benefits,
            ListField::Requirements => &self.requirements,
            ListField::Responsibilities => &self.responsibilities,
            ListField::Qualifications => &self.qualifications,
            ListField::Skills => &self.skills,
            ListField::Certifications => &self.certifications,
            ListField::OtherRequirements => &self.other_requirements,
            ListField::Tags => &self.tags,
        }
    }

    /// Returns a copy of the form with `field` replaced by `items`.
    pub fn with_list(self, field: ListField, items: Vec<String>) -> Self {
        match field {
            ListField::Benefits => Self { benefits: items, ..self },
            ListField::Requirements => Self { requirements: items, ..self },
            ListField::Responsibilities => Self { responsibilities: items, ..self },
            ListField::Qualifications => Self { qualifications: items, ..self },
            ListField::Skills => Self { skills: items, ..self },
            ListField::Certifications => Self { certifications: items, ..self },
            ListField::OtherRequirements => Self { other_requirements: items, ..self },
            ListField::Tags => Self { tags: items, ..self },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_canonical_empty_values() {
        let form = FormState::default();
        assert_eq!(form.title, "");
        assert_eq!(form.job_type, "full-time");
        assert_eq!(form.salary_period, "year");
        assert_eq!(form.visibility, "public");
        assert!(form.salary_min.is_none());
        assert!(form.benefits.is_empty());
        assert!(form.status.is_none());
    }

    #[test]
    fn test_partial_json_fills_missing_fields() {
        let form: FormState =
            serde_json::from_str(r#"{"title": "Barista", "salaryMin": 1200}"#).unwrap();
        assert_eq!(form.title, "Barista");
        assert_eq!(form.salary_min, Some(1200.0));
        assert_eq!(form.currency, "USD");
        assert!(form.languages.is_empty());
    }

    #[test]
    fn test_with_list_replaces_only_target_field() {
        let form = FormState {
            tags: vec!["urgent".to_string()],
            ..FormState::default()
        };
        let form = form.with_list(ListField::Skills, vec!["Rust".to_string()]);
        assert_eq!(form.list(ListField::Skills), ["Rust".to_string()]);
        assert_eq!(form.list(ListField::Tags), ["urgent".to_string()]);
    }
}
