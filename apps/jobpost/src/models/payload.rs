//! Outgoing create/update body for the job API.
//!
//! Optional keys are omitted rather than sent empty; the backend treats a
//! missing key as "leave unchanged".

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::form::LanguageRequirement;

/// Record status as stored by the backend. Unknown spellings are kept verbatim
/// so an existing record's status survives a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Active,
    Draft,
    Closed,
    Filled,
    Other(String),
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "open" => JobStatus::Active,
            "draft" => JobStatus::Draft,
            "closed" => JobStatus::Closed,
            "filled" => JobStatus::Filled,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Draft => "draft",
            JobStatus::Closed => "closed",
            JobStatus::Filled => "filled",
            JobStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two statuses the wizard is allowed to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Draft,
    /// Shown as "open" in the UI, stored as `active`.
    Open,
}

impl SubmitStatus {
    pub fn job_status(self) -> JobStatus {
        match self {
            SubmitStatus::Draft => JobStatus::Draft,
            SubmitStatus::Open => JobStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub title: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub job_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    pub company: CompanyPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<SalaryPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RequirementsPayload>,
    pub application_process: ApplicationProcessPayload,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub is_remote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinatesPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinatesPayload {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPayload {
    pub min: f64,
    pub max: f64,
    pub currency: String,
    pub period: String,
    pub is_negotiable: bool,
    pub is_confidential: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<LanguageRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<EducationPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperiencePayload>,
}

impl RequirementsPayload {
    pub fn is_empty(&self) -> bool {
        self == &RequirementsPayload::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPayload {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub is_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePayload {
    pub years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProcessPayload {
    pub application_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}
