//! Read-side view of a job record as returned by the job API.
//!
//! The backend has accumulated several shapes over time, so every field is
//! decoded leniently: a value of the wrong type becomes `None` instead of
//! failing the whole record.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::payload::JobStatus;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiJobRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "lenient_string")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<CategoryField>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub experience_level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub company: Option<CompanyField>,
    /// Legacy top-level location; `company.location` takes precedence.
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<LocationField>,
    #[serde(default, deserialize_with = "lenient")]
    pub salary: Option<SalaryObject>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_negotiable: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_confidential: Option<bool>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub benefits: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub requirements: Option<RequirementsField>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub responsibilities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub qualifications: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub application_process: Option<ApplicationProcessObject>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub visibility: Option<String>,
}

impl ApiJobRecord {
    /// Decodes any JSON value. Non-objects yield an empty record.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Backend id, whichever of `id` / `_id` is present.
    pub fn job_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.object_id.as_deref())
    }
}

/// `category` is either a bare id or a populated `{_id, name}` reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryField {
    Id(String),
    Ref(CategoryRef),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "lenient_string")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

impl CategoryField {
    pub fn id(&self) -> Option<&str> {
        match self {
            CategoryField::Id(id) => Some(id.as_str()),
            CategoryField::Ref(r) => r.id.as_deref().or(r.object_id.as_deref()),
        }
    }
}

/// Older records store the company as a bare name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompanyField {
    Name(String),
    Details(CompanyObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyObject {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<LocationField>,
}

/// A location is either free text (legacy) or a structured address.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationField {
    Text(String),
    Details(LocationObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationObject {
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_remote: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub remote_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Coordinates {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryObject {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_negotiable: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_confidential: Option<bool>,
}

/// Current records nest requirements in an object; legacy ones carry a flat list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequirementsField {
    List(#[serde(deserialize_with = "strings")] Vec<String>),
    Details(RequirementsObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementsObject {
    #[serde(default, deserialize_with = "lenient_list")]
    pub skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub other: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub certifications: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub languages: Option<Vec<LanguageEntry>>,
    #[serde(default, deserialize_with = "lenient")]
    pub education: Option<EducationObject>,
    #[serde(default, deserialize_with = "lenient")]
    pub experience: Option<ExperienceObject>,
}

/// Languages are listed either by name or with a proficiency.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LanguageEntry {
    Name(String),
    Detailed {
        language: String,
        #[serde(default, deserialize_with = "lenient_string")]
        proficiency: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationObject {
    #[serde(default, deserialize_with = "lenient_string")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceObject {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub years: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProcessObject {
    #[serde(default, deserialize_with = "lenient_string")]
    pub application_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub application_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub instructions: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient decoders
// ────────────────────────────────────────────────────────────────────────────

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings, with numbers stringified (phone numbers, numeric ids).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n.trunc() as u32))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Arrays keep the elements that decode; anything else is `None`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Like `lenient_list` but rejects non-arrays, so untagged enums can fall through.
fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        other => Err(serde::de::Error::custom(format!(
            "expected a list of strings, got {other}"
        ))),
    }
}

/// Accepts `YYYY-MM-DD` and any timestamp starting with one; the time part is dropped.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_date_prefix(&s),
        _ => None,
    })
}

pub(crate) fn parse_date_prefix(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    s.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}
