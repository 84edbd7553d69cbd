//! Schema mapping between the flat wizard form and the nested job record.
//!
//! `from_api` is a liberal reader: every legacy shape is accepted and anything
//! missing or malformed becomes the field's empty value. `to_api` is a sparse
//! writer: optional groups are emitted only when they carry data.

use tracing::debug;

use crate::models::form::{
    DEFAULT_APPLICATION_METHOD, DEFAULT_CURRENCY, DEFAULT_JOB_TYPE, DEFAULT_REMOTE_TYPE,
    DEFAULT_SALARY_PERIOD, DEFAULT_VISIBILITY,
};
use crate::models::payload::{
    ApplicationProcessPayload, CompanyPayload, CoordinatesPayload, EducationPayload,
    ExperiencePayload, LocationPayload, RequirementsPayload, SalaryPayload,
};
use crate::models::record::{
    CompanyField, LanguageEntry, LocationField, LocationObject, RequirementsField,
    RequirementsObject,
};
use crate::models::{ApiJobRecord, FormState, JobPayload, LanguageRequirement, SubmitStatus};
use crate::posting::enums::{to_api_enum, to_ui_enum, EnumKind};

// ────────────────────────────────────────────────────────────────────────────
// Source resolution
// ────────────────────────────────────────────────────────────────────────────

/// Where a record's location was found.
#[derive(Debug, Clone, Copy)]
pub enum LocationSource<'a> {
    NestedUnderCompany(&'a LocationField),
    TopLevel(&'a LocationField),
}

impl<'a> LocationSource<'a> {
    pub fn field(&self) -> &'a LocationField {
        match *self {
            LocationSource::NestedUnderCompany(field) | LocationSource::TopLevel(field) => field,
        }
    }
}

/// `company.location` wins over the legacy top-level `location`.
pub fn resolve_location(record: &ApiJobRecord) -> Option<LocationSource<'_>> {
    let nested = match &record.company {
        Some(CompanyField::Details(company)) => company.location.as_ref(),
        _ => None,
    };
    match (nested, record.location.as_ref()) {
        (Some(nested), _) => Some(LocationSource::NestedUnderCompany(nested)),
        (None, Some(top)) => Some(LocationSource::TopLevel(top)),
        (None, None) => None,
    }
}

/// Company name, website, size and industry, whichever shape the record uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFields {
    pub name: String,
    pub website: String,
    pub size: String,
    pub industry: String,
}

pub fn resolve_company(record: &ApiJobRecord) -> CompanyFields {
    match &record.company {
        Some(CompanyField::Name(name)) => CompanyFields {
            name: name.clone(),
            ..CompanyFields::default()
        },
        Some(CompanyField::Details(company)) => CompanyFields {
            name: text(&company.name),
            website: text(&company.website),
            size: text(&company.size),
            industry: text(&company.industry),
        },
        None => CompanyFields::default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Record → form
// ────────────────────────────────────────────────────────────────────────────

/// Builds a fully populated form from a fetched record. Never fails.
pub fn from_api(record: &ApiJobRecord) -> FormState {
    log_legacy_shapes(record);

    let company = resolve_company(record);
    let mut form = FormState {
        title: text(&record.title),
        description: text(&record.description),
        category_id: record
            .category
            .as_ref()
            .and_then(|c| c.id())
            .unwrap_or_default()
            .to_string(),
        subcategory: text(&record.subcategory),
        job_type: record
            .job_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| to_ui_enum(EnumKind::JobType, t))
            .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string()),
        experience_level: text(&record.experience_level),
        company: company.name,
        company_website: company.website,
        company_size: company.size,
        industry: company.industry,
        benefits: record
            .benefits
            .iter()
            .flatten()
            .map(|b| to_ui_enum(EnumKind::Benefit, b))
            .collect(),
        responsibilities: record.responsibilities.clone().unwrap_or_default(),
        qualifications: record.qualifications.clone().unwrap_or_default(),
        tags: record.tags.clone().unwrap_or_default(),
        visibility: non_empty_or(&record.visibility, DEFAULT_VISIBILITY),
        status: record.status.clone(),
        ..FormState::default()
    };

    if let Some(source) = resolve_location(record) {
        apply_location(&mut form, source.field());
    }
    apply_salary(&mut form, record);
    match &record.requirements {
        Some(RequirementsField::List(items)) => form.requirements = items.clone(),
        Some(RequirementsField::Details(reqs)) => apply_requirements(&mut form, reqs),
        None => {}
    }
    if let Some(process) = &record.application_process {
        form.application_method =
            non_empty_or(&process.application_method, DEFAULT_APPLICATION_METHOD);
        form.deadline = process.deadline;
        form.start_date = process.start_date;
        form.contact_email = text(&process.contact_email);
        form.contact_phone = text(&process.contact_phone);
        form.application_url = text(&process.application_url);
        form.instructions = text(&process.instructions);
    }

    form
}

fn apply_location(form: &mut FormState, field: &LocationField) {
    match field {
        LocationField::Text(address) => form.location = address.clone(),
        LocationField::Details(location) => apply_location_object(form, location),
    }
}

fn apply_location_object(form: &mut FormState, location: &LocationObject) {
    form.location = text(&location.address);
    form.city = text(&location.city);
    form.state = text(&location.state);
    form.country = text(&location.country);
    if let Some(coords) = location.coordinates {
        if let (Some(lat), Some(lng)) = (coords.lat, coords.lng) {
            form.latitude = Some(lat);
            form.longitude = Some(lng);
        }
    }
    form.is_remote = location.is_remote.unwrap_or(false);
    form.remote_type = match location.remote_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ if form.is_remote => DEFAULT_REMOTE_TYPE.to_string(),
        _ => String::new(),
    };
}

fn apply_salary(form: &mut FormState, record: &ApiJobRecord) {
    let salary = record.salary.clone().unwrap_or_default();
    form.salary_min = salary.min;
    form.salary_max = salary.max;
    form.currency = non_empty_or(&salary.currency, DEFAULT_CURRENCY);
    form.salary_period = salary
        .period
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|p| to_ui_enum(EnumKind::SalaryPeriod, p))
        .unwrap_or_else(|| DEFAULT_SALARY_PERIOD.to_string());
    form.is_negotiable = salary
        .is_negotiable
        .or(record.is_negotiable)
        .unwrap_or(false);
    form.is_confidential = salary
        .is_confidential
        .or(record.is_confidential)
        .unwrap_or(false);
}

fn apply_requirements(form: &mut FormState, reqs: &RequirementsObject) {
    form.skills = reqs.skills.clone().unwrap_or_default();
    form.other_requirements = reqs.other.clone().unwrap_or_default();
    form.certifications = reqs.certifications.clone().unwrap_or_default();
    form.languages = reqs
        .languages
        .iter()
        .flatten()
        .map(|entry| match entry {
            LanguageEntry::Name(language) => LanguageRequirement {
                language: language.clone(),
                proficiency: String::new(),
            },
            LanguageEntry::Detailed {
                language,
                proficiency,
            } => LanguageRequirement {
                language: language.clone(),
                proficiency: text(proficiency),
            },
        })
        .collect();

    if let Some(education) = &reqs.education {
        form.education_level = text(&education.level);
        form.education_field = text(&education.field);
        form.education_required = education.is_required.unwrap_or(false);
    }
    if let Some(experience) = &reqs.experience {
        form.experience_years = experience.years;
        form.experience_description = text(&experience.description);
        if form.experience_level.is_empty() {
            form.experience_level = text(&experience.level);
        }
    }
}

fn log_legacy_shapes(record: &ApiJobRecord) {
    if matches!(record.company, Some(CompanyField::Name(_))) {
        debug!("job {:?}: company stored as bare name", record.job_id());
    }
    if let Some(LocationSource::TopLevel(_)) = resolve_location(record) {
        debug!("job {:?}: using top-level location", record.job_id());
    }
    if matches!(record.requirements, Some(RequirementsField::List(_))) {
        debug!("job {:?}: requirements stored as flat list", record.job_id());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Form → payload
// ────────────────────────────────────────────────────────────────────────────

/// Builds the sparse create/update body for `form` with the requested status.
pub fn to_api(form: &FormState, status: SubmitStatus) -> JobPayload {
    JobPayload {
        title: form.title.trim().to_string(),
        description: form.description.trim().to_string(),
        category: form.category_id.trim().to_string(),
        subcategory: form.subcategory.trim().to_string(),
        job_type: to_api_enum(EnumKind::JobType, &form.job_type),
        experience_level: non_empty(&form.experience_level),
        company: CompanyPayload {
            name: form.company.trim().to_string(),
            website: non_empty(&form.company_website),
            size: non_empty(&form.company_size),
            industry: non_empty(&form.industry),
            location: location_payload(form),
        },
        salary: salary_payload(form),
        benefits: non_empty_list(&form.benefits).map(|benefits| {
            benefits
                .iter()
                .map(|b| to_api_enum(EnumKind::Benefit, b))
                .collect()
        }),
        requirements: requirements_payload(form),
        application_process: ApplicationProcessPayload {
            application_method: non_empty(&form.application_method)
                .unwrap_or_else(|| DEFAULT_APPLICATION_METHOD.to_string()),
            deadline: form.deadline,
            start_date: form.start_date,
            contact_email: non_empty(&form.contact_email),
            contact_phone: non_empty(&form.contact_phone),
            application_url: non_empty(&form.application_url),
            instructions: non_empty(&form.instructions),
        },
        status: status.job_status(),
        responsibilities: non_empty_list(&form.responsibilities),
        qualifications: non_empty_list(&form.qualifications),
        tags: non_empty_list(&form.tags),
        visibility: non_empty(&form.visibility).filter(|v| v != DEFAULT_VISIBILITY),
    }
}

fn location_payload(form: &FormState) -> Option<LocationPayload> {
    let coordinates = match (form.latitude, form.longitude) {
        (Some(lat), Some(lng)) => Some(CoordinatesPayload { lat, lng }),
        _ => None,
    };
    let location = LocationPayload {
        address: form.location.trim().to_string(),
        city: non_empty(&form.city),
        state: non_empty(&form.state),
        country: non_empty(&form.country),
        is_remote: form.is_remote,
        remote_type: non_empty(&form.remote_type),
        coordinates,
    };

    let has_any = !location.address.is_empty()
        || location.city.is_some()
        || location.state.is_some()
        || location.country.is_some()
        || location.is_remote
        || location.remote_type.is_some()
        || location.coordinates.is_some();
    has_any.then_some(location)
}

/// Only a complete range is sent.
fn salary_payload(form: &FormState) -> Option<SalaryPayload> {
    let (min, max) = (form.salary_min?, form.salary_max?);
    Some(SalaryPayload {
        min,
        max,
        currency: non_empty(&form.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        period: to_api_enum(EnumKind::SalaryPeriod, &form.salary_period),
        is_negotiable: form.is_negotiable,
        is_confidential: form.is_confidential,
    })
}

fn requirements_payload(form: &FormState) -> Option<RequirementsPayload> {
    // The flat legacy list has no slot of its own in the nested shape.
    let mut other = form.other_requirements.clone();
    for item in &form.requirements {
        if !other.iter().any(|o| o.trim().eq_ignore_ascii_case(item.trim())) {
            other.push(item.clone());
        }
    }

    let languages: Vec<LanguageRequirement> = form
        .languages
        .iter()
        .filter(|l| !l.language.trim().is_empty())
        .map(|l| LanguageRequirement {
            language: l.language.trim().to_string(),
            proficiency: l.proficiency.trim().to_string(),
        })
        .collect();

    let reqs = RequirementsPayload {
        skills: non_empty_list(&form.skills),
        other: non_empty_list(&other),
        certifications: non_empty_list(&form.certifications),
        languages: (!languages.is_empty()).then_some(languages),
        education: non_empty(&form.education_level).map(|level| EducationPayload {
            level,
            field: non_empty(&form.education_field),
            is_required: form.education_required,
        }),
        experience: form.experience_years.map(|years| ExperiencePayload {
            years,
            description: non_empty(&form.experience_description),
        }),
    };
    (!reqs.is_empty()).then_some(reqs)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn non_empty_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_empty_list(items: &[String]) -> Option<Vec<String>> {
    let items: Vec<String> = items.iter().filter_map(|i| non_empty(i)).collect();
    (!items.is_empty()).then_some(items)
}
