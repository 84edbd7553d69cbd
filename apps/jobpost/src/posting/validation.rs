use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::FormState;

/// Field keys used in [`FieldErrors`]. They match the form's JSON field names;
/// `salary` is a synthetic key covering the min/max pair.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "categoryId";
    pub const COMPANY: &str = "company";
    pub const LOCATION: &str = "location";
    pub const SALARY: &str = "salary";
}

/// One page of the posting wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInfo,
    Company,
    JobDetails,
    Requirements,
    Application,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::BasicInfo,
        WizardStep::Company,
        WizardStep::JobDetails,
        WizardStep::Requirements,
        WizardStep::Application,
        WizardStep::Review,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "Basic Info",
            WizardStep::Company => "Company",
            WizardStep::JobDetails => "Job Details",
            WizardStep::Requirements => "Requirements",
            WizardStep::Application => "Application Process",
            WizardStep::Review => "Review",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.index(), self.title())
    }
}

/// Field name → human message. Empty means the step is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|field, _| keep(field));
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

/// The first step that failed during a full-form check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: WizardStep,
    pub errors: FieldErrors,
}

/// Validates the fields owned by `step`.
///
/// Requirements, application process and review carry only optional fields
/// and never fail.
pub fn validate(form: &FormState, step: WizardStep) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match step {
        WizardStep::BasicInfo => {
            if is_blank(&form.title) {
                errors.insert(fields::TITLE, "Job title is required");
            }
            if is_blank(&form.description) {
                errors.insert(fields::DESCRIPTION, "Job description is required");
            }
            if is_blank(&form.category_id) {
                errors.insert(fields::CATEGORY, "Please select a category");
            }
        }
        WizardStep::Company => {
            if is_blank(&form.company) {
                errors.insert(fields::COMPANY, "Company name is required");
            }
            if is_blank(&form.location) {
                errors.insert(fields::LOCATION, "Location is required");
            }
        }
        WizardStep::JobDetails => {
            if let (Some(min), Some(max)) = (form.salary_min, form.salary_max) {
                if min > max {
                    errors.insert(
                        fields::SALARY,
                        "Minimum salary cannot be greater than maximum",
                    );
                }
            }
        }
        WizardStep::Requirements | WizardStep::Application | WizardStep::Review => {}
    }

    errors
}

/// Runs steps 0..=4 in order and stops at the first one with errors.
pub fn validate_all(form: &FormState) -> Result<(), StepFailure> {
    for step in WizardStep::ALL
        .into_iter()
        .filter(|s| *s != WizardStep::Review)
    {
        let errors = validate(form, step);
        if !errors.is_empty() {
            return Err(StepFailure { step, errors });
        }
    }
    Ok(())
}

/// Every failing field across all steps.
pub fn failing_fields(form: &FormState) -> FieldErrors {
    let mut all = FieldErrors::new();
    for step in WizardStep::ALL {
        all.extend(validate(form, step));
    }
    all
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
