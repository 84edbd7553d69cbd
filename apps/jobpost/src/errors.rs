use thiserror::Error;

use crate::collaborators::Role;
use crate::posting::validation::{FieldErrors, WizardStep};

/// Operation-level failure from the job API. Never carries field errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not authorized to perform this action")]
    Unauthorized,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Job API returned an empty body")]
    EmptyBody,
}

/// Errors surfaced by a wizard session.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Cannot leave {step}: {errors}")]
    StepBlocked { step: WizardStep, errors: FieldErrors },

    #[error("Cannot publish, {step} is incomplete: {errors}")]
    PublishBlocked { step: WizardStep, errors: FieldErrors },

    #[error("Step index {0} is out of range (0..=5)")]
    StepOutOfRange(usize),

    #[error("Wizard session is closed")]
    SessionClosed,

    #[error("Role '{0}' may not post jobs")]
    Forbidden(Role),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),
}

impl WizardError {
    /// Field errors for validation refusals; `None` for every other kind.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            WizardError::StepBlocked { errors, .. } | WizardError::PublishBlocked { errors, .. } => {
                Some(errors)
            }
            _ => None,
        }
    }
}
