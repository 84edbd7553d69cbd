pub mod enums;
pub mod mapper;
pub mod review;
pub mod validation;
pub mod wizard;

pub use enums::{to_api_enum, to_ui_enum, EnumKind};
pub use mapper::{from_api, to_api};
pub use review::{review_summary, ReviewSection};
pub use validation::{validate, validate_all, FieldErrors, StepFailure, WizardStep};
pub use wizard::{SessionPhase, SubmitOutcome, WizardSession};
