pub mod form;
pub mod payload;
pub mod record;

pub use form::{FormState, LanguageRequirement, ListField};
pub use payload::{JobPayload, JobStatus, SubmitStatus};
pub use record::ApiJobRecord;
