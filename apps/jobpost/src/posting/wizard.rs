//! Wizard controller: owns one posting session and gates every transition.
//!
//! Flow: edit fields → `go_to_step` validates the step being left →
//! `save_draft` submits without checks / `publish` re-checks steps 0..=4 →
//! `to_api` → job API. A successful submit closes the session.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api_client::JobSubmitter;
use crate::collaborators::{ensure_can_post, ReverseGeocoder, Role};
use crate::errors::WizardError;
use crate::models::{ApiJobRecord, FormState, LanguageRequirement, ListField, SubmitStatus};
use crate::posting::mapper::{from_api, to_api};
use crate::posting::validation::{failing_fields, validate, validate_all, FieldErrors, WizardStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Editing,
    /// Submitted successfully; the caller should navigate away.
    Closed { job_id: Option<String> },
}

/// Result of a successful draft save or publish.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub job_id: Option<String>,
    pub status: SubmitStatus,
    pub record: ApiJobRecord,
}

/// Ephemeral state of one wizard screen: current step, live form, field errors.
///
/// Submit methods take `&mut self`, so a second submit cannot start while one
/// is in flight.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    job_id: Option<String>,
    current_step: WizardStep,
    form: FormState,
    errors: FieldErrors,
    phase: SessionPhase,
}

impl WizardSession {
    /// Empty session for a new posting.
    pub fn create(role: Role) -> Result<Self, WizardError> {
        Self::with_form(role, None, FormState::default())
    }

    /// Session seeded from an existing record.
    pub fn edit(
        role: Role,
        job_id: impl Into<String>,
        record: &ApiJobRecord,
    ) -> Result<Self, WizardError> {
        Self::with_form(role, Some(job_id.into()), from_api(record))
    }

    /// Session over a prepared form; `job_id` selects update instead of create.
    pub fn with_form(
        role: Role,
        job_id: Option<String>,
        form: FormState,
    ) -> Result<Self, WizardError> {
        ensure_can_post(role)?;
        let session = Self {
            id: Uuid::new_v4(),
            job_id,
            current_step: WizardStep::BasicInfo,
            form,
            errors: FieldErrors::new(),
            phase: SessionPhase::Editing,
        };
        info!(
            "Wizard session {} opened (role={}, job={:?})",
            session.id, role, session.job_id
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, SessionPhase::Closed { .. })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Form edits
    // ────────────────────────────────────────────────────────────────────────

    /// Replaces the form with `f(old_form)`.
    ///
    /// Errors for fields that now pass are dropped; an edit never adds errors.
    pub fn update_form(&mut self, f: impl FnOnce(FormState) -> FormState) -> Result<(), WizardError> {
        self.ensure_editing()?;
        self.form = f(std::mem::take(&mut self.form));
        if !self.errors.is_empty() {
            let still_failing = failing_fields(&self.form);
            self.errors.retain(|field| still_failing.contains(field));
        }
        Ok(())
    }

    /// Appends a trimmed item; blanks and case-insensitive duplicates are ignored.
    /// Returns whether the list changed.
    pub fn add_list_item(&mut self, field: ListField, value: &str) -> Result<bool, WizardError> {
        let value = value.trim();
        let existing = self.form.list(field);
        if value.is_empty() || existing.iter().any(|i| i.eq_ignore_ascii_case(value)) {
            return Ok(false);
        }
        let mut items = existing.to_vec();
        items.push(value.to_string());
        self.update_form(|form| form.with_list(field, items))?;
        Ok(true)
    }

    /// Removes the item at `index`; out-of-range indices are ignored.
    pub fn remove_list_item(&mut self, field: ListField, index: usize) -> Result<bool, WizardError> {
        let mut items = self.form.list(field).to_vec();
        if index >= items.len() {
            return Ok(false);
        }
        items.remove(index);
        self.update_form(|form| form.with_list(field, items))?;
        Ok(true)
    }

    /// Adds a language, or replaces the proficiency of one already listed.
    pub fn add_language(&mut self, language: &str, proficiency: &str) -> Result<bool, WizardError> {
        let language = language.trim();
        if language.is_empty() {
            return Ok(false);
        }
        let entry = LanguageRequirement {
            language: language.to_string(),
            proficiency: proficiency.trim().to_string(),
        };
        let mut languages = self.form.languages.clone();
        match languages
            .iter_mut()
            .find(|l| l.language.eq_ignore_ascii_case(language))
        {
            Some(existing) => *existing = entry,
            None => languages.push(entry),
        }
        self.update_form(|form| FormState { languages, ..form })?;
        Ok(true)
    }

    pub fn remove_language(&mut self, index: usize) -> Result<bool, WizardError> {
        let mut languages = self.form.languages.clone();
        if index >= languages.len() {
            return Ok(false);
        }
        languages.remove(index);
        self.update_form(|form| FormState { languages, ..form })?;
        Ok(true)
    }

    /// Fills coordinates and address fields from a reverse-geocoding lookup.
    ///
    /// A failed lookup is logged and leaves the form untouched; returns whether
    /// the form changed.
    pub async fn prefill_location(
        &mut self,
        geocoder: &dyn ReverseGeocoder,
        lat: f64,
        lng: f64,
    ) -> Result<bool, WizardError> {
        self.ensure_editing()?;
        let address = match geocoder.reverse(lat, lng).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Session {}: reverse geocoding failed: {e:#}", self.id);
                return Ok(false);
            }
        };
        let keep_or = |current: String, found: &str| {
            if found.trim().is_empty() {
                current
            } else {
                found.trim().to_string()
            }
        };
        self.update_form(|form| FormState {
            latitude: Some(lat),
            longitude: Some(lng),
            location: keep_or(form.location, &address.street),
            city: keep_or(form.city, &address.city),
            state: keep_or(form.state, &address.region),
            country: keep_or(form.country, &address.country),
            ..form
        })?;
        Ok(true)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Navigation
    // ────────────────────────────────────────────────────────────────────────

    /// Moves to `target`. Backward or same-step moves always succeed; forward
    /// moves require the current step to validate.
    pub fn go_to_step(&mut self, target: WizardStep) -> Result<(), WizardError> {
        self.ensure_editing()?;
        if target <= self.current_step {
            debug!(
                "Session {}: {} -> {}",
                self.id, self.current_step, target
            );
            self.current_step = target;
            return Ok(());
        }

        let errors = validate(&self.form, self.current_step);
        if !errors.is_empty() {
            warn!(
                "Session {}: blocked leaving {} ({} field errors)",
                self.id,
                self.current_step,
                errors.len()
            );
            self.errors = errors.clone();
            return Err(WizardError::StepBlocked {
                step: self.current_step,
                errors,
            });
        }

        debug!("Session {}: {} -> {}", self.id, self.current_step, target);
        self.current_step = target;
        self.errors = FieldErrors::new();
        Ok(())
    }

    pub fn go_to_step_index(&mut self, index: usize) -> Result<(), WizardError> {
        let target = WizardStep::from_index(index).ok_or(WizardError::StepOutOfRange(index))?;
        self.go_to_step(target)
    }

    /// Forward one step; stays put on the review step.
    pub fn next(&mut self) -> Result<(), WizardError> {
        match self.current_step.next() {
            Some(step) => self.go_to_step(step),
            None => self.ensure_editing(),
        }
    }

    /// Back one step; stays put on the first step.
    pub fn back(&mut self) -> Result<(), WizardError> {
        match self.current_step.previous() {
            Some(step) => self.go_to_step(step),
            None => self.ensure_editing(),
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Submission
    // ────────────────────────────────────────────────────────────────────────

    /// Saves as draft. No validation gate.
    pub async fn save_draft(
        &mut self,
        submitter: &dyn JobSubmitter,
    ) -> Result<SubmitOutcome, WizardError> {
        self.ensure_editing()?;
        info!("Session {}: saving draft", self.id);
        self.submit(submitter, SubmitStatus::Draft).await
    }

    /// Publishes after re-checking every step before review. On failure the
    /// session jumps to the first failing step and shows its errors.
    pub async fn publish(
        &mut self,
        submitter: &dyn JobSubmitter,
    ) -> Result<SubmitOutcome, WizardError> {
        self.ensure_editing()?;
        if let Err(failure) = validate_all(&self.form) {
            warn!(
                "Session {}: publish blocked at {} ({} field errors)",
                self.id,
                failure.step,
                failure.errors.len()
            );
            self.current_step = failure.step;
            self.errors = failure.errors.clone();
            return Err(WizardError::PublishBlocked {
                step: failure.step,
                errors: failure.errors,
            });
        }
        info!("Session {}: publishing", self.id);
        self.submit(submitter, SubmitStatus::Open).await
    }

    async fn submit(
        &mut self,
        submitter: &dyn JobSubmitter,
        status: SubmitStatus,
    ) -> Result<SubmitOutcome, WizardError> {
        let payload = to_api(&self.form, status);
        let result = match &self.job_id {
            Some(job_id) => submitter.update(job_id, &payload).await,
            None => submitter.create(&payload).await,
        };

        match result {
            Ok(record) => {
                let job_id = record
                    .job_id()
                    .map(str::to_string)
                    .or_else(|| self.job_id.clone());
                info!(
                    "Session {}: submitted as {} (job={:?})",
                    self.id,
                    status.job_status(),
                    job_id
                );
                self.phase = SessionPhase::Closed {
                    job_id: job_id.clone(),
                };
                Ok(SubmitOutcome {
                    job_id,
                    status,
                    record,
                })
            }
            Err(e) => {
                warn!("Session {}: submit failed: {}", self.id, e);
                Err(WizardError::Submit(e))
            }
        }
    }

    fn ensure_editing(&self) -> Result<(), WizardError> {
        match self.phase {
            SessionPhase::Editing => Ok(()),
            SessionPhase::Closed { .. } => Err(WizardError::SessionClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::collaborators::GeocodedAddress;
    use crate::errors::SubmitError;
    use crate::models::{JobPayload, JobStatus};

    /// Records every payload it receives; fails while `fail` is set.
    #[derive(Default)]
    struct FakeSubmitter {
        fail: Mutex<bool>,
        calls: Mutex<Vec<(Option<String>, JobPayload)>>,
    }

    impl FakeSubmitter {
        fn failing() -> Self {
            Self {
                fail: Mutex::new(true),
                ..Self::default()
            }
        }

        fn record(&self, job_id: Option<&str>, payload: &JobPayload) -> Result<ApiJobRecord, SubmitError> {
            self.calls
                .lock()
                .unwrap()
                .push((job_id.map(str::to_string), payload.clone()));
            if *self.fail.lock().unwrap() {
                return Err(SubmitError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(ApiJobRecord::from_value(json!({
                "_id": job_id.unwrap_or("new-1"),
                "status": payload.status.as_str()
            })))
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl JobSubmitter for FakeSubmitter {
        async fn create(&self, payload: &JobPayload) -> Result<ApiJobRecord, SubmitError> {
            self.record(None, payload)
        }

        async fn update(&self, job_id: &str, payload: &JobPayload) -> Result<ApiJobRecord, SubmitError> {
            self.record(Some(job_id), payload)
        }
    }

    struct FixedGeocoder(Option<GeocodedAddress>);

    #[async_trait]
    impl ReverseGeocoder for FixedGeocoder {
        async fn reverse(&self, _lat: f64, _lng: f64) -> anyhow::Result<GeocodedAddress> {
            self.0.clone().ok_or_else(|| anyhow!("no result"))
        }
    }

    fn complete_form() -> FormState {
        FormState {
            title: "Warehouse Associate".to_string(),
            description: "Pick and pack orders".to_string(),
            category_id: "logistics".to_string(),
            company: "Parcel Co".to_string(),
            location: "9 Dock Rd".to_string(),
            salary_min: Some(15.0),
            salary_max: Some(18.0),
            salary_period: "hour".to_string(),
            ..FormState::default()
        }
    }

    fn session_with(form: FormState) -> WizardSession {
        WizardSession::with_form(Role::Provider, None, form).unwrap()
    }

    #[test]
    fn test_create_requires_posting_role() {
        assert!(matches!(
            WizardSession::create(Role::Seeker),
            Err(WizardError::Forbidden(Role::Seeker))
        ));
        let session = WizardSession::create(Role::Admin).unwrap();
        assert_eq!(session.current_step(), WizardStep::BasicInfo);
        assert_eq!(session.form(), &FormState::default());
    }

    #[test]
    fn test_forward_blocked_on_blank_title() {
        let mut session = session_with(FormState {
            title: String::new(),
            ..complete_form()
        });
        let err = session.go_to_step(WizardStep::Company).unwrap_err();
        assert!(matches!(err, WizardError::StepBlocked { step: WizardStep::BasicInfo, .. }));
        assert_eq!(session.current_step(), WizardStep::BasicInfo);
        assert_eq!(session.errors().get("title"), Some("Job title is required"));
    }

    #[test]
    fn test_forward_allowed_when_step_valid_and_errors_cleared() {
        let mut session = session_with(complete_form());
        session.go_to_step(WizardStep::Company).unwrap();
        assert_eq!(session.current_step(), WizardStep::Company);
        assert!(session.errors().is_empty());
    }

    #[test]
    fn test_gate_matches_step_validation_everywhere() {
        let forms = [
            complete_form(),
            FormState::default(),
            FormState {
                company: String::new(),
                ..complete_form()
            },
            FormState {
                salary_min: Some(9.0),
                salary_max: Some(1.0),
                ..complete_form()
            },
        ];
        for form in forms {
            for step in WizardStep::ALL {
                let Some(next) = step.next() else { continue };
                let mut session = session_with(form.clone());
                session.current_step = step;
                let blocked = session.go_to_step(next).is_err();
                assert_eq!(blocked, !validate(&form, step).is_empty(), "step {step}");

                for earlier in WizardStep::ALL.iter().filter(|s| **s <= step) {
                    let mut session = session_with(form.clone());
                    session.current_step = step;
                    assert!(session.go_to_step(*earlier).is_ok());
                    assert_eq!(session.current_step(), *earlier);
                }
            }
        }
    }

    #[test]
    fn test_backward_never_blocked() {
        let mut session = session_with(complete_form());
        session.go_to_step(WizardStep::JobDetails).unwrap();
        session.update_form(|form| FormState { title: String::new(), ..form }).unwrap();
        session.back().unwrap();
        assert_eq!(session.current_step(), WizardStep::Company);
        session.go_to_step(WizardStep::BasicInfo).unwrap();
        assert_eq!(session.current_step(), WizardStep::BasicInfo);
    }

    #[test]
    fn test_step_index_out_of_range() {
        let mut session = session_with(complete_form());
        assert!(matches!(
            session.go_to_step_index(6),
            Err(WizardError::StepOutOfRange(6))
        ));
        session.go_to_step_index(5).unwrap();
        assert_eq!(session.current_step(), WizardStep::Review);
        session.next().unwrap();
        assert_eq!(session.current_step(), WizardStep::Review);
    }

    #[test]
    fn test_edit_clears_fixed_errors_only() {
        let mut session = session_with(FormState {
            title: String::new(),
            description: String::new(),
            ..complete_form()
        });
        assert!(session.next().is_err());
        assert_eq!(session.errors().len(), 2);

        session
            .update_form(|form| FormState { title: "Picker".to_string(), ..form })
            .unwrap();
        assert!(!session.errors().contains("title"));
        assert!(session.errors().contains("description"));
    }

    #[test]
    fn test_edit_does_not_add_errors() {
        let mut session = session_with(complete_form());
        session
            .update_form(|form| FormState { company: String::new(), ..form })
            .unwrap();
        assert!(session.errors().is_empty());
    }

    #[test]
    fn test_list_editing() {
        let mut session = session_with(complete_form());
        assert!(session.add_list_item(ListField::Skills, " Forklift ").unwrap());
        assert!(!session.add_list_item(ListField::Skills, "forklift").unwrap());
        assert!(!session.add_list_item(ListField::Skills, "   ").unwrap());
        assert!(session.add_list_item(ListField::Tags, "urgent").unwrap());
        assert_eq!(session.form().skills, vec!["Forklift"]);
        assert!(session.remove_list_item(ListField::Skills, 0).unwrap());
        assert!(!session.remove_list_item(ListField::Skills, 0).unwrap());
        assert!(session.form().skills.is_empty());
        assert_eq!(session.form().tags, vec!["urgent"]);
    }

    #[test]
    fn test_language_editing_replaces_proficiency() {
        let mut session = session_with(complete_form());
        session.add_language("English", "basic").unwrap();
        session.add_language("english", "fluent").unwrap();
        session.add_language("Polish", "").unwrap();
        assert_eq!(session.form().languages.len(), 2);
        assert_eq!(session.form().languages[0].proficiency, "fluent");
        session.remove_language(1).unwrap();
        assert_eq!(session.form().languages.len(), 1);
    }

    #[tokio::test]
    async fn test_prefill_location_from_geocoder() {
        let mut session = session_with(FormState {
            location: String::new(),
            country: "Ireland".to_string(),
            ..complete_form()
        });
        let geocoder = FixedGeocoder(Some(GeocodedAddress {
            street: "1 Quay St".to_string(),
            city: "Galway".to_string(),
            region: "Connacht".to_string(),
            country: String::new(),
        }));
        assert!(session.prefill_location(&geocoder, 53.27, -9.05).await.unwrap());
        let form = session.form();
        assert_eq!(form.location, "1 Quay St");
        assert_eq!(form.city, "Galway");
        assert_eq!(form.state, "Connacht");
        assert_eq!(form.country, "Ireland");
        assert_eq!(form.latitude, Some(53.27));
    }

    #[tokio::test]
    async fn test_prefill_location_failure_is_silent() {
        let mut session = session_with(complete_form());
        let before = session.form().clone();
        assert!(!session.prefill_location(&FixedGeocoder(None), 1.0, 2.0).await.unwrap());
        assert_eq!(session.form(), &before);
        assert!(session.errors().is_empty());
    }

    #[tokio::test]
    async fn test_save_draft_skips_validation() {
        let submitter = FakeSubmitter::default();
        let mut session = session_with(FormState::default());
        let outcome = session.save_draft(&submitter).await.unwrap();
        assert_eq!(outcome.status, SubmitStatus::Draft);
        assert_eq!(outcome.job_id.as_deref(), Some("new-1"));
        assert_eq!(outcome.record.status, Some(JobStatus::Draft));
        assert!(session.is_closed());
        let calls = submitter.calls.lock().unwrap();
        assert_eq!(calls[0].1.status, JobStatus::Draft);
        assert!(calls[0].0.is_none());
    }

    #[tokio::test]
    async fn test_publish_jumps_to_first_failing_step() {
        let submitter = FakeSubmitter::default();
        let mut session = session_with(complete_form());
        session.go_to_step(WizardStep::Review).unwrap();
        session
            .update_form(|form| FormState { company: String::new(), ..form })
            .unwrap();

        let err = session.publish(&submitter).await.unwrap_err();
        assert!(matches!(err, WizardError::PublishBlocked { step: WizardStep::Company, .. }));
        assert_eq!(session.current_step(), WizardStep::Company);
        assert_eq!(session.errors().get("company"), Some("Company name is required"));
        assert_eq!(submitter.call_count(), 0);
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn test_publish_sends_active_payload() {
        let submitter = FakeSubmitter::default();
        let mut session = session_with(complete_form());
        let outcome = session.publish(&submitter).await.unwrap();
        assert_eq!(outcome.status, SubmitStatus::Open);
        let calls = submitter.calls.lock().unwrap();
        let payload = &calls[0].1;
        assert_eq!(payload.status, JobStatus::Active);
        assert_eq!(payload.salary.as_ref().map(|s| s.period.as_str()), Some("hourly"));
    }

    #[tokio::test]
    async fn test_edit_session_updates_existing_job() {
        let submitter = FakeSubmitter::default();
        let record = ApiJobRecord::from_value(json!({
            "_id": "job-42",
            "title": "Driver",
            "description": "Deliveries",
            "category": "logistics",
            "company": "Acme",
            "location": "Depot 3",
            "status": "closed"
        }));
        let mut session = WizardSession::edit(Role::Provider, "job-42", &record).unwrap();
        assert_eq!(session.form().status, Some(JobStatus::Closed));
        let outcome = session.publish(&submitter).await.unwrap();
        assert_eq!(outcome.job_id.as_deref(), Some("job-42"));
        let calls = submitter.calls.lock().unwrap();
        assert_eq!(calls[0].0.as_deref(), Some("job-42"));
        assert_eq!(calls[0].1.company.location.as_ref().map(|l| l.address.as_str()), Some("Depot 3"));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_session_editable() {
        let submitter = FakeSubmitter::failing();
        let mut session = session_with(complete_form());
        session.go_to_step(WizardStep::Review).unwrap();

        let err = session.publish(&submitter).await.unwrap_err();
        assert!(matches!(err, WizardError::Submit(SubmitError::Api { status: 500, .. })));
        assert!(err.field_errors().is_none());
        assert!(!session.is_closed());
        assert!(session.errors().is_empty());
        assert_eq!(session.current_step(), WizardStep::Review);

        *submitter.fail.lock().unwrap() = false;
        session.publish(&submitter).await.unwrap();
        assert_eq!(submitter.call_count(), 2);
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_changes() {
        let submitter = FakeSubmitter::default();
        let mut session = session_with(complete_form());
        session.save_draft(&submitter).await.unwrap();
        assert!(matches!(session.next(), Err(WizardError::SessionClosed)));
        assert!(matches!(
            session.update_form(|form| form),
            Err(WizardError::SessionClosed)
        ));
        assert!(matches!(
            session.publish(&submitter).await,
            Err(WizardError::SessionClosed)
        ));
        assert_eq!(submitter.call_count(), 1);
    }
}
