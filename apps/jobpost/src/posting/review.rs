use serde::Serialize;

use crate::collaborators::CategoryLookup;
use crate::models::FormState;
use crate::posting::enums::{to_api_enum, EnumKind};
use crate::posting::validation::WizardStep;

/// One block of the review screen, mirroring an editable step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSection {
    pub step: WizardStep,
    pub title: &'static str,
    pub rows: Vec<(String, String)>,
}

/// Read-only summary of everything entered so far. Empty fields are skipped;
/// the category id is shown by name when the lookup knows it.
pub fn review_summary(form: &FormState, categories: &dyn CategoryLookup) -> Vec<ReviewSection> {
    let category = non_blank(&form.category_id).map(|id| {
        categories
            .name_for(id)
            .unwrap_or_else(|| id.to_string())
    });

    let location = [&form.location, &form.city, &form.state, &form.country]
        .iter()
        .filter_map(|part| non_blank(part))
        .collect::<Vec<_>>()
        .join(", ");
    let remote = form.is_remote.then(|| match non_blank(&form.remote_type) {
        Some(kind) => format!("Yes ({kind})"),
        None => "Yes".to_string(),
    });

    let languages = form
        .languages
        .iter()
        .map(|l| match non_blank(&l.proficiency) {
            Some(p) => format!("{} ({p})", l.language),
            None => l.language.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let education = non_blank(&form.education_level).map(|level| {
        let mut text = match non_blank(&form.education_field) {
            Some(field) => format!("{level} in {field}"),
            None => level.to_string(),
        };
        if form.education_required {
            text.push_str(" (required)");
        }
        text
    });

    let sections = vec![
        section(
            WizardStep::BasicInfo,
            [
                ("Title", non_blank(&form.title).map(str::to_string)),
                ("Category", category),
                ("Subcategory", owned(&form.subcategory)),
                ("Job type", owned(&form.job_type)),
                ("Experience level", owned(&form.experience_level)),
                ("Description", owned(&form.description)),
            ],
        ),
        section(
            WizardStep::Company,
            [
                ("Company", owned(&form.company)),
                ("Website", owned(&form.company_website)),
                ("Size", owned(&form.company_size)),
                ("Industry", owned(&form.industry)),
                ("Location", non_empty(location)),
                ("Remote", remote),
            ],
        ),
        section(
            WizardStep::JobDetails,
            [
                ("Salary", format_salary(form)),
                ("Benefits", joined(&form.benefits)),
                ("Responsibilities", joined(&form.responsibilities)),
                ("Tags", joined(&form.tags)),
            ],
        ),
        section(
            WizardStep::Requirements,
            [
                ("Skills", joined(&form.skills)),
                ("Requirements", joined(&form.requirements)),
                ("Qualifications", joined(&form.qualifications)),
                ("Certifications", joined(&form.certifications)),
                ("Languages", non_empty(languages)),
                ("Education", education),
                (
                    "Experience",
                    form.experience_years.map(|years| match non_blank(&form.experience_description) {
                        Some(d) => format!("{years}+ years, {d}"),
                        None => format!("{years}+ years"),
                    }),
                ),
                ("Other", joined(&form.other_requirements)),
            ],
        ),
        section(
            WizardStep::Application,
            [
                ("Apply via", owned(&form.application_method)),
                ("Deadline", form.deadline.map(|d| d.to_string())),
                ("Start date", form.start_date.map(|d| d.to_string())),
                ("Contact email", owned(&form.contact_email)),
                ("Contact phone", owned(&form.contact_phone)),
                ("Application URL", owned(&form.application_url)),
                ("Instructions", owned(&form.instructions)),
                ("Visibility", owned(&form.visibility)),
            ],
        ),
    ];

    sections
        .into_iter()
        .filter(|s| !s.rows.is_empty())
        .collect()
}

fn section<const N: usize>(step: WizardStep, rows: [(&str, Option<String>); N]) -> ReviewSection {
    ReviewSection {
        step,
        title: step.title(),
        rows: rows
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| (label.to_string(), v)))
            .collect(),
    }
}

/// "USD 40000 - 55000 / yearly"; one-sided ranges show "from"/"up to".
fn format_salary(form: &FormState) -> Option<String> {
    if form.is_confidential {
        return Some("Confidential".to_string());
    }
    let range = match (form.salary_min, form.salary_max) {
        (Some(min), Some(max)) => format!("{min} - {max}"),
        (Some(min), None) => format!("from {min}"),
        (None, Some(max)) => format!("up to {max}"),
        (None, None) => return None,
    };
    let period = to_api_enum(EnumKind::SalaryPeriod, &form.salary_period);
    let mut text = format!("{} {range} / {period}", form.currency.trim());
    if form.is_negotiable {
        text.push_str(" (negotiable)");
    }
    Some(text)
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn owned(s: &str) -> Option<String> {
    non_blank(s).map(str::to_string)
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn joined(items: &[String]) -> Option<String> {
    non_empty(
        items
            .iter()
            .filter_map(|i| non_blank(i))
            .collect::<Vec<_>>()
            .join(", "),
    )
}
