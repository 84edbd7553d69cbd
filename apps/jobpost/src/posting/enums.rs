//! Enum normalization between UI spellings and backend enum values.
//!
//! Job type and salary period are fixed bijections. Benefits use a curated
//! label table with a deterministic fallback so any label still serializes.

/// Which enum family a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    JobType,
    SalaryPeriod,
    Benefit,
}

/// (UI, API)
const JOB_TYPES: &[(&str, &str)] = &[
    ("full-time", "full_time"),
    ("part-time", "part_time"),
    ("contract", "contract"),
    ("freelance", "freelance"),
    ("internship", "internship"),
    ("temporary", "temporary"),
];

/// (UI, API)
const SALARY_PERIODS: &[(&str, &str)] = &[
    ("hour", "hourly"),
    ("day", "daily"),
    ("week", "weekly"),
    ("month", "monthly"),
    ("year", "yearly"),
];

/// (label, API)
const BENEFITS: &[(&str, &str)] = &[
    ("Health Insurance", "health_insurance"),
    ("Dental Insurance", "dental_insurance"),
    ("Vision Insurance", "vision_insurance"),
    ("Life Insurance", "life_insurance"),
    ("401(k) Matching", "retirement_401k"),
    ("Retirement Plan", "retirement_plan"),
    ("Paid Time Off", "paid_time_off"),
    ("Flexible Hours", "flexible_hours"),
    ("Remote Work", "remote_work"),
    ("Professional Development", "professional_development"),
    ("Gym Membership", "gym_membership"),
    ("Free Meals", "free_meals"),
    ("Stock Options", "stock_options"),
    ("Performance Bonus", "performance_bonus"),
    ("Parental Leave", "parental_leave"),
    ("Transportation Allowance", "transportation_allowance"),
    ("Childcare Support", "childcare_support"),
    ("Relocation Assistance", "relocation_assistance"),
];

/// Translates a UI value into its backend spelling. Never fails.
///
/// Job types and salary periods outside their tables pass through unchanged.
/// Benefits resolve in order: already machine-form (contains `_`), curated
/// label, then [`synthesize_enum`]. The result is idempotent:
/// `to_api_enum(k, &to_api_enum(k, x)) == to_api_enum(k, x)`.
pub fn to_api_enum(kind: EnumKind, value: &str) -> String {
    match kind {
        EnumKind::JobType => lookup_api(JOB_TYPES, value),
        EnumKind::SalaryPeriod => lookup_api(SALARY_PERIODS, value),
        EnumKind::Benefit => {
            if value.contains('_') {
                return value.to_string();
            }
            let label = value.trim();
            BENEFITS
                .iter()
                .find(|(ui, _)| *ui == label)
                .map(|(_, api)| api.to_string())
                .unwrap_or_else(|| synthesize_enum(label))
        }
    }
}

/// Translates a backend value into its UI spelling; unknown values pass through.
pub fn to_ui_enum(kind: EnumKind, value: &str) -> String {
    let table = match kind {
        EnumKind::JobType => JOB_TYPES,
        EnumKind::SalaryPeriod => SALARY_PERIODS,
        EnumKind::Benefit => BENEFITS,
    };
    table
        .iter()
        .find(|(_, api)| *api == value)
        .map(|(ui, _)| ui.to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Machine value for an unmapped label: lowercase, whitespace runs become a
/// single `_`, parentheses are dropped. `"On-site Gym (24h)"` becomes
/// `"on-site_gym_24h"`.
pub fn synthesize_enum(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['(', ')'], "")
}

fn lookup_api(table: &[(&str, &str)], value: &str) -> String {
    table
        .iter()
        .find(|(ui, _)| *ui == value)
        .map(|(_, api)| api.to_string())
        .unwrap_or_else(|| value.to_string())
}
