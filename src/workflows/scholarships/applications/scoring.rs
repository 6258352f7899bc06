use super::domain::{ApplicantProfile, EligibilityCriteria};

/// Weight of the merit (GPA) component.
const MERIT_WEIGHT: f64 = 60.0;
/// Weight of the financial-need component.
const NEED_WEIGHT: f64 = 40.0;
/// GPA scale ceiling; anything at or above it earns the full merit weight.
const GPA_SCALE: f64 = 4.0;
/// Income ceiling used for need scoring when a scholarship sets no cap.
const DEFAULT_INCOME_CEILING: u32 = 100_000;

/// Composite ranking score in [0, 100].
///
/// The score is a ranking aid only: it does not gate on eligibility, is
/// computed exactly once at the submission moment, and is persisted
/// immutably on the application.
pub fn composite_score(profile: &ApplicantProfile, criteria: &EligibilityCriteria) -> u8 {
    let gpa = profile.academic.gpa.unwrap_or(0.0);
    let merit = (gpa / GPA_SCALE).min(1.0).max(0.0) * MERIT_WEIGHT;

    let ceiling = criteria
        .max_income
        .filter(|cap| *cap > 0)
        .unwrap_or(DEFAULT_INCOME_CEILING);
    let income = profile.financial.annual_income.unwrap_or(0);

    let need = if income < ceiling {
        let ratio = f64::from(ceiling - income) / f64::from(ceiling);
        ratio.max(0.0) * NEED_WEIGHT
    } else {
        0.0
    };

    (merit + need).round() as u8
}
