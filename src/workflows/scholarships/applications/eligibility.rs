use serde::{Deserialize, Serialize};

use super::domain::{ApplicantProfile, EligibilityCriteria};

/// Outcome of an eligibility check. `reasons` carries one entry per failed
/// rule so callers can show every gap at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub is_eligible: bool,
    pub reasons: Vec<String>,
}

impl EligibilityReport {
    fn eligible() -> Self {
        Self {
            is_eligible: true,
            reasons: Vec::new(),
        }
    }

    fn fail(&mut self, reason: String) {
        self.is_eligible = false;
        self.reasons.push(reason);
    }
}

/// Check a profile against a scholarship's criteria.
///
/// Every rule is evaluated independently, with no short-circuit, and the
/// verdict is the conjunction of all of them. The function is pure: no clock,
/// no randomness, no I/O, so identical inputs always produce identical
/// output.
pub fn evaluate(profile: &ApplicantProfile, criteria: &EligibilityCriteria) -> EligibilityReport {
    let mut report = EligibilityReport::eligible();

    // GPA rule: a missing GPA counts as 0.
    let gpa = profile.academic.gpa.unwrap_or(0.0);
    let min_gpa = criteria.min_gpa;
    if gpa < min_gpa {
        report.fail(format!(
            "GPA {gpa} is below minimum requirement of {min_gpa}"
        ));
    }

    // Income rule: only enforced when the scholarship caps income. Missing
    // income data is ineligible rather than assumed favorable.
    if let Some(max_income) = criteria.max_income.filter(|cap| *cap > 0) {
        match profile.financial.annual_income {
            None => {
                report.fail("Annual income information is missing from your profile".to_string());
            }
            Some(income) if income > max_income => {
                report.fail(format!(
                    "Annual income ${income} exceeds maximum limit of ${max_income}"
                ));
            }
            Some(_) => {}
        }
    }

    // Course rule: exact, case-sensitive membership in the allowed list.
    if !criteria.allowed_courses.is_empty() {
        let course = profile.academic.course.as_deref();
        let matched = course
            .map(|value| {
                criteria
                    .allowed_courses
                    .iter()
                    .any(|allowed| allowed.as_str() == value)
            })
            .unwrap_or(false);

        if !matched {
            report.fail(format!(
                "Your course '{}' is not in the allowed list: {}",
                course.unwrap_or("N/A"),
                criteria.allowed_courses.join(", ")
            ));
        }
    }

    report
}
