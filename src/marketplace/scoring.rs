use serde::{Deserialize, Serialize};

use super::domain::{ApplicantProfile, Application, ApplicationId, Task};

/// Weights backing the match score rubric. The defaults are the canonical
/// marketplace constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Starting score every applicant receives.
    pub base_score: f64,
    /// Points added per star of average rating.
    pub rating_weight: f64,
    /// Bonus for a bid at or under the task budget.
    pub budget_bonus: f64,
    /// Penalty for a bid beyond the overbid tolerance.
    pub overbid_penalty: f64,
    /// Multiple of the task cost a bid may reach before the penalty applies.
    pub overbid_tolerance: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            rating_weight: 10.0,
            budget_bonus: 10.0,
            overbid_penalty: 10.0,
            overbid_tolerance: 1.2,
        }
    }
}

/// Factors permitted in the match rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    Reputation,
    PriceFit,
    OverBudget,
}

/// Discrete contribution to a match score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: MatchFactor,
    pub delta: f64,
    pub notes: String,
}

/// Derived suitability of one application for one task. Never persisted;
/// recomputed from the live profile and bid on every ranking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub application_id: ApplicationId,
    pub total: f64,
    pub components: Vec<ScoreComponent>,
}

/// Compute the 0-100 match score for one application against a task.
///
/// Starts from the base score, adds `average_rating * rating_weight` when the
/// applicant has rating history (no history is neutral), then applies the two
/// price checks. A missing bid or a task without a cost skips both price
/// factors. The total is clamped to `[0, 100]`.
pub fn score_application(
    task: &Task,
    application: &Application,
    profile: Option<&ApplicantProfile>,
    policy: &ScoringPolicy,
) -> MatchScore {
    let mut components = Vec::new();
    let mut total = policy.base_score;

    if let Some(average) = profile.and_then(ApplicantProfile::average_rating) {
        let delta = average * policy.rating_weight;
        components.push(ScoreComponent {
            factor: MatchFactor::Reputation,
            delta,
            notes: format!(
                "average rating {:.2} over {} review(s)",
                average,
                profile.map(|p| p.rating_count).unwrap_or_default()
            ),
        });
        total += delta;
    }

    // Two independent checks, not an if/else: a bid at or under budget earns
    // the bonus, a bid beyond the tolerance multiple takes the penalty. For a
    // zero-cost task any positive bid exceeds the tolerance.
    if let (Some(bid), Some(cost)) = (application.bid_amount, task.cost) {
        if bid <= cost {
            components.push(ScoreComponent {
                factor: MatchFactor::PriceFit,
                delta: policy.budget_bonus,
                notes: format!("bid {bid:.2} within budget {cost:.2}"),
            });
            total += policy.budget_bonus;
        }
        if bid > cost * policy.overbid_tolerance {
            components.push(ScoreComponent {
                factor: MatchFactor::OverBudget,
                delta: -policy.overbid_penalty,
                notes: format!(
                    "bid {bid:.2} exceeds {:.0}% of budget {cost:.2}",
                    policy.overbid_tolerance * 100.0
                ),
            });
            total -= policy.overbid_penalty;
        }
    }

    MatchScore {
        application_id: application.id.clone(),
        total: total.clamp(0.0, 100.0),
        components,
    }
}
