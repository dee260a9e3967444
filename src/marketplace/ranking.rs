use serde::Serialize;

use super::domain::{ApplicantProfile, Application, Task};
use super::scoring::{score_application, MatchScore, ScoringPolicy};

/// One application joined with its applicant's reputation snapshot and the
/// freshly computed match score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedApplicant {
    pub application: Application,
    pub profile: Option<ApplicantProfile>,
    pub score: MatchScore,
}

impl RankedApplicant {
    pub fn view(&self) -> RankedApplicantView {
        RankedApplicantView {
            application_id: self.application.id.0.clone(),
            applicant_id: self.application.applicant_id.0.clone(),
            status: self.application.status.label(),
            bid_amount: self.application.bid_amount,
            average_rating: self
                .profile
                .as_ref()
                .and_then(ApplicantProfile::average_rating),
            match_score: self.score.total,
            message: self.application.message.clone(),
        }
    }
}

/// Sanitized applicant row exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct RankedApplicantView {
    pub application_id: String,
    pub applicant_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub match_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Order applications for a task by match score, highest first.
///
/// A read-only view transformation: nothing is persisted and no status
/// changes. The sort is stable, so applications with equal scores keep the
/// order the store returned them in (creation order, oldest first).
pub fn rank_applications(
    task: &Task,
    entries: Vec<(Application, Option<ApplicantProfile>)>,
    policy: &ScoringPolicy,
) -> Vec<RankedApplicant> {
    let mut ranked: Vec<RankedApplicant> = entries
        .into_iter()
        .map(|(application, profile)| {
            let score = score_application(task, &application, profile.as_ref(), policy);
            RankedApplicant {
                application,
                profile,
                score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total.total_cmp(&a.score.total));
    ranked
}
