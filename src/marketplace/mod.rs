//! Applicant ranking and selection for marketplace tasks.
//!
//! A task owner loads the applications bid against a task, the scorer derives
//! a 0-100 match score per applicant from reputation and price fit, the ranker
//! orders the field, and the selection service drives the accept/reject
//! lifecycle against a pluggable store.

pub mod domain;
pub mod ranking;
pub mod roster;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicantProfile, Task, TaskId, TaskStatus,
    UserId,
};
pub use ranking::{rank_applications, RankedApplicant, RankedApplicantView};
pub use roster::{ApplicantRosterImporter, RosterEntry, RosterImportError};
pub use router::marketplace_router;
pub use scoring::{score_application, MatchFactor, MatchScore, ScoreComponent, ScoringPolicy};
pub use service::{AcceptApplicationCommand, SelectionError, SelectionService};
pub use store::{InMemoryStore, MarketplaceStore, StoreError};
