//! Applicant ranking and selection for a community task marketplace.
//!
//! Tasks are posted with a target budget, community members bid on them, and
//! the marketplace ranks the applicants by a 0-100 match score combining
//! reputation and price fit. The owning side then accepts or rejects
//! individual applications; accepting one assigns the task to that applicant.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
