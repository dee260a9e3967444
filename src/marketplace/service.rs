use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    ApplicantProfile, Application, ApplicationId, ApplicationStatus, Task, TaskId, UserId,
};
use super::ranking::{rank_applications, RankedApplicant};
use super::scoring::ScoringPolicy;
use super::store::{MarketplaceStore, StoreError};

/// Service composing the store port, the scoring policy, and the application
/// lifecycle.
pub struct SelectionService<S> {
    store: Arc<S>,
    policy: ScoringPolicy,
}

impl<S> SelectionService<S>
where
    S: MarketplaceStore + 'static,
{
    pub fn new(store: Arc<S>, policy: ScoringPolicy) -> Self {
        Self { store, policy }
    }

    /// Load a task's applications and profiles, merge them in memory, and
    /// return the field ranked by match score.
    pub fn ranked_applicants(
        &self,
        task_id: &TaskId,
    ) -> Result<(Task, Vec<RankedApplicant>), SelectionError> {
        let task = self
            .store
            .task(task_id)?
            .ok_or_else(|| SelectionError::TaskNotFound(task_id.0.clone()))?;

        let applications = self.store.applications_for_task(task_id)?;

        let mut applicant_ids: Vec<UserId> = Vec::new();
        for application in &applications {
            if !applicant_ids.contains(&application.applicant_id) {
                applicant_ids.push(application.applicant_id.clone());
            }
        }

        let profiles: HashMap<UserId, ApplicantProfile> = self
            .store
            .profiles_for(&applicant_ids)?
            .into_iter()
            .map(|profile| (profile.applicant_id.clone(), profile))
            .collect();

        let entries: Vec<(Application, Option<ApplicantProfile>)> = applications
            .into_iter()
            .map(|application| {
                let profile = profiles.get(&application.applicant_id).cloned();
                (application, profile)
            })
            .collect();

        let ranked = rank_applications(&task, entries, &self.policy);
        Ok((task, ranked))
    }

    /// Accept a pending application and assign its task to the applicant.
    ///
    /// The two writes are issued sequentially with no surrounding
    /// transaction. Sibling pending applications are left untouched, and a
    /// task already assigned elsewhere can be reassigned by accepting another
    /// pending application.
    pub fn accept(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, SelectionError> {
        let mut application = self.fetch_application(application_id)?;

        if application.status != ApplicationStatus::Pending {
            return Err(SelectionError::InvalidState {
                id: application.id.0.clone(),
                status: application.status.label(),
            });
        }

        let command = AcceptApplicationCommand::for_application(&application);
        command.execute(self.store.as_ref())?;

        info!(
            application = %application.id.0,
            task = %application.task_id.0,
            applicant = %application.applicant_id.0,
            "application accepted, task assigned"
        );

        application.status = ApplicationStatus::Accepted;
        Ok(application)
    }

    /// Reject an application. Re-rejecting an already-rejected application is
    /// a tolerated no-op; rejecting an accepted one fails.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, SelectionError> {
        let mut application = self.fetch_application(application_id)?;

        match application.status {
            ApplicationStatus::Accepted => Err(SelectionError::InvalidState {
                id: application.id.0.clone(),
                status: application.status.label(),
            }),
            ApplicationStatus::Rejected => Ok(application),
            ApplicationStatus::Pending => {
                self.store
                    .update_application_status(application_id, ApplicationStatus::Rejected)?;
                info!(application = %application.id.0, "application rejected");
                application.status = ApplicationStatus::Rejected;
                Ok(application)
            }
        }
    }

    fn fetch_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, SelectionError> {
        self.store
            .application(application_id)?
            .ok_or_else(|| SelectionError::ApplicationNotFound(application_id.0.clone()))
    }
}

/// The two-step accept operation: flip the application to accepted, then
/// point the task's assignee at the applicant. Kept as an explicit command so
/// a transactional store can wrap both steps in one unit without changing the
/// public contract.
#[derive(Debug, Clone)]
pub struct AcceptApplicationCommand {
    pub application_id: ApplicationId,
    pub task_id: TaskId,
    pub applicant_id: UserId,
}

impl AcceptApplicationCommand {
    pub fn for_application(application: &Application) -> Self {
        Self {
            application_id: application.id.clone(),
            task_id: application.task_id.clone(),
            applicant_id: application.applicant_id.clone(),
        }
    }

    /// Issue both writes in order. A failure on the second write leaves the
    /// application accepted with the task unassigned; the inconsistency is
    /// logged and surfaced, never rolled back.
    pub fn execute<S: MarketplaceStore>(&self, store: &S) -> Result<(), SelectionError> {
        store.update_application_status(&self.application_id, ApplicationStatus::Accepted)?;

        if let Err(source) = store.update_task_assignment(&self.task_id, &self.applicant_id) {
            warn!(
                application = %self.application_id.0,
                task = %self.task_id.0,
                error = %source,
                "application accepted but task assignment failed"
            );
            return Err(SelectionError::AssignmentIncomplete {
                id: self.application_id.0.clone(),
                task_id: self.task_id.0.clone(),
                source,
            });
        }

        Ok(())
    }
}

/// Error raised by the selection service.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("task {0} not found")]
    TaskNotFound(String),
    #[error("application {0} not found")]
    ApplicationNotFound(String),
    #[error("application {id} is {status}, expected pending")]
    InvalidState { id: String, status: &'static str },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("application {id} accepted but assigning task {task_id} failed: {source}")]
    AssignmentIncomplete {
        id: String,
        task_id: String,
        source: StoreError,
    },
}
