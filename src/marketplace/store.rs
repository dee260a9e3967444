use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{
    ApplicantProfile, Application, ApplicationId, ApplicationStatus, Task, TaskId, UserId,
};

/// Data-access port for the marketplace. The scorer and ranker never touch
/// the store directly; the selection service reads applications and profiles
/// through this trait and merges them in memory, and issues the lifecycle
/// writes as independent row updates.
pub trait MarketplaceStore: Send + Sync {
    fn task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;
    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    /// All applications bid against a task, in creation order (oldest first).
    fn applications_for_task(&self, task_id: &TaskId) -> Result<Vec<Application>, StoreError>;
    /// Reputation snapshots for a set of users. Users without a profile are
    /// simply absent from the result.
    fn profiles_for(&self, applicant_ids: &[UserId]) -> Result<Vec<ApplicantProfile>, StoreError>;
    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError>;
    fn update_task_assignment(&self, task_id: &TaskId, assignee: &UserId)
        -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Mutex-guarded in-memory store. Backs the CLI demo and the default `serve`
/// deployment; a production deployment swaps in a real store behind the same
/// trait.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    // Vec keeps insertion order, which doubles as creation order for seeds.
    applications: Vec<Application>,
    profiles: HashMap<UserId, ApplicantProfile>,
}

impl InMemoryStore {
    pub fn insert_task(&self, task: Task) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.tasks.insert(task.id.clone(), task);
    }

    pub fn insert_application(&self, application: Application) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.applications.push(application);
    }

    pub fn insert_profile(&self, profile: ApplicantProfile) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.profiles.insert(profile.applicant_id.clone(), profile);
    }
}

impl MarketplaceStore for InMemoryStore {
    fn task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.tasks.get(id).cloned())
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .applications
            .iter()
            .find(|application| &application.id == id)
            .cloned())
    }

    fn applications_for_task(&self, task_id: &TaskId) -> Result<Vec<Application>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut applications: Vec<Application> = inner
            .applications
            .iter()
            .filter(|application| &application.task_id == task_id)
            .cloned()
            .collect();
        // Stable sort: equal timestamps keep insertion order.
        applications.sort_by_key(|application| application.created_at);
        Ok(applications)
    }

    fn profiles_for(&self, applicant_ids: &[UserId]) -> Result<Vec<ApplicantProfile>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(applicant_ids
            .iter()
            .filter_map(|id| inner.profiles.get(id).cloned())
            .collect())
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let application = inner
            .applications
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or(StoreError::NotFound)?;
        application.status = status;
        Ok(())
    }

    fn update_task_assignment(
        &self,
        task_id: &TaskId,
        assignee: &UserId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let task = inner.tasks.get_mut(task_id).ok_or(StoreError::NotFound)?;
        task.assigned_to = Some(assignee.clone());
        Ok(())
    }
}
