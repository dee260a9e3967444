use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::marketplace::domain::{
    ApplicantProfile, Application, ApplicationId, ApplicationStatus, Task, TaskId, TaskStatus,
    UserId,
};
use crate::marketplace::scoring::ScoringPolicy;
use crate::marketplace::service::SelectionService;
use crate::marketplace::store::{InMemoryStore, MarketplaceStore, StoreError};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("valid timestamp")
}

pub(super) fn task(cost: Option<f64>) -> Task {
    Task {
        id: TaskId("t1".to_string()),
        title: "Paint the community fence".to_string(),
        cost,
        status: TaskStatus::Todo,
        assigned_to: None,
    }
}

pub(super) fn application(
    id: &str,
    applicant: &str,
    bid_amount: Option<f64>,
    minutes_after_base: i64,
) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        task_id: TaskId("t1".to_string()),
        applicant_id: UserId(applicant.to_string()),
        bid_amount,
        status: ApplicationStatus::Pending,
        message: None,
        created_at: base_time() + chrono::Duration::minutes(minutes_after_base),
    }
}

pub(super) fn profile(applicant: &str, rating_sum: f64, rating_count: u32) -> ApplicantProfile {
    ApplicantProfile {
        applicant_id: UserId(applicant.to_string()),
        rating_sum,
        rating_count,
    }
}

/// Task t1 (budget 100) with three pending bids:
/// a1 -> u1, bid 90, rating 40/10 (avg 4.0)  => score 100
/// a2 -> u2, bid 150, no rating history      => score 50
/// a3 -> u3, no bid, rating 6/2 (avg 3.0)    => score 80
pub(super) fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::default();
    store.insert_task(task(Some(100.0)));
    store.insert_profile(profile("u1", 40.0, 10));
    store.insert_profile(profile("u3", 6.0, 2));
    store.insert_application(application("a1", "u1", Some(90.0), 0));
    store.insert_application(application("a2", "u2", Some(150.0), 1));
    store.insert_application(application("a3", "u3", None, 2));
    Arc::new(store)
}

pub(super) fn build_service() -> (SelectionService<InMemoryStore>, Arc<InMemoryStore>) {
    let store = seeded_store();
    let service = SelectionService::new(store.clone(), ScoringPolicy::default());
    (service, store)
}

pub(super) fn application_id(raw: &str) -> ApplicationId {
    ApplicationId(raw.to_string())
}

pub(super) fn task_id(raw: &str) -> TaskId {
    TaskId(raw.to_string())
}

/// Store that fails every call, for propagation tests.
pub(super) struct UnavailableStore;

impl MarketplaceStore for UnavailableStore {
    fn task(&self, _id: &TaskId) -> Result<Option<Task>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn application(&self, _id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn applications_for_task(&self, _task_id: &TaskId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn profiles_for(
        &self,
        _applicant_ids: &[UserId],
    ) -> Result<Vec<ApplicantProfile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_application_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_task_assignment(
        &self,
        _task_id: &TaskId,
        _assignee: &UserId,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Store where the status write lands but the task assignment write fails,
/// to exercise the partial-failure path of accept.
pub(super) struct FlakyAssignmentStore {
    pub(super) inner: InMemoryStore,
}

impl FlakyAssignmentStore {
    pub(super) fn seeded() -> Self {
        let inner = InMemoryStore::default();
        inner.insert_task(task(Some(100.0)));
        inner.insert_application(application("a1", "u1", Some(90.0), 0));
        Self { inner }
    }
}

impl MarketplaceStore for FlakyAssignmentStore {
    fn task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        self.inner.task(id)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        self.inner.application(id)
    }

    fn applications_for_task(&self, task_id: &TaskId) -> Result<Vec<Application>, StoreError> {
        self.inner.applications_for_task(task_id)
    }

    fn profiles_for(&self, applicant_ids: &[UserId]) -> Result<Vec<ApplicantProfile>, StoreError> {
        self.inner.profiles_for(applicant_ids)
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        self.inner.update_application_status(id, status)
    }

    fn update_task_assignment(
        &self,
        _task_id: &TaskId,
        _assignee: &UserId,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("task table offline".to_string()))
    }
}
