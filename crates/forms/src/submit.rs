//! Form submission: validate, wait on the latency boundary, dispatch, navigate.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use roster_core::{Employee, EmployeeId, EmployeePatch};
use roster_store::RosterStore;
use tracing::{debug, info};

use crate::{validate, EmployeeForm, Route, ValidationErrors};

/// The pause between accepting a submit and applying it. Injected so tests own the clock.
#[async_trait]
pub trait Latency: Send + Sync {
    async fn settle(&self);
}

/// Resolves immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

#[async_trait]
impl Latency for Immediate {
    async fn settle(&self) {}
}

/// Sleeps on the tokio timer; under a paused test clock this completes on `advance`.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedLatency {
    pub delay: Duration,
}

impl SimulatedLatency {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Latency for SimulatedLatency {
    async fn settle(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("employee {0} not found")]
    NotFound(EmployeeId),
}

/// Outcome of a successful submit: the stored record and where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub employee: Employee,
    pub navigate: Route,
}

/// Validate and create. Invalid input returns before any wait or mutation.
pub async fn submit_create(
    store: &mut RosterStore,
    form: &EmployeeForm,
    latency: &dyn Latency,
    today: NaiveDate,
) -> Result<Submitted, SubmitError> {
    let draft = validate(form, today)?;
    latency.settle().await;
    let employee = store.create(draft);
    info!(id = %employee.id, "employee saved");
    Ok(Submitted { employee, navigate: Route::List })
}

/// Validate and update `id`. A missing record is reported so the edit page can show not-found.
pub async fn submit_update(
    store: &mut RosterStore,
    id: EmployeeId,
    form: &EmployeeForm,
    latency: &dyn Latency,
    today: NaiveDate,
) -> Result<Submitted, SubmitError> {
    if store.get(id).is_none() {
        return Err(SubmitError::NotFound(id));
    }
    let patch = EmployeePatch::from(validate(form, today)?);
    latency.settle().await;
    if !store.update(id, &patch) {
        debug!(id = %id, "update matched no record");
        return Err(SubmitError::NotFound(id));
    }
    let employee = store.get(id).cloned().ok_or(SubmitError::NotFound(id))?;
    info!(id = %id, "employee updated");
    Ok(Submitted { employee, navigate: Route::List })
}
