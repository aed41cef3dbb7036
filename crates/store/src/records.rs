//! Authoritative employee collection with snapshot persistence.

use std::sync::Arc;

use roster_core::seed::seed_employees;
use roster_core::{Employee, EmployeeDraft, EmployeeId, EmployeePatch, Status};
use roster_persist::SnapshotStorage;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

/// Fixed storage key for the serialized collection.
pub const SNAPSHOT_KEY: &str = "employees";

/// Field that every compatible snapshot record carries. Older layouts lack it or leave it blank.
const COMPAT_PROBE_FIELD: &str = "dateOfEmployment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedReason {
    Missing,
    Incompatible,
    Unreadable,
}

/// Where `hydrate` took its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateSource {
    Snapshot { records: usize },
    Seed(SeedReason),
}

pub struct RecordStore {
    items: Vec<Employee>,
    revision: u64,
    /// Highest id handed out this session; keeps ids of deleted records from coming back.
    high_water: u64,
    storage: Arc<dyn SnapshotStorage>,
    last_persist_error: Option<String>,
}

impl RecordStore {
    pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
        Self { items: Vec::new(), revision: 0, high_water: 0, storage, last_persist_error: None }
    }

    pub fn items(&self) -> &[Employee] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bumped on every change to the collection; the derivation pipeline keys on it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    pub fn get(&self, id: EmployeeId) -> Option<&Employee> {
        roster_query::find(&self.items, id)
    }

    pub fn ids(&self) -> FxHashSet<EmployeeId> {
        self.items.iter().map(|e| e.id).collect()
    }

    fn next_id(&self) -> EmployeeId {
        let max = self.items.iter().map(|e| e.id.0).max().unwrap_or(0);
        EmployeeId(max.max(self.high_water) + 1)
    }

    fn touched(&mut self, op: &'static str) {
        self.revision = self.revision.wrapping_add(1);
        metrics::counter!("store_mutations_total", 1u64, "op" => op);
        self.persist();
    }

    /// Append a new record with a fresh id and `Active` status.
    pub fn create(&mut self, draft: EmployeeDraft) -> Employee {
        let id = self.next_id();
        self.high_water = id.0;
        let emp = draft.into_employee(id);
        self.items.push(emp.clone());
        debug!(id = %id, "record created");
        self.touched("create");
        emp
    }

    /// Merge `patch` into the record with `id`. Returns false (and does nothing) if absent.
    pub fn update(&mut self, id: EmployeeId, patch: &EmployeePatch) -> bool {
        let Some(emp) = self.items.iter_mut().find(|e| e.id == id) else {
            debug!(id = %id, "update for unknown id ignored");
            return false;
        };
        patch.apply_to(emp);
        self.touched("update");
        true
    }

    pub fn remove(&mut self, id: EmployeeId) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.id != id);
        if self.items.len() == before {
            return false;
        }
        self.touched("remove");
        true
    }

    /// Remove every listed id in one pass; one snapshot write. Returns the number removed.
    pub fn remove_many(&mut self, ids: &[EmployeeId]) -> usize {
        let doomed: FxHashSet<EmployeeId> = ids.iter().copied().collect();
        let before = self.items.len();
        self.items.retain(|e| !doomed.contains(&e.id));
        let removed = before - self.items.len();
        if removed > 0 {
            self.touched("remove_many");
        }
        removed
    }

    /// Set `status` on every listed record; one snapshot write. Returns the number changed.
    pub fn set_status_many(&mut self, ids: &[EmployeeId], status: Status) -> usize {
        let targets: FxHashSet<EmployeeId> = ids.iter().copied().collect();
        let mut changed = 0usize;
        for e in self.items.iter_mut().filter(|e| targets.contains(&e.id)) {
            if e.status != status {
                e.status = status;
                changed += 1;
            }
        }
        if changed > 0 {
            self.touched("set_status_many");
        }
        changed
    }

    /// Replace the whole collection. Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, records: Vec<Employee>) {
        self.install(records);
        self.touched("replace_all");
    }

    fn install(&mut self, records: Vec<Employee>) {
        let mut seen: FxHashSet<EmployeeId> = FxHashSet::default();
        let total = records.len();
        self.items = records.into_iter().filter(|e| seen.insert(e.id)).collect();
        if self.items.len() != total {
            warn!(dropped = total - self.items.len(), "duplicate ids dropped");
        }
        let max = self.items.iter().map(|e| e.id.0).max().unwrap_or(0);
        self.high_water = self.high_water.max(max);
    }

    /// Load the persisted snapshot, or fall back to the seed dataset.
    ///
    /// A snapshot whose first record has no `dateOfEmployment` (absent, null or empty) is an
    /// older layout: it is removed from storage and the seed is used instead. Nothing is
    /// written back.
    pub fn hydrate(&mut self) -> HydrateSource {
        let source = match self.load_snapshot() {
            Ok(records) => {
                self.install(records);
                HydrateSource::Snapshot { records: self.items.len() }
            }
            Err(reason) => {
                self.install(seed_employees());
                HydrateSource::Seed(reason)
            }
        };
        self.revision = self.revision.wrapping_add(1);
        info!(source = ?source, records = self.items.len(), "records hydrated");
        source
    }

    fn load_snapshot(&self) -> Result<Vec<Employee>, SeedReason> {
        let raw = match self.storage.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(SeedReason::Missing),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "error loading employees snapshot");
                return Err(SeedReason::Unreadable);
            }
        };
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "employees snapshot is not valid JSON");
            SeedReason::Unreadable
        })?;
        if let Some(first) = value.as_array().and_then(|a| a.first()) {
            let usable = match first.get(COMPAT_PROBE_FIELD) {
                None | Some(serde_json::Value::Null) => false,
                Some(serde_json::Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            };
            if !usable {
                info!("outdated employee data structure detected, using seed data");
                if let Err(e) = self.storage.remove(SNAPSHOT_KEY) {
                    warn!(error = %format!("{e:#}"), "failed to clear outdated snapshot");
                }
                return Err(SeedReason::Incompatible);
            }
        }
        serde_json::from_value::<Vec<Employee>>(value).map_err(|e| {
            warn!(error = %e, "employees snapshot does not match the record layout");
            SeedReason::Unreadable
        })
    }

    /// Write the snapshot. Failures are logged and remembered; memory stays authoritative.
    fn persist(&mut self) {
        let res = serde_json::to_string(&self.items)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set(SNAPSHOT_KEY, &json));
        match res {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                let msg = format!("{e:#}");
                warn!(error = %msg, "error saving employees snapshot");
                metrics::counter!("persist_errors_total", 1u64);
                self.last_persist_error = Some(msg);
            }
        }
    }
}
