//! Roster store: the single owner of records and view state.
//!
//! `RosterStore` accepts intents, applies them, repairs derived invariants (page
//! clamp, selection pruning) and then notifies subscribers exactly once, so no
//! observer ever sees an intermediate state. Reads go through the memoized
//! derivation pipeline.

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::sync::Arc;

use roster_core::seed::seed_employees;
use roster_core::{
    Employee, EmployeeDraft, EmployeeId, EmployeePatch, PageSizePolicy, SortDirection, SortKey, Status, StatusFilter,
    ViewMode,
};
use roster_persist::SnapshotStorage;
use roster_query::{EmployeeStats, Inputs, PassCounters, Pipeline, View};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

pub mod config;
pub mod notify;
pub mod records;
pub mod view;

pub use config::RosterConfig;
pub use notify::{Notifier, Subscription};
pub use records::{HydrateSource, RecordStore, SeedReason, SNAPSHOT_KEY};
pub use view::ViewState;

/// What a view renders: the current page plus the counts around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleSlice {
    pub records: Vec<Employee>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

pub struct RosterStore {
    records: RecordStore,
    view: ViewState,
    pipeline: RefCell<Pipeline>,
    notifier: Notifier,
}

impl RosterStore {
    /// Empty store; call `hydrate` (or use `open`) to load data.
    pub fn new(storage: Arc<dyn SnapshotStorage>, page_sizes: PageSizePolicy) -> Self {
        Self {
            records: RecordStore::new(storage),
            view: ViewState::new(page_sizes),
            pipeline: RefCell::new(Pipeline::new()),
            notifier: Notifier::new(),
        }
    }

    /// Construct and hydrate from `storage`.
    pub fn open(storage: Arc<dyn SnapshotStorage>, page_sizes: PageSizePolicy) -> (Self, HydrateSource) {
        let mut me = Self::new(storage, page_sizes);
        let src = me.records.hydrate();
        me.reconcile();
        (me, src)
    }

    // ---------------- queries ----------------

    fn derive(&self) -> View {
        self.pipeline.borrow_mut().run(Inputs {
            records: self.records.items(),
            revision: self.records.revision(),
            filter: &self.view.filter,
            sort: self.view.sort,
            page: self.view.page,
        })
    }

    pub fn visible_slice(&self) -> VisibleSlice {
        let v = self.derive();
        VisibleSlice {
            records: v.page_records(self.records.items()),
            total_count: v.total_count,
            total_pages: v.total_pages,
            current_page: v.current_page,
            items_per_page: self.view.page.per_page,
        }
    }

    pub fn filtered_ids(&self) -> Vec<EmployeeId> {
        self.derive().filtered_ids(self.records.items())
    }

    pub fn selection(&self) -> Vec<EmployeeId> {
        self.view.selection.iter().copied().collect()
    }

    pub fn get(&self, id: EmployeeId) -> Option<&Employee> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[Employee] {
        self.records.items()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn stats(&self) -> EmployeeStats {
        self.pipeline.borrow_mut().stats(self.records.items(), self.records.revision())
    }

    pub fn departments(&self) -> Vec<String> {
        roster_query::unique_departments(self.records.items())
    }

    pub fn positions(&self) -> Vec<String> {
        roster_query::unique_positions(self.records.items())
    }

    pub fn suggestions(&self, term: &str) -> Vec<String> {
        roster_query::suggestions(self.records.items(), term)
    }

    pub fn passes(&self) -> PassCounters {
        self.pipeline.borrow().passes()
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.records.last_persist_error()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut() + Send + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.notifier.subscribe_epoch()
    }

    pub fn epoch(&self) -> u64 {
        self.notifier.epoch()
    }

    // ---------------- intents ----------------

    /// Clamp the page to the derived page count and drop selected ids with no record.
    fn reconcile(&mut self) {
        if !self.view.selection.is_empty() {
            let live = self.records.ids();
            let dropped = self.view.prune_selection(&live);
            if dropped > 0 {
                debug!(dropped, "selection pruned");
            }
        }
        let v = self.derive();
        if v.current_page != self.view.page.current {
            debug!(from = self.view.page.current, to = v.current_page, "page clamped");
            self.view.page.current = v.current_page;
        }
    }

    /// Finish an intent: repair invariants, then one notification.
    fn commit(&mut self) {
        self.reconcile();
        self.notifier.notify();
    }

    pub fn hydrate(&mut self) -> HydrateSource {
        let src = self.records.hydrate();
        self.commit();
        src
    }

    pub fn create(&mut self, draft: EmployeeDraft) -> Employee {
        let emp = self.records.create(draft);
        self.commit();
        emp
    }

    pub fn update(&mut self, id: EmployeeId, patch: &EmployeePatch) -> bool {
        let changed = self.records.update(id, patch);
        self.commit();
        changed
    }

    pub fn delete(&mut self, id: EmployeeId) -> bool {
        let removed = self.records.remove(id);
        self.commit();
        removed
    }

    pub fn delete_many(&mut self, ids: &[EmployeeId]) -> usize {
        let removed = self.records.remove_many(ids);
        self.commit();
        removed
    }

    /// Bulk-delete whatever is selected.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection();
        self.delete_many(&ids)
    }

    pub fn set_status_many(&mut self, ids: &[EmployeeId], status: Status) -> usize {
        let changed = self.records.set_status_many(ids, status);
        self.commit();
        changed
    }

    pub fn replace_all(&mut self, records: Vec<Employee>) {
        self.records.replace_all(records);
        self.commit();
    }

    /// Replace the collection with the seed dataset and restore default view state.
    pub fn reset_to_seed(&mut self) {
        self.records.replace_all(seed_employees());
        self.view.reset();
        self.commit();
    }

    pub fn set_search(&mut self, text: &str) {
        self.view.set_search(text);
        self.commit();
    }

    pub fn set_department_filter(&mut self, dept: Option<&str>) {
        self.view.set_department_filter(dept);
        self.commit();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.view.set_status_filter(status);
        self.commit();
    }

    pub fn clear_filters(&mut self) {
        self.view.clear_filters();
        self.commit();
    }

    /// Toggle-or-set: same field flips direction, a new field sorts ascending.
    pub fn set_sort(&mut self, key: SortKey) {
        self.view.toggle_sort(key);
        self.commit();
    }

    pub fn set_sort_explicit(&mut self, key: SortKey, direction: SortDirection) {
        self.view.set_sort(key, direction);
        self.commit();
    }

    /// Requested page, clamped into `[1, total_pages]`.
    pub fn set_page(&mut self, n: usize) {
        self.view.set_page(n);
        self.commit();
    }

    pub fn set_items_per_page(&mut self, n: usize) {
        self.view.set_items_per_page(n);
        self.commit();
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view.set_view_mode(mode);
        self.commit();
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = EmployeeId>) {
        self.view.set_selection(ids);
        self.commit();
    }

    pub fn toggle_selection(&mut self, id: EmployeeId) -> bool {
        let on = self.view.toggle_selection(id);
        self.commit();
        on
    }

    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
        self.commit();
    }

    /// Select every record passing the current filters (all pages).
    pub fn select_all_filtered(&mut self) {
        let ids = self.filtered_ids();
        self.view.set_selection(ids);
        self.commit();
    }

    /// Add the current page's records to the selection.
    pub fn select_page(&mut self) {
        let ids = self.derive().page_ids(self.records.items());
        self.view.selection.extend(ids);
        self.commit();
    }

    /// Default filters, sort, page and an empty selection.
    pub fn reset_view(&mut self) {
        self.view.reset();
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_persist::MemoryStorage;

    fn store() -> RosterStore {
        RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy::default()).0
    }

    #[test]
    fn open_seeds_when_storage_empty() {
        let (s, src) = RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy::default());
        assert_eq!(src, HydrateSource::Seed(SeedReason::Missing));
        assert_eq!(s.records().len(), 5);
        assert_eq!(s.epoch(), 0);
    }

    #[test]
    fn search_eng_shows_two() {
        let mut s = store();
        s.set_search("eng");
        let slice = s.visible_slice();
        assert_eq!(slice.records.len(), 2);
        assert!(slice.records.iter().all(|e| e.department == "Engineering"));
    }

    #[test]
    fn page_request_is_clamped() {
        let mut s = store();
        s.set_items_per_page(2);
        s.set_page(99);
        assert_eq!(s.view_state().page.current, 3);
        s.set_page(0);
        assert_eq!(s.view_state().page.current, 1);
    }

    #[test]
    fn select_page_and_delete_selected() {
        let mut s = store();
        s.set_items_per_page(2);
        s.set_page(2);
        s.select_page();
        assert_eq!(s.selection(), vec![EmployeeId(3), EmployeeId(4)]);
        assert_eq!(s.delete_selected(), 2);
        assert!(s.selection().is_empty());
        assert_eq!(s.records().len(), 3);
    }

    #[test]
    fn reset_to_seed_restores_defaults() {
        let mut s = store();
        s.delete_many(&[EmployeeId(1), EmployeeId(2)]);
        s.set_search("kaya");
        s.reset_to_seed();
        assert_eq!(s.records().len(), 5);
        assert!(s.view_state().filter.is_empty());
        assert_eq!(s.visible_slice().total_count, 5);
    }
}
