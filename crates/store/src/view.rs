//! Filter, sort, pagination and selection state owned by the store.

use std::collections::BTreeSet;

use roster_core::{
    EmployeeId, FilterState, PageSizePolicy, PageState, SortDirection, SortKey, SortState, StatusFilter, ViewMode,
};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Everything a view needs besides the records themselves.
///
/// Each setter applies the local rule (filter change resets the page, sort toggles,
/// page sizes follow the view mode). Clamping the page against the derived page
/// count is the store's job since it needs the filtered length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub filter: FilterState,
    pub sort: SortState,
    pub page: PageState,
    pub mode: ViewMode,
    #[serde(skip)]
    pub policy: PageSizePolicy,
    pub selection: BTreeSet<EmployeeId>,
}

impl ViewState {
    pub fn new(policy: PageSizePolicy) -> Self {
        let mode = ViewMode::default();
        Self {
            filter: FilterState::default(),
            sort: SortState::default(),
            page: PageState { current: 1, per_page: policy.for_mode(mode) },
            mode,
            policy,
            selection: BTreeSet::new(),
        }
    }

    /// Defaults for filter, sort, page and selection; the view mode and policy stay.
    pub fn reset(&mut self) {
        self.filter = FilterState::default();
        self.sort = SortState::default();
        self.page = PageState { current: 1, per_page: self.policy.for_mode(self.mode) };
        self.selection.clear();
    }

    pub fn set_search(&mut self, text: &str) {
        self.filter.search = text.to_string();
        self.page.current = 1;
    }

    pub fn set_department_filter(&mut self, dept: Option<&str>) {
        self.filter.department = dept.filter(|d| !d.is_empty()).map(str::to_string);
        self.page.current = 1;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.page.current = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterState::default();
        self.page.current = 1;
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort = SortState { key, direction };
    }

    /// Requested page; lower bound applied here, upper bound by the store.
    pub fn set_page(&mut self, n: usize) {
        self.page.current = n.max(1);
    }

    pub fn set_items_per_page(&mut self, n: usize) {
        self.page.per_page = n.max(1);
        self.page.current = 1;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.page.per_page = self.policy.for_mode(mode);
        self.page.current = 1;
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = EmployeeId>) {
        self.selection = ids.into_iter().collect();
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle_selection(&mut self, id: EmployeeId) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drop selected ids that no longer name a live record. Returns how many were dropped.
    pub fn prune_selection(&mut self, live: &FxHashSet<EmployeeId>) -> usize {
        let before = self.selection.len();
        self.selection.retain(|id| live.contains(id));
        before - self.selection.len()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(PageSizePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_changes_reset_page() {
        let mut v = ViewState::default();
        v.set_page(3);
        v.set_search("eng");
        assert_eq!(v.page.current, 1);
        v.set_page(2);
        v.set_department_filter(Some("Design"));
        assert_eq!(v.page.current, 1);
        v.set_page(2);
        v.set_status_filter(StatusFilter::Inactive);
        assert_eq!(v.page.current, 1);
        v.set_department_filter(Some(""));
        assert_eq!(v.filter.department, None);
    }

    #[test]
    fn view_mode_applies_policy() {
        let mut v = ViewState::new(PageSizePolicy { list: 10, grid: 4 });
        assert_eq!(v.page.per_page, 10);
        v.set_page(2);
        v.set_view_mode(ViewMode::Grid);
        assert_eq!((v.page.per_page, v.page.current), (4, 1));
        v.set_items_per_page(0);
        assert_eq!(v.page.per_page, 1);
    }

    #[test]
    fn selection_toggle_and_prune() {
        let mut v = ViewState::default();
        assert!(v.toggle_selection(EmployeeId(1)));
        assert!(v.toggle_selection(EmployeeId(2)));
        assert!(!v.toggle_selection(EmployeeId(1)));
        v.set_selection([EmployeeId(2), EmployeeId(3), EmployeeId(4)]);
        let live: FxHashSet<EmployeeId> = [EmployeeId(2), EmployeeId(4)].into_iter().collect();
        assert_eq!(v.prune_selection(&live), 1);
        assert_eq!(v.selection.iter().copied().collect::<Vec<_>>(), vec![EmployeeId(2), EmployeeId(4)]);
    }
}
