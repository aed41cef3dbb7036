//! Roster query: the derivation pipeline over the record collection.
//!
//! Three pure stages, each a function of its inputs only:
//! 1. filter: keep records matching the search term, department and status
//! 2. sort: stable sort of the filtered positions by one `SortKey`
//! 3. paginate: a window over the sorted positions
//!
//! Stages work on positions into the record slice so nothing is cloned until a
//! view materializes its page. `Pipeline` memoizes each stage on its inputs.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::ops::Range;

use roster_core::{total_pages, Employee, FilterState, PageState, SortDirection, SortState};

mod pipeline;
pub mod selectors;

pub use pipeline::{Inputs, PassCounters, Pipeline, View};
pub use selectors::{find, suggestions, unique_departments, unique_positions, EmployeeStats};

/// Case-insensitive substring match over the searchable text fields.
pub fn search_matches(emp: &Employee, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    [&emp.first_name, &emp.last_name, &emp.email, &emp.department, &emp.position]
        .iter()
        .any(|hay| hay.to_lowercase().contains(needle_lower))
}

/// Full filter predicate: search AND department AND status.
pub fn matches(emp: &Employee, filter: &FilterState) -> bool {
    let needle = filter.search.to_lowercase();
    matches_lowered(emp, filter, &needle)
}

fn matches_lowered(emp: &Employee, filter: &FilterState, needle_lower: &str) -> bool {
    if !search_matches(emp, needle_lower) {
        return false;
    }
    if let Some(dept) = filter.department() {
        if emp.department != dept {
            return false;
        }
    }
    filter.status.matches(emp.status)
}

/// Positions of records passing `filter`, in collection order.
pub fn filter_positions(records: &[Employee], filter: &FilterState) -> Vec<usize> {
    if filter.is_empty() {
        return (0..records.len()).collect();
    }
    let needle = filter.search.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, e)| matches_lowered(e, filter, &needle))
        .map(|(i, _)| i)
        .collect()
}

/// Stable sort of `positions` by the active key. Ties keep their incoming order in both directions.
pub fn sort_positions(records: &[Employee], positions: &[usize], sort: SortState) -> Vec<usize> {
    let mut out = positions.to_vec();
    out.sort_by(|a, b| compare(&records[*a], &records[*b], sort));
    out
}

/// Page window outcome: the slice range plus the clamped cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub range: Range<usize>,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Window `[(page-1)*size, page*size)` over `len` items; `page` is clamped to `[1, total_pages]`.
pub fn page_window(len: usize, page: PageState) -> PageWindow {
    let per = page.per_page.max(1);
    let pages = total_pages(len, per);
    let current = page.current.clamp(1, pages);
    let start = ((current - 1) * per).min(len);
    let end = (start + per).min(len);
    PageWindow { range: start..end, total_pages: pages, current_page: current }
}

/// Comparator for one sort state. Descending is the exact reverse, so a stable sort keeps ties.
pub fn compare(a: &Employee, b: &Employee, sort: SortState) -> Ordering {
    let ord = sort.key.value(a).compare(&sort.key.value(b));
    match sort.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}
