//! Memoized filter → sort → paginate.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use roster_core::{Employee, EmployeeId, FilterState, PageState, SortState};
use tracing::debug;

use crate::selectors::EmployeeStats;
use crate::{filter_positions, page_window, sort_positions};

/// Everything the pipeline reads. `revision` must change whenever `records` does.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    pub records: &'a [Employee],
    pub revision: u64,
    pub filter: &'a FilterState,
    pub sort: SortState,
    pub page: PageState,
}

/// Derived view for one set of inputs. Positions index into the `records` it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub filtered: Arc<Vec<usize>>,
    pub sorted: Arc<Vec<usize>>,
    pub window: Range<usize>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl View {
    /// Positions of the records on the current page, in sorted order.
    pub fn page_positions(&self) -> &[usize] {
        &self.sorted[self.window.clone()]
    }

    pub fn page_records(&self, records: &[Employee]) -> Vec<Employee> {
        self.page_positions().iter().map(|&i| records[i].clone()).collect()
    }

    pub fn sorted_records(&self, records: &[Employee]) -> Vec<Employee> {
        self.sorted.iter().map(|&i| records[i].clone()).collect()
    }

    pub fn filtered_ids(&self, records: &[Employee]) -> Vec<EmployeeId> {
        self.filtered.iter().map(|&i| records[i].id).collect()
    }

    pub fn page_ids(&self, records: &[Employee]) -> Vec<EmployeeId> {
        self.page_positions().iter().map(|&i| records[i].id).collect()
    }
}

/// How many times each stage actually ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounters {
    pub filter: u64,
    pub sort: u64,
    pub page: u64,
    pub stats: u64,
}

struct FilterMemo {
    revision: u64,
    filter: FilterState,
    out: Arc<Vec<usize>>,
    generation: u64,
}

struct SortMemo {
    filter_generation: u64,
    sort: SortState,
    out: Arc<Vec<usize>>,
    generation: u64,
}

struct PageMemo {
    sort_generation: u64,
    page: PageState,
    window: Range<usize>,
    total_pages: usize,
    current_page: usize,
}

/// Each stage is recomputed only when its own inputs changed: filter on
/// (revision, filter), sort on (filter output, sort), page on (sort output, page).
#[derive(Default)]
pub struct Pipeline {
    filter: Option<FilterMemo>,
    sort: Option<SortMemo>,
    page: Option<PageMemo>,
    stats: Option<(u64, EmployeeStats)>,
    generation: u64,
    passes: PassCounters,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passes(&self) -> PassCounters {
        self.passes
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn run(&mut self, inp: Inputs<'_>) -> View {
        let (filtered, filter_gen) = self.filtered(&inp);
        let (sorted, sort_gen) = self.sorted(&inp, &filtered, filter_gen);
        let (window, total_pages, current_page) = self.paged(&inp, sorted.len(), sort_gen);
        View { total_count: sorted.len(), filtered, sorted, window, total_pages, current_page }
    }

    fn filtered(&mut self, inp: &Inputs<'_>) -> (Arc<Vec<usize>>, u64) {
        if let Some(m) = &self.filter {
            if m.revision == inp.revision && m.filter == *inp.filter {
                return (Arc::clone(&m.out), m.generation);
            }
        }
        let started = Instant::now();
        let out = Arc::new(filter_positions(inp.records, inp.filter));
        let generation = self.next_generation();
        self.passes.filter += 1;
        metrics::counter!("derive_filter_passes_total", 1u64);
        metrics::histogram!("derive_filter_ms", started.elapsed().as_secs_f64() * 1_000.0);
        debug!(revision = inp.revision, total = inp.records.len(), kept = out.len(), "filter pass");
        self.filter = Some(FilterMemo { revision: inp.revision, filter: inp.filter.clone(), out: Arc::clone(&out), generation });
        (out, generation)
    }

    fn sorted(&mut self, inp: &Inputs<'_>, filtered: &Arc<Vec<usize>>, filter_generation: u64) -> (Arc<Vec<usize>>, u64) {
        if let Some(m) = &self.sort {
            if m.filter_generation == filter_generation && m.sort == inp.sort {
                return (Arc::clone(&m.out), m.generation);
            }
        }
        let started = Instant::now();
        let out = Arc::new(sort_positions(inp.records, filtered, inp.sort));
        let generation = self.next_generation();
        self.passes.sort += 1;
        metrics::counter!("derive_sort_passes_total", 1u64);
        metrics::histogram!("derive_sort_ms", started.elapsed().as_secs_f64() * 1_000.0);
        debug!(key = %inp.sort.key, direction = ?inp.sort.direction, len = out.len(), "sort pass");
        self.sort = Some(SortMemo { filter_generation, sort: inp.sort, out: Arc::clone(&out), generation });
        (out, generation)
    }

    fn paged(&mut self, inp: &Inputs<'_>, len: usize, sort_generation: u64) -> (Range<usize>, usize, usize) {
        if let Some(m) = &self.page {
            if m.sort_generation == sort_generation && m.page == inp.page {
                return (m.window.clone(), m.total_pages, m.current_page);
            }
        }
        let w = page_window(len, inp.page);
        self.passes.page += 1;
        self.page = Some(PageMemo {
            sort_generation,
            page: inp.page,
            window: w.range.clone(),
            total_pages: w.total_pages,
            current_page: w.current_page,
        });
        (w.range, w.total_pages, w.current_page)
    }

    /// Summary statistics over the whole collection, cached per revision.
    pub fn stats(&mut self, records: &[Employee], revision: u64) -> EmployeeStats {
        if let Some((rev, s)) = &self.stats {
            if *rev == revision {
                return s.clone();
            }
        }
        let s = EmployeeStats::compute(records);
        self.passes.stats += 1;
        self.stats = Some((revision, s.clone()));
        s
    }
}
