//! Collection-wide selectors: statistics, distinct values, search suggestions.

use std::collections::BTreeMap;

use roster_core::{Employee, EmployeeId, Status};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Maximum number of suggestions returned for a search prefix.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_department: BTreeMap<String, usize>,
    /// Mean salary rounded to the nearest unit; records without a salary count as 0.
    pub average_salary: u64,
}

impl EmployeeStats {
    pub fn compute(records: &[Employee]) -> Self {
        let mut s = EmployeeStats { total: records.len(), ..Default::default() };
        let mut salary_sum: u128 = 0;
        for e in records {
            match e.status {
                Status::Active => s.active += 1,
                Status::Inactive => s.inactive += 1,
            }
            *s.by_department.entry(e.department.clone()).or_default() += 1;
            salary_sum += u128::from(e.salary.unwrap_or(0));
        }
        if s.total > 0 {
            let total = s.total as u128;
            s.average_salary = ((salary_sum + total / 2) / total) as u64;
        }
        s
    }
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut out: Vec<String> = values.filter(|v| seen.insert(*v)).map(str::to_string).collect();
    out.sort();
    out
}

/// Distinct department names, sorted. Feeds the department filter options.
pub fn unique_departments(records: &[Employee]) -> Vec<String> {
    distinct_sorted(records.iter().map(|e| e.department.as_str()))
}

pub fn unique_positions(records: &[Employee]) -> Vec<String> {
    distinct_sorted(records.iter().map(|e| e.position.as_str()))
}

/// Up to five distinct field values containing `term` (case-insensitive), in collection order.
/// Terms shorter than two characters yield nothing.
pub fn suggestions(records: &[Employee], term: &str) -> Vec<String> {
    if term.chars().count() < 2 {
        return Vec::new();
    }
    let needle = term.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for e in records {
        for v in [&e.first_name, &e.last_name, &e.department, &e.position] {
            if v.to_lowercase().contains(&needle) && !out.iter().any(|s| s == v) {
                out.push(v.clone());
            }
        }
    }
    out.truncate(MAX_SUGGESTIONS);
    out
}

pub fn find(records: &[Employee], id: EmployeeId) -> Option<&Employee> {
    records.iter().find(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::seed::seed_employees;

    #[test]
    fn stats_over_seed() {
        let mut recs = seed_employees();
        recs[2].status = Status::Inactive;
        let s = EmployeeStats::compute(&recs);
        assert_eq!((s.total, s.active, s.inactive), (5, 4, 1));
        assert_eq!(s.by_department.get("Engineering"), Some(&2));
        assert_eq!(s.average_salary, 76_000);
        assert_eq!(EmployeeStats::compute(&[]).average_salary, 0);
    }

    #[test]
    fn departments_distinct_and_sorted() {
        let recs = seed_employees();
        assert_eq!(unique_departments(&recs), vec!["Analytics", "Design", "Engineering", "Product"]);
        assert_eq!(unique_positions(&recs).len(), 5);
    }

    #[test]
    fn suggestions_need_two_chars() {
        let recs = seed_employees();
        assert!(suggestions(&recs, "e").is_empty());
        assert_eq!(suggestions(&recs, "dev"), vec!["Senior Developer", "Junior Developer"]);
        assert_eq!(suggestions(&recs, "en"), vec!["Engineering", "Senior Developer"]);
    }

    #[test]
    fn find_by_id() {
        let recs = seed_employees();
        assert_eq!(find(&recs, EmployeeId(3)).map(|e| e.last_name.as_str()), Some("Kaya"));
        assert!(find(&recs, EmployeeId(99)).is_none());
    }
}
