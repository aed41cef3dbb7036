#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use roster_core::{Employee, EmployeeDraft, EmployeeId, EmployeePatch, PageSizePolicy, SortDirection, SortKey, Status, ViewMode};
use roster_persist::{MemoryStorage, SnapshotStorage, SqliteStorage};
use roster_store::{HydrateSource, RosterStore, SNAPSHOT_KEY};

fn draft(first: &str, last: &str, dept: &str) -> EmployeeDraft {
    EmployeeDraft {
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        phone: "+90 555 111 2233".into(),
        department: dept.into(),
        position: "Analyst".into(),
        salary: Some(50_000),
        date_of_employment: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
        date_of_birth: NaiveDate::from_ymd_opt(1991, 2, 3).unwrap(),
        address: None,
    }
}

fn empty_store() -> RosterStore {
    let mut s = RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy::default()).0;
    s.replace_all(Vec::new());
    s
}

fn counter(s: &RosterStore) -> (Arc<AtomicUsize>, roster_store::Subscription) {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let sub = s.subscribe(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    (hits, sub)
}

#[test]
fn twenty_three_records_delete_on_last_page() {
    let mut s = empty_store();
    for i in 0..23 {
        s.create(draft(&format!("P{:02}", i), "Person", "Ops"));
    }
    s.set_items_per_page(10);
    let first = s.visible_slice();
    assert_eq!((first.total_count, first.total_pages), (23, 3));

    s.set_page(3);
    let page3 = s.visible_slice();
    assert_eq!(page3.records.len(), 3);

    let (hits, _sub) = counter(&s);
    let doomed: Vec<EmployeeId> = page3.records.iter().take(2).map(|e| e.id).collect();
    assert_eq!(s.delete_many(&doomed), 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1, "bulk delete notifies once");

    let after = s.visible_slice();
    assert_eq!((after.total_count, after.total_pages, after.current_page), (21, 3, 3));
    assert_eq!(after.records.len(), 1);
}

#[test]
fn deleting_last_page_clamps_cursor_in_same_cycle() {
    let mut s = empty_store();
    for i in 0..11 {
        s.create(draft(&format!("Q{}", i), "Clamp", "Ops"));
    }
    s.set_page(2);
    assert_eq!(s.visible_slice().records.len(), 1);
    let last = s.visible_slice().records[0].id;

    let mut rx = s.subscribe_epoch();
    rx.borrow_and_update();
    s.delete(last);
    assert!(rx.has_changed().unwrap());
    assert_eq!(s.view_state().page.current, 1);
    let slice = s.visible_slice();
    assert_eq!((slice.current_page, slice.total_pages, slice.records.len()), (1, 1, 10));
}

#[test]
fn sort_by_last_name_and_toggle() {
    let mut s = empty_store();
    for last in ["Demir", "Arslan", "Kaya"] {
        s.create(draft("X", last, "Ops"));
    }
    s.set_sort(SortKey::LastName);
    let names: Vec<String> = s.visible_slice().records.into_iter().map(|e| e.last_name).collect();
    assert_eq!(names, vec!["Arslan", "Demir", "Kaya"]);
    s.set_sort(SortKey::LastName);
    let names: Vec<String> = s.visible_slice().records.into_iter().map(|e| e.last_name).collect();
    assert_eq!(names, vec!["Kaya", "Demir", "Arslan"]);
    assert_eq!(s.view_state().sort.direction, SortDirection::Desc);
}

#[test]
fn selection_survives_sort_and_paging_and_drops_deleted() {
    let (mut s, _) = RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy { list: 2, grid: 1 });
    s.set_selection([EmployeeId(1), EmployeeId(5)]);
    s.set_sort(SortKey::Salary);
    s.set_sort(SortKey::Salary);
    s.set_page(3);
    s.set_view_mode(ViewMode::Grid);
    assert_eq!(s.selection(), vec![EmployeeId(1), EmployeeId(5)]);
    s.delete(EmployeeId(5));
    assert_eq!(s.selection(), vec![EmployeeId(1)]);
    s.toggle_selection(EmployeeId(2));
    s.select_all_filtered();
    assert_eq!(s.selection().len(), 4);
    s.clear_selection();
    assert!(s.selection().is_empty());
}

#[test]
fn ids_stay_unique_under_mixed_operations() {
    let mut s = empty_store();
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    for step in 0..300u32 {
        // xorshift keeps the sequence reproducible
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let ids: Vec<EmployeeId> = s.records().iter().map(|e| e.id).collect();
        let pick = |n: u64| ids.get((n as usize) % ids.len().max(1)).copied().unwrap_or(EmployeeId(9_999));
        match state % 5 {
            0 | 1 => {
                s.create(draft(&format!("N{}", step), "Mixed", "Ops"));
            }
            2 => {
                s.update(pick(state >> 8), &EmployeePatch { department: Some("Moved".into()), ..Default::default() });
            }
            3 => {
                s.delete(pick(state >> 8));
            }
            _ => {
                s.delete_many(&[pick(state >> 8), pick(state >> 16), EmployeeId(123_456)]);
            }
        }
        let mut seen: Vec<EmployeeId> = s.records().iter().map(|e| e.id).collect();
        let n = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), n, "duplicate id after step {}", step);
        let v = s.view_state().page.current;
        assert!(v >= 1 && v <= s.visible_slice().total_pages);
    }
}

#[test]
fn deleting_missing_id_changes_nothing() {
    let (mut s, _) = RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy::default());
    let before: Vec<Employee> = s.records().to_vec();
    assert!(!s.delete(EmployeeId(777)));
    assert!(!s.update(EmployeeId(777), &EmployeePatch { status: Some(Status::Inactive), ..Default::default() }));
    assert_eq!(s.records(), before.as_slice());
}

#[test]
fn snapshot_roundtrip_through_sqlite() {
    let path = std::env::temp_dir().join(format!(
        "roster-roundtrip-{}.db",
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_nanos()
    ));
    let path = path.to_string_lossy().to_string();
    let written: Vec<Employee> = {
        let storage = Arc::new(SqliteStorage::open(&path).unwrap());
        let (mut s, src) = RosterStore::open(storage, PageSizePolicy::default());
        assert!(matches!(src, HydrateSource::Seed(_)));
        s.create(draft("Zeynep", "Aydın", "Legal"));
        s.update(EmployeeId(2), &EmployeePatch { status: Some(Status::Inactive), ..Default::default() });
        s.set_status_many(&[EmployeeId(3), EmployeeId(4)], Status::Inactive);
        assert!(s.last_persist_error().is_none());
        s.records().to_vec()
    };
    let storage = Arc::new(SqliteStorage::open(&path).unwrap());
    let (s, src) = RosterStore::open(storage, PageSizePolicy::default());
    assert_eq!(src, HydrateSource::Snapshot { records: 6 });
    assert_eq!(s.records(), written.as_slice());
}

#[test]
fn snapshot_uses_camel_case_and_storage_dates() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut s, _) = RosterStore::open(storage.clone(), PageSizePolicy::default());
    s.delete(EmployeeId(5));
    let raw = storage.get(SNAPSHOT_KEY).unwrap().unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v.as_array().map(|a| a.len()), Some(4));
    assert_eq!(v[0]["dateOfEmployment"], "15/03/2022");
    assert_eq!(v[0]["lastName"], "Yılmaz");
}

#[test]
fn every_intent_notifies_once() {
    let (mut s, _) = RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy::default());
    let (hits, sub) = counter(&s);
    s.set_search("a");
    s.set_department_filter(Some("Engineering"));
    s.clear_filters();
    s.set_sort(SortKey::Email);
    s.set_page(1);
    s.delete(EmployeeId(404));
    assert_eq!(hits.load(Ordering::SeqCst), 6);
    drop(sub);
    s.set_search("b");
    assert_eq!(hits.load(Ordering::SeqCst), 6);
}

#[test]
fn paging_does_not_resort() {
    let (mut s, _) = RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy { list: 2, grid: 2 });
    s.set_sort(SortKey::LastName);
    s.visible_slice();
    let before = s.passes();
    s.set_page(2);
    s.visible_slice();
    s.set_page(3);
    s.visible_slice();
    let after = s.passes();
    assert_eq!((after.filter, after.sort), (before.filter, before.sort));
    assert!(after.page > before.page);
}
