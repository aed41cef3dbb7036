use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use roster_core::{EmployeeId, PageSizePolicy};
use roster_forms::{
    submit_create, submit_update, EmployeeForm, ErrorKind, FormField, Immediate, Route, SimulatedLatency, SubmitError,
};
use roster_persist::MemoryStorage;
use roster_store::RosterStore;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
}

fn store() -> RosterStore {
    RosterStore::open(Arc::new(MemoryStorage::new()), PageSizePolicy::default()).0
}

fn form() -> EmployeeForm {
    EmployeeForm {
        first_name: "Deniz".into(),
        last_name: "Aksoy".into(),
        date_of_employment: "2024-09-02".into(),
        date_of_birth: "1993-04-11".into(),
        phone: "+90 532 000 1122".into(),
        email: "deniz.aksoy@ing.com".into(),
        department: "Analytics".into(),
        position: "Data Engineer".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn missing_email_appends_nothing() {
    let mut s = store();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let _sub = s.subscribe(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    let mut f = form();
    f.email.clear();
    let err = submit_create(&mut s, &f, &Immediate, today()).await.unwrap_err();
    match err {
        SubmitError::Invalid(errs) => assert_eq!(errs.get(FormField::Email), Some(ErrorKind::Required)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(s.records().len(), 5);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn create_waits_for_latency_then_navigates() {
    let mut s = store();
    let latency = SimulatedLatency::new(Duration::from_millis(1_000));
    let started = tokio::time::Instant::now();
    let out = submit_create(&mut s, &form(), &latency, today()).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(1_000));
    assert_eq!(out.navigate, Route::List);
    assert_eq!(out.employee.id, EmployeeId(6));
    assert_eq!(s.records().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn nothing_applied_before_latency_elapses() {
    let mut s = store();
    let latency = SimulatedLatency::new(Duration::from_secs(5));
    let f = form();
    let pending = submit_create(&mut s, &f, &latency, today());
    let timed_out = tokio::time::timeout(Duration::from_secs(1), pending).await;
    assert!(timed_out.is_err());
    assert_eq!(s.records().len(), 5);
}

#[tokio::test]
async fn update_merges_and_keeps_id() {
    let mut s = store();
    let original = s.get(EmployeeId(3)).cloned().unwrap();
    let mut f = EmployeeForm::from_employee(&original);
    f.position = "Lead Designer".into();
    let out = submit_update(&mut s, EmployeeId(3), &f, &Immediate, today()).await.unwrap();
    assert_eq!(out.employee.id, EmployeeId(3));
    assert_eq!(out.employee.position, "Lead Designer");
    assert_eq!(out.employee.salary, original.salary);
    assert_eq!(out.employee.date_of_birth, original.date_of_birth);
}

#[tokio::test]
async fn update_of_missing_record_reports_not_found() {
    let mut s = store();
    let err = submit_update(&mut s, EmployeeId(99), &form(), &Immediate, today()).await.unwrap_err();
    assert!(matches!(err, SubmitError::NotFound(EmployeeId(99))));
}

#[tokio::test]
async fn blanking_optional_fields_clears_them() {
    let mut s = store();
    let original = s.get(EmployeeId(1)).cloned().unwrap();
    assert!(original.salary.is_some() && original.address.is_some());
    let mut f = EmployeeForm::from_employee(&original);
    f.salary.clear();
    f.address = "   ".into();
    let out = submit_update(&mut s, EmployeeId(1), &f, &Immediate, today()).await.unwrap();
    assert_eq!(out.employee.salary, None);
    assert_eq!(out.employee.address, None);
    let stored = s.get(EmployeeId(1)).unwrap();
    assert_eq!((stored.salary, stored.address.clone()), (None, None));
}
