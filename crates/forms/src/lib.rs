//! Roster forms: add/edit input validation, the submit boundary, and page routes.

#![forbid(unsafe_code)]

use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use roster_core::dates::{age_on, format_input, parse_input};
use roster_core::{Employee, EmployeeDraft};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod routes;
pub mod submit;

pub use routes::Route;
pub use submit::{submit_create, submit_update, Immediate, Latency, SimulatedLatency, SubmitError, Submitted};

pub const MIN_AGE_YEARS: i32 = 18;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9+\-\s()]+$").expect("phone pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FirstName,
    LastName,
    DateOfEmployment,
    DateOfBirth,
    Phone,
    Email,
    Department,
    Position,
    Salary,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::DateOfEmployment => "dateOfEmployment",
            FormField::DateOfBirth => "dateOfBirth",
            FormField::Phone => "phone",
            FormField::Email => "email",
            FormField::Department => "department",
            FormField::Position => "position",
            FormField::Salary => "salary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    InvalidPhone,
    InvalidEmail,
    InvalidDate,
    InvalidNumber,
    BirthNotBeforeEmployment,
    Underage,
}

impl ErrorKind {
    /// Translation key for the message.
    pub fn key(&self) -> &'static str {
        match self {
            ErrorKind::Required => "required_field",
            ErrorKind::InvalidPhone => "invalid_phone",
            ErrorKind::InvalidEmail => "invalid_email",
            ErrorKind::InvalidDate => "invalid_date",
            ErrorKind::InvalidNumber => "invalid_number",
            ErrorKind::BirthNotBeforeEmployment => "date_birth_before_employment",
            ErrorKind::Underage => "employee_min_age",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Required => "This field is required",
            ErrorKind::InvalidPhone => "Please enter a valid phone number",
            ErrorKind::InvalidEmail => "Please enter a valid email address",
            ErrorKind::InvalidDate => "Please enter a valid date",
            ErrorKind::InvalidNumber => "Please enter a valid number",
            ErrorKind::BirthNotBeforeEmployment => "Date of birth must be before employment date",
            ErrorKind::Underage => "Employee must be at least 18 years old",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FormField,
    pub kind: ErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.kind.message())
    }
}

/// One message per field; a later rule on the same field replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("invalid employee form: {}", join_errors(.errors))]
pub struct ValidationErrors {
    errors: SmallVec<[FieldError; 4]>,
}

impl ValidationErrors {
    fn set(&mut self, field: FormField, kind: ErrorKind) {
        match self.errors.iter_mut().find(|e| e.field == field) {
            Some(existing) => existing.kind = kind,
            None => self.errors.push(FieldError { field, kind }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: FormField) -> Option<ErrorKind> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

/// Raw form input as typed by the user. Dates are `YYYY-MM-DD`; salary and address are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForm {
    pub first_name: String,
    pub last_name: String,
    pub date_of_employment: String,
    pub date_of_birth: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub position: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub address: String,
}

impl EmployeeForm {
    /// Prefill for editing an existing record.
    pub fn from_employee(e: &Employee) -> Self {
        Self {
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            date_of_employment: format_input(e.date_of_employment),
            date_of_birth: format_input(e.date_of_birth),
            phone: e.phone.clone(),
            email: e.email.clone(),
            department: e.department.clone(),
            position: e.position.clone(),
            salary: e.salary.map(|s| s.to_string()).unwrap_or_default(),
            address: e.address.clone().unwrap_or_default(),
        }
    }

    /// Anything typed at all; used to confirm before discarding an add form.
    pub fn has_input(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.date_of_employment,
            &self.date_of_birth,
            &self.phone,
            &self.email,
            &self.department,
            &self.position,
            &self.salary,
            &self.address,
        ]
        .iter()
        .any(|v| !v.trim().is_empty())
    }

    /// Unsaved edits relative to the record the form was opened on.
    pub fn differs_from(&self, original: &Employee) -> bool {
        *self != Self::from_employee(original)
    }
}

fn required<'a>(errs: &mut ValidationErrors, field: FormField, value: &'a str) -> Option<&'a str> {
    let v = value.trim();
    if v.is_empty() {
        errs.set(field, ErrorKind::Required);
        None
    } else {
        Some(v)
    }
}

fn date_field(errs: &mut ValidationErrors, field: FormField, value: &str) -> Option<NaiveDate> {
    let raw = required(errs, field, value)?;
    let parsed = parse_input(raw);
    if parsed.is_none() {
        errs.set(field, ErrorKind::InvalidDate);
    }
    parsed
}

/// Check every rule and build a draft, or report all failing fields.
///
/// `today` anchors the minimum-age rule so callers (and tests) control the clock.
pub fn validate(form: &EmployeeForm, today: NaiveDate) -> Result<EmployeeDraft, ValidationErrors> {
    let mut errs = ValidationErrors::default();

    let first = required(&mut errs, FormField::FirstName, &form.first_name);
    let last = required(&mut errs, FormField::LastName, &form.last_name);
    let employed = date_field(&mut errs, FormField::DateOfEmployment, &form.date_of_employment);
    let born = date_field(&mut errs, FormField::DateOfBirth, &form.date_of_birth);

    let phone = required(&mut errs, FormField::Phone, &form.phone);
    if let Some(p) = phone {
        if !PHONE_RE.is_match(p) {
            errs.set(FormField::Phone, ErrorKind::InvalidPhone);
        }
    }
    let email = required(&mut errs, FormField::Email, &form.email);
    if let Some(e) = email {
        if !EMAIL_RE.is_match(e) {
            errs.set(FormField::Email, ErrorKind::InvalidEmail);
        }
    }
    let department = required(&mut errs, FormField::Department, &form.department);
    let position = required(&mut errs, FormField::Position, &form.position);

    let salary = match form.salary.trim() {
        "" => None,
        raw => match raw.replace(['_', ','], "").parse::<u64>() {
            Ok(v) => Some(v),
            Err(_) => {
                errs.set(FormField::Salary, ErrorKind::InvalidNumber);
                None
            }
        },
    };

    if let (Some(b), Some(e)) = (born, employed) {
        if b >= e {
            errs.set(FormField::DateOfBirth, ErrorKind::BirthNotBeforeEmployment);
        }
    }
    if let Some(b) = born {
        if age_on(b, today) < MIN_AGE_YEARS {
            errs.set(FormField::DateOfBirth, ErrorKind::Underage);
        }
    }

    match (first, last, employed, born, phone, email, department, position) {
        (Some(first), Some(last), Some(employed), Some(born), Some(phone), Some(email), Some(department), Some(position))
            if errs.is_empty() =>
        {
            let address = form.address.trim();
            Ok(EmployeeDraft {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                department: department.to_string(),
                position: position.to_string(),
                salary,
                date_of_employment: employed,
                date_of_birth: born,
                address: (!address.is_empty()).then(|| address.to_string()),
            })
        }
        _ => Err(errs),
    }
}
