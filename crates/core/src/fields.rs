//! Employee field keys used for sorting, filtering and listing.
//!
//! This module provides:
//! - The `SortKey` enumeration (no free-form field strings reach the pipeline)
//! - Column specs (labels, widths) for list-style views
//! - Typed field extraction via `FieldValue`

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Employee;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("unknown field: {0}")]
    Field(String),
    #[error("unknown status: {0}")]
    Status(String),
    #[error("unknown view mode: {0}")]
    ViewMode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    Department,
    Position,
    Salary,
    DateOfEmployment,
    DateOfBirth,
    Status,
}

impl SortKey {
    pub const ALL: [SortKey; 11] = [
        SortKey::Id,
        SortKey::FirstName,
        SortKey::LastName,
        SortKey::Email,
        SortKey::Phone,
        SortKey::Department,
        SortKey::Position,
        SortKey::Salary,
        SortKey::DateOfEmployment,
        SortKey::DateOfBirth,
        SortKey::Status,
    ];

    /// Snapshot field name (camelCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::FirstName => "firstName",
            SortKey::LastName => "lastName",
            SortKey::Email => "email",
            SortKey::Phone => "phone",
            SortKey::Department => "department",
            SortKey::Position => "position",
            SortKey::Salary => "salary",
            SortKey::DateOfEmployment => "dateOfEmployment",
            SortKey::DateOfBirth => "dateOfBirth",
            SortKey::Status => "status",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Id => "ID",
            SortKey::FirstName => "First Name",
            SortKey::LastName => "Last Name",
            SortKey::Email => "Email",
            SortKey::Phone => "Phone",
            SortKey::Department => "Department",
            SortKey::Position => "Position",
            SortKey::Salary => "Salary",
            SortKey::DateOfEmployment => "Date of Employment",
            SortKey::DateOfBirth => "Date of Birth",
            SortKey::Status => "Status",
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, SortKey::DateOfEmployment | SortKey::DateOfBirth)
    }

    /// Project one field of `emp` into a comparable value.
    pub fn value<'a>(&self, emp: &'a Employee) -> FieldValue<'a> {
        match self {
            SortKey::Id => FieldValue::Number(Some(emp.id.0)),
            SortKey::FirstName => FieldValue::Text(&emp.first_name),
            SortKey::LastName => FieldValue::Text(&emp.last_name),
            SortKey::Email => FieldValue::Text(&emp.email),
            SortKey::Phone => FieldValue::Text(&emp.phone),
            SortKey::Department => FieldValue::Text(&emp.department),
            SortKey::Position => FieldValue::Text(&emp.position),
            SortKey::Salary => FieldValue::Number(emp.salary),
            SortKey::DateOfEmployment => FieldValue::Date(emp.date_of_employment),
            SortKey::DateOfBirth => FieldValue::Date(emp.date_of_birth),
            SortKey::Status => FieldValue::Text(emp.status.as_str()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseKeyError;

    /// Accepts the camelCase snapshot name, snake_case, or kebab-case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s.trim().chars().filter(|c| *c != '_' && *c != '-').collect::<String>().to_ascii_lowercase();
        SortKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().to_ascii_lowercase() == norm)
            .ok_or_else(|| ParseKeyError::Field(s.to_string()))
    }
}

/// A projected field value. Numbers may be absent (optional salary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(Option<u64>),
    Date(NaiveDate),
}

impl FieldValue<'_> {
    /// Ascending comparison. Text is compared case-insensitively; absent numbers sort first.
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => cmp_ci(a, b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            // a single key always yields one variant
            _ => Ordering::Equal,
        }
    }

    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => (*s).to_string(),
            FieldValue::Number(Some(n)) => n.to_string(),
            FieldValue::Number(None) => String::new(),
            FieldValue::Date(d) => crate::dates::format_storage(*d),
        }
    }
}

fn cmp_ci(a: &str, b: &str) -> Ordering {
    a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase))
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub key: SortKey,
    pub label: &'static str,
    pub width: usize,
}

fn col(key: SortKey, width: usize) -> FieldSpec {
    FieldSpec { key, label: key.label(), width }
}

/// Columns shown by the list view, in display order.
pub fn list_columns() -> Vec<FieldSpec> {
    vec![
        col(SortKey::Id, 4),
        col(SortKey::FirstName, 12),
        col(SortKey::LastName, 12),
        col(SortKey::DateOfEmployment, 12),
        col(SortKey::DateOfBirth, 12),
        col(SortKey::Phone, 17),
        col(SortKey::Email, 26),
        col(SortKey::Department, 12),
        col(SortKey::Position, 18),
        col(SortKey::Status, 8),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!("lastName".parse::<SortKey>().unwrap(), SortKey::LastName);
        assert_eq!("last_name".parse::<SortKey>().unwrap(), SortKey::LastName);
        assert_eq!("date-of-birth".parse::<SortKey>().unwrap(), SortKey::DateOfBirth);
        assert_eq!("nickname".parse::<SortKey>(), Err(ParseKeyError::Field("nickname".into())));
    }

    #[test]
    fn date_keys_recognized() {
        let dates: Vec<_> = SortKey::ALL.iter().filter(|k| k.is_date()).collect();
        assert_eq!(dates.len(), 2);
        assert!(SortKey::ALL.iter().all(|k| k.is_date() == k.as_str().to_ascii_lowercase().contains("date")));
    }

    #[test]
    fn text_compare_ignores_case() {
        assert_eq!(FieldValue::Text("arslan").compare(&FieldValue::Text("Demir")), Ordering::Less);
        assert_eq!(FieldValue::Text("KAYA").compare(&FieldValue::Text("kaya")), Ordering::Equal);
        assert_eq!(FieldValue::Number(None).compare(&FieldValue::Number(Some(0))), Ordering::Less);
    }
}
