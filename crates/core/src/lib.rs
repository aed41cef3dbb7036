//! Roster core types: employee records, view-state values and field keys.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod dates;
pub mod fields;
pub mod seed;

pub use fields::{FieldSpec, FieldValue, ParseKeyError, SortKey};

/// Stable record identifier. Assigned once at creation, never reused while the record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(EmployeeId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl FromStr for Status {
    type Err = ParseKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(ParseKeyError::Status(other.to_string())),
        }
    }
}

/// A single employee record as held by the store and written to the snapshot.
///
/// Field names serialize in camelCase and dates as `DD/MM/YYYY`, which is the
/// snapshot layout older sessions already wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<u64>,
    #[serde(with = "dates::dmy")]
    pub date_of_employment: NaiveDate,
    #[serde(with = "dates::dmy")]
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields supplied by a create intent. Identifier and status are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub salary: Option<u64>,
    pub date_of_employment: NaiveDate,
    pub date_of_birth: NaiveDate,
    pub address: Option<String>,
}

impl EmployeeDraft {
    pub fn into_employee(self, id: EmployeeId) -> Employee {
        Employee {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            department: self.department,
            position: self.position,
            salary: self.salary,
            date_of_employment: self.date_of_employment,
            date_of_birth: self.date_of_birth,
            status: Status::Active,
            address: self.address,
        }
    }
}

/// Partial update: `Some` fields overwrite, `None` fields are left alone.
/// For the optional attributes `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<Option<u64>>,
    pub date_of_employment: Option<NaiveDate>,
    pub date_of_birth: Option<NaiveDate>,
    pub status: Option<Status>,
    pub address: Option<Option<String>>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        *self == EmployeePatch::default()
    }

    /// Merge into `emp`. The identifier is never touched.
    pub fn apply_to(&self, emp: &mut Employee) {
        fn set<T: Clone>(dst: &mut T, src: &Option<T>) {
            if let Some(v) = src {
                *dst = v.clone();
            }
        }
        set(&mut emp.first_name, &self.first_name);
        set(&mut emp.last_name, &self.last_name);
        set(&mut emp.email, &self.email);
        set(&mut emp.phone, &self.phone);
        set(&mut emp.department, &self.department);
        set(&mut emp.position, &self.position);
        set(&mut emp.date_of_employment, &self.date_of_employment);
        set(&mut emp.date_of_birth, &self.date_of_birth);
        set(&mut emp.status, &self.status);
        set(&mut emp.salary, &self.salary);
        set(&mut emp.address, &self.address);
    }
}

impl From<EmployeeDraft> for EmployeePatch {
    fn from(d: EmployeeDraft) -> Self {
        EmployeePatch {
            first_name: Some(d.first_name),
            last_name: Some(d.last_name),
            email: Some(d.email),
            phone: Some(d.phone),
            department: Some(d.department),
            position: Some(d.position),
            salary: Some(d.salary),
            date_of_employment: Some(d.date_of_employment),
            date_of_birth: Some(d.date_of_birth),
            status: None,
            address: Some(d.address),
        }
    }
}

// ---------------- View state values ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == Status::Active,
            StatusFilter::Inactive => status == Status::Inactive,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(StatusFilter::All),
            other => other.parse::<Status>().map(|st| match st {
                Status::Active => StatusFilter::Active,
                Status::Inactive => StatusFilter::Inactive,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search: String,
    pub department: Option<String>,
    pub status: StatusFilter,
}

impl FilterState {
    /// Department filter with the empty string treated as "no filter".
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref().filter(|d| !d.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.department().is_none() && self.status == StatusFilter::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    /// Same field flips direction; a new field starts ascending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flip();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

impl FromStr for ViewMode {
    type Err = ParseKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" | "table" => Ok(ViewMode::List),
            "grid" | "card" | "cards" => Ok(ViewMode::Grid),
            other => Err(ParseKeyError::ViewMode(other.to_string())),
        }
    }
}

/// Items-per-page policy by view mode. Layout density differs, so the sizes do too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizePolicy {
    pub list: usize,
    pub grid: usize,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self { list: 10, grid: 4 }
    }
}

impl PageSizePolicy {
    pub fn for_mode(&self, mode: ViewMode) -> usize {
        match mode {
            ViewMode::List => self.list.max(1),
            ViewMode::Grid => self.grid.max(1),
        }
    }
}

/// Pagination cursor. `current` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub current: usize,
    pub per_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self { current: 1, per_page: PageSizePolicy::default().list }
    }
}

/// `max(1, ceil(len / per_page))`.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    let per = per_page.max(1);
    len.div_ceil(per).max(1)
}

pub mod prelude {
    pub use super::{
        Employee, EmployeeDraft, EmployeeId, EmployeePatch, FilterState, PageSizePolicy, PageState,
        SortDirection, SortKey, SortState, Status, StatusFilter, ViewMode,
    };
}
