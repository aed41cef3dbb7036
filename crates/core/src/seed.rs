//! Built-in seed dataset used when no compatible snapshot exists.

use chrono::NaiveDate;

use crate::{Employee, EmployeeId, Status};

struct Row {
    id: u64,
    first: &'static str,
    last: &'static str,
    email: &'static str,
    department: &'static str,
    position: &'static str,
    salary: u64,
    employed: (i32, u32, u32),
    born: (i32, u32, u32),
    phone: &'static str,
    address: &'static str,
}

const ROWS: &[Row] = &[
    Row { id: 1, first: "Ahmet", last: "Yılmaz", email: "ahmet.yilmaz@ing.com", department: "Engineering", position: "Senior Developer", salary: 85_000, employed: (2022, 3, 15), born: (1995, 5, 12), phone: "+90 555 123 4567", address: "Levent, Istanbul" },
    Row { id: 2, first: "Ayşe", last: "Demir", email: "ayse.demir@ing.com", department: "Product", position: "Product Manager", salary: 95_000, employed: (2021, 8, 22), born: (1992, 11, 8), phone: "+90 555 234 5678", address: "Kadıköy, Istanbul" },
    Row { id: 3, first: "Mehmet", last: "Kaya", email: "mehmet.kaya@ing.com", department: "Design", position: "UX Designer", salary: 70_000, employed: (2023, 1, 10), born: (1990, 7, 25), phone: "+90 555 345 6789", address: "Beşiktaş, Istanbul" },
    Row { id: 4, first: "Fatma", last: "Özkan", email: "fatma.ozkan@ing.com", department: "Analytics", position: "Data Analyst", salary: 75_000, employed: (2022, 11, 5), born: (1994, 9, 3), phone: "+90 555 456 7890", address: "Şişli, Istanbul" },
    Row { id: 5, first: "Can", last: "Arslan", email: "can.arslan@ing.com", department: "Engineering", position: "Junior Developer", salary: 55_000, employed: (2023, 6, 1), born: (1998, 12, 18), phone: "+90 555 567 8901", address: "Maltepe, Istanbul" },
];

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    // rows above are fixed, valid calendar dates
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn seed_employees() -> Vec<Employee> {
    ROWS.iter()
        .map(|r| Employee {
            id: EmployeeId(r.id),
            first_name: r.first.to_string(),
            last_name: r.last.to_string(),
            email: r.email.to_string(),
            phone: r.phone.to_string(),
            department: r.department.to_string(),
            position: r.position.to_string(),
            salary: Some(r.salary),
            date_of_employment: date(r.employed),
            date_of_birth: date(r.born),
            status: Status::Active,
            address: Some(r.address.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_ids_unique_and_dates_valid() {
        let seed = seed_employees();
        assert_eq!(seed.len(), 5);
        let mut ids: Vec<_> = seed.iter().map(|e| e.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert!(seed.iter().all(|e| e.date_of_birth < e.date_of_employment));
    }
}
