//! Calendar date formats: `DD/MM/YYYY` in the snapshot, `YYYY-MM-DD` from form inputs.

use chrono::{Datelike, NaiveDate};

pub const STORAGE_FORMAT: &str = "%d/%m/%Y";
pub const INPUT_FORMAT: &str = "%Y-%m-%d";

pub fn parse_storage(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), STORAGE_FORMAT).ok()
}

pub fn parse_input(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), INPUT_FORMAT).ok()
}

pub fn format_storage(d: NaiveDate) -> String {
    d.format(STORAGE_FORMAT).to_string()
}

pub fn format_input(d: NaiveDate) -> String {
    d.format(INPUT_FORMAT).to_string()
}

/// Whole years elapsed between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// serde adapter for `DD/MM/YYYY` strings.
pub mod dmy {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&d.format(super::STORAGE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_storage(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date {:?}, expected DD/MM/YYYY", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn formats_convert() {
        let date = parse_input("2022-03-15").unwrap();
        assert_eq!(format_storage(date), "15/03/2022");
        assert_eq!(parse_storage("15/03/2022"), Some(date));
        assert_eq!(format_input(date), "2022-03-15");
        assert!(parse_input("15/03/2022").is_none());
    }

    #[test]
    fn age_counts_birthday() {
        assert_eq!(age_on(d(2000, 6, 10), d(2018, 6, 9)), 17);
        assert_eq!(age_on(d(2000, 6, 10), d(2018, 6, 10)), 18);
        assert_eq!(age_on(d(2000, 6, 10), d(2018, 5, 30)), 17);
    }
}
