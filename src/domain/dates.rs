use chrono::NaiveDate;

/// Calendar date encoded as a YYYYMMDD integer
pub type ContestDate = u32;

pub fn parse_contest_date(date: ContestDate) -> Option<NaiveDate> {
    let year = (date / 10_000) as i32;
    let month = (date / 100) % 100;
    let day = date % 100;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Signed day count from `earlier` to `later`; `None` when either is not a real date
pub fn days_between(earlier: ContestDate, later: ContestDate) -> Option<i64> {
    let from = parse_contest_date(earlier)?;
    let to = parse_contest_date(later)?;
    Some(to.signed_duration_since(from).num_days())
}
