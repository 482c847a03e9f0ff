use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime};

/// Archive month ("YYYY-MM"), ordered chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8, // 1..=12
}

impl YearMonth {
    pub fn new(year: u16, month: u8) -> Self {
        assert!((1..=12).contains(&month), "Month must be 1..=12");
        Self { year, month }
    }

    pub fn of_date(d: Date) -> Self {
        Self { year: d.year().clamp(0, u16::MAX as i32) as u16, month: d.month() as u8 }
    }

    /// Month containing the Unix timestamp `ts` (UTC).
    pub fn of_epoch(ts: i64) -> Self {
        let dt = OffsetDateTime::from_unix_timestamp(ts).unwrap_or(OffsetDateTime::UNIX_EPOCH);
        Self::of_date(dt.date())
    }

    /// Unix timestamp of the first second of this month (UTC).
    pub fn start_epoch(self) -> i64 {
        let month = Month::try_from(self.month).unwrap_or(Month::January);
        Date::from_calendar_date(self.year as i32, month, 1)
            .map(|d| d.midnight().assume_utc().unix_timestamp())
            .unwrap_or(0)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s.split_once('-').ok_or("expected YYYY-MM")?;
        let year: u16 = y.parse().map_err(|_| "invalid year")?;
        let month: u8 = m.parse().map_err(|_| "invalid month")?;
        if !(1..=12).contains(&month) {
            return Err("month must be 01..12".into());
        }
        Ok(Self { year, month })
    }
}

/// Months covered by stepping back 30 days at a time from `today`, newest first,
/// without repeats. `months_back == 0` yields nothing.
pub fn recent_months(today: Date, months_back: u32) -> Vec<YearMonth> {
    let mut out: Vec<YearMonth> = Vec::new();
    for i in 0..months_back {
        // Stop at the start of the calendar; nothing older can be named.
        let d = match today.checked_sub(Duration::days(30 * i as i64)) {
            Some(d) if d.year() >= 1 => d,
            _ => break,
        };
        // Steps only move backwards, so a repeat is always the last entry.
        let ym = YearMonth::of_date(d);
        if out.last() != Some(&ym) {
            out.push(ym);
        }
    }
    out
}

/// Earliest accepted `created_utc`: `now - months * 30 days`, clamped to the
/// earliest representable day.
pub fn cutoff_from_months_back(now: OffsetDateTime, months_back: u32) -> i64 {
    now.checked_sub(Duration::days(30 * months_back as i64))
        .unwrap_or_else(|| Date::MIN.midnight().assume_utc())
        .unix_timestamp()
}

/// `YYYY-MM-DD` for a Unix timestamp (UTC).
pub fn format_day(ts: i64) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&fmt).ok())
        .unwrap_or_else(|| "invalid date".to_string())
}

/// `YYYYmmdd_HHMMSS`, used in default output file names.
pub fn file_stamp(now: OffsetDateTime) -> String {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    now.format(&fmt).unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// `YYYY-MM-DD HH:MM:SS` (UTC), for report headers.
pub fn format_timestamp(now: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(&fmt).unwrap_or_else(|_| now.unix_timestamp().to_string())
}
