//! Month keys and the per-group month report document.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors raised when a month key does not have the `YYYY-MM` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonthIdError {
    #[error("month id must look like YYYY-MM, got '{0}'")]
    Malformed(String),
    #[error("month {0} is out of range 01-12")]
    MonthOutOfRange(u32),
    #[error("year {0} is out of range 1900-9999")]
    YearOutOfRange(i32),
}

/// Calendar month key, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthId {
    year: i32,
    month: u32,
}

impl MonthId {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthIdError> {
        if !(1900..=9999).contains(&year) {
            return Err(MonthIdError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(MonthIdError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    /// Parse a `YYYY-MM` key. Anything else is rejected, including `2026-1`
    /// and surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, MonthIdError> {
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(MonthIdError::Malformed(value.to_string()));
        }

        let year: i32 = value[..4]
            .parse()
            .map_err(|_| MonthIdError::Malformed(value.to_string()))?;
        let month: u32 = value[5..]
            .parse()
            .map_err(|_| MonthIdError::Malformed(value.to_string()))?;
        Self::new(year, month)
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month on the local clock.
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // year and month are range-checked on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Human label such as `February 2026`.
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthId {
    type Err = MonthIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MonthId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MonthId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a month report. Reversible in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Draft,
    Submitted,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Submitted => "submitted",
        }
    }

    /// Parse a stored status value. Unknown values fall back to draft, which
    /// keeps a damaged document editable rather than locked.
    pub fn from_stored(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "submitted" => ReportStatus::Submitted,
            _ => ReportStatus::Draft,
        }
    }

    /// Submitted reports are read-only for the supervisor screens.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ReportStatus::Submitted)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report document per group per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthReport {
    pub month: MonthId,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl MonthReport {
    pub fn new_draft(month: MonthId, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            month,
            status: ReportStatus::Draft,
            created_at: now,
            created_by: user_id.to_string(),
            updated_at: now,
            updated_by: user_id.to_string(),
        }
    }
}
