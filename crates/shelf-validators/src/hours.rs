//! Opening hours: per-day lists of `HH:MM` ranges.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelf_core::FieldError;

/// Zero-padded 24h time. Ordering is lexical on the canonical string, which
/// matches chronological order for this fixed-width format.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(String);

impl TimeOfDay {
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        let b = s.as_bytes();
        if b.len() != 5 || b[2] != b':' {
            return Err(FieldError::InvalidTime);
        }
        let digits = [b[0], b[1], b[3], b[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(FieldError::InvalidTime);
        }
        let hour = (b[0] - b'0') * 10 + (b[1] - b'0');
        let minute = (b[3] - b'0') * 10 + (b[4] - b'0');
        if hour > 23 || minute > 59 {
            return Err(FieldError::InvalidTime);
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_time: start.into(),
            end_time: end.into(),
        }
    }

    /// Parses both ends and checks start precedes end.
    pub fn validate(&self) -> Result<(TimeOfDay, TimeOfDay), FieldError> {
        let start = TimeOfDay::parse(&self.start_time)?;
        let end = TimeOfDay::parse(&self.end_time)?;
        if start >= end {
            return Err(FieldError::StartNotBeforeEnd);
        }
        Ok((start, end))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub day: Weekday,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub times: Vec<TimeRange>,
}

impl DayHours {
    /// Every range valid, and no two ranges of the day overlap. Ranges that
    /// only touch (`08:00-12:00`, `12:00-14:00`) are fine. Closed days are
    /// not checked.
    pub fn validate(&self) -> Result<(), FieldError> {
        if !self.is_open {
            return Ok(());
        }
        let mut ranges = self
            .times
            .iter()
            .map(TimeRange::validate)
            .collect::<Result<Vec<_>, _>>()?;
        ranges.sort();
        if ranges.windows(2).any(|w| w[1].0 < w[0].1) {
            return Err(FieldError::Overlap);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningHours(pub Vec<DayHours>);

impl OpeningHours {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn validate(&self) -> Vec<(Weekday, FieldError)> {
        self.0
            .iter()
            .filter_map(|d| d.validate().err().map(|e| (d.day, e)))
            .collect()
    }

    /// First failure, for a single-error field state.
    pub fn first_error(&self) -> Result<(), FieldError> {
        match self.validate().into_iter().next() {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }
}
