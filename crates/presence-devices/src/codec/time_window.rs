//! Packed start/end clock window.
//!
//! Byte layout of the 32-bit word, low byte first: start hour, start minute,
//! end hour, end minute.

use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{CodecError, CodecResult};
use crate::capability::CapabilityValue;

/// Display value for a window the device reported as invalid.
pub const PLACEHOLDER: &str = "--:--";

// One or two hour digits, exactly two minute digits.
static CLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").expect("valid clock pattern"));

/// Which half of the window a descriptor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    Start,
    End,
}

impl TimeField {
    pub const ALL: [TimeField; 2] = [TimeField::Start, TimeField::End];
}

/// A complete start/end window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn get(&self, field: TimeField) -> NaiveTime {
        match field {
            TimeField::Start => self.start,
            TimeField::End => self.end,
        }
    }

    /// Pack into the unsigned wire word.
    pub fn encode(&self) -> u32 {
        self.start.hour()
            | (self.start.minute() << 8)
            | (self.end.hour() << 16)
            | (self.end.minute() << 24)
    }

    /// Unpack a wire word. Any field out of range yields None.
    pub fn decode(word: u32) -> Option<Self> {
        let [start_hour, start_minute, end_hour, end_minute] = word.to_le_bytes();
        let start = NaiveTime::from_hms_opt(start_hour.into(), start_minute.into(), 0)?;
        let end = NaiveTime::from_hms_opt(end_hour.into(), end_minute.into(), 0)?;
        Some(Self { start, end })
    }
}

/// A window where either half may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialWindow {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl PartialWindow {
    pub fn with(mut self, field: TimeField, time: NaiveTime) -> Self {
        match field {
            TimeField::Start => self.start = Some(time),
            TimeField::End => self.end = Some(time),
        }
        self
    }

    pub fn get(&self, field: TimeField) -> Option<NaiveTime> {
        match field {
            TimeField::Start => self.start,
            TimeField::End => self.end,
        }
    }

    /// Take each half from `self`, falling back to `other`.
    pub fn or(self, other: PartialWindow) -> Self {
        Self {
            start: self.start.or(other.start),
            end: self.end.or(other.end),
        }
    }

    /// Complete the window; a half with no value at all becomes 00:00.
    pub fn resolve(&self) -> TimeWindow {
        TimeWindow {
            start: self.start.unwrap_or_default(),
            end: self.end.unwrap_or_default(),
        }
    }
}

impl From<TimeWindow> for PartialWindow {
    fn from(window: TimeWindow) -> Self {
        Self {
            start: Some(window.start),
            end: Some(window.end),
        }
    }
}

/// Parse `H:MM` or `HH:MM`, hour 0-23, minute 0-59.
pub fn parse_clock(text: &str) -> CodecResult<NaiveTime> {
    let invalid = || CodecError::InvalidTimeFormat(format!("'{}' (expected HH:MM)", text));
    let captures = CLOCK_PATTERN.captures(text).ok_or_else(invalid)?;
    let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minute: u32 = captures[2].parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn format_clock(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Read a half back from capability state. Placeholders and junk count as unknown.
pub fn from_capability(value: &CapabilityValue) -> Option<NaiveTime> {
    value.as_str().and_then(|text| parse_clock(text).ok())
}

pub fn render(field: TimeField, window: Option<&TimeWindow>) -> CapabilityValue {
    let text = match window {
        Some(w) => format_clock(w.get(field)),
        None => PLACEHOLDER.to_string(),
    };
    CapabilityValue::Text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(text: &str) -> NaiveTime {
        parse_clock(text).unwrap()
    }

    #[test]
    fn test_encode_decode_edges() {
        let window = TimeWindow::new(clock("23:59"), clock("00:00"));
        assert_eq!(window.encode(), 23 | (59 << 8));

        let back = TimeWindow::decode(window.encode()).unwrap();
        assert_eq!(format_clock(back.start), "23:59");
        assert_eq!(format_clock(back.end), "00:00");
    }

    #[test]
    fn test_word_layout() {
        let window = TimeWindow::new(clock("22:30"), clock("7:15"));
        assert_eq!(window.encode(), 0x0F07_1E16);
    }

    #[test]
    fn test_high_byte_stays_unsigned() {
        let window = TimeWindow::new(clock("23:59"), clock("23:59"));
        let word = window.encode();
        assert_eq!(word, 0x3B17_3B17);
        assert!(i64::from(word) > 0);
    }

    #[test]
    fn test_decode_out_of_range_is_none() {
        assert_eq!(TimeWindow::decode(0xFFFF_FFFF), None);
        // start hour 24
        assert_eq!(TimeWindow::decode(24), None);
        // end minute 60
        assert_eq!(TimeWindow::decode(60 << 24), None);
    }

    #[test]
    fn test_parse_clock_strictness() {
        assert_eq!(format_clock(clock("9:05")), "09:05");
        assert_eq!(format_clock(clock("09:05")), "09:05");
        for bad in ["9:5", "24:00", "12:60", "123:00", "12:345", "", "ab:cd", " 9:05", "9-05"] {
            assert!(
                matches!(parse_clock(bad), Err(CodecError::InvalidTimeFormat(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_render_placeholder() {
        assert_eq!(render(TimeField::Start, None), CapabilityValue::Text("--:--".into()));
        assert_eq!(from_capability(&CapabilityValue::Text(PLACEHOLDER.into())), None);
    }

    #[test]
    fn test_partial_window_resolution() {
        let update = PartialWindow::default().with(TimeField::End, clock("19:00"));
        let prior = PartialWindow::from(TimeWindow::new(clock("08:00"), clock("18:00")));

        let merged = update.or(prior).resolve();
        assert_eq!(format_clock(merged.start), "08:00");
        assert_eq!(format_clock(merged.end), "19:00");

        let no_prior = update.or(PartialWindow::default()).resolve();
        assert_eq!(format_clock(no_prior.start), "00:00");
    }
}
