//! Capture metadata: when and where each photo was taken.

use crate::types::{CaptureStep, Coordinate};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Display format for capture timestamps (`2024-01-31 09:05`).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Persisted capture metadata. A step's fields stay `None` until that step
/// has been captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_location: Option<Coordinate>,
}

impl CaptureRecord {
    /// Record a capture of `step` at `when`, overwriting any earlier values
    /// for that step. The coordinate is stored as given, so a missing fix
    /// clears a stale one.
    pub fn stamp<Tz: TimeZone>(&mut self, step: CaptureStep, when: &DateTime<Tz>, coordinate: Option<Coordinate>)
    where
        Tz::Offset: std::fmt::Display,
    {
        let formatted = when.format(DATETIME_FORMAT).to_string();
        match step {
            CaptureStep::Subject => {
                self.user_datetime = Some(formatted);
                self.location = coordinate;
            }
            CaptureStep::Device => {
                self.device_datetime = Some(formatted);
                self.device_location = coordinate;
            }
        }
    }

    /// Forget everything recorded for `step`.
    pub fn clear_step(&mut self, step: CaptureStep) {
        match step {
            CaptureStep::Subject => {
                self.user_datetime = None;
                self.location = None;
            }
            CaptureStep::Device => {
                self.device_datetime = None;
                self.device_location = None;
            }
        }
    }

    pub fn datetime(&self, step: CaptureStep) -> Option<&str> {
        match step {
            CaptureStep::Subject => self.user_datetime.as_deref(),
            CaptureStep::Device => self.device_datetime.as_deref(),
        }
    }

    pub fn coordinate(&self, step: CaptureStep) -> Option<Coordinate> {
        match step {
            CaptureStep::Subject => self.location,
            CaptureStep::Device => self.device_location,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Read-only access to the most recent location fix.
pub trait LocationProvider: Send + Sync {
    fn current(&self) -> Option<Coordinate>;
}

/// A location provider with a fixed (or absent) coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coordinate>);

impl LocationProvider for FixedLocation {
    fn current(&self) -> Option<Coordinate> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 31, h, m, 0)
            .unwrap()
    }

    const TOKYO: Coordinate = Coordinate { lat: 35.68, lng: 139.76 };

    #[test]
    fn test_stamp_subject() {
        let mut rec = CaptureRecord::default();
        rec.stamp(CaptureStep::Subject, &at(9, 5), Some(TOKYO));
        assert_eq!(rec.user_datetime.as_deref(), Some("2024-01-31 09:05"));
        assert_eq!(rec.location, Some(TOKYO));
        assert!(rec.device_datetime.is_none());
        assert!(rec.device_location.is_none());
    }

    #[test]
    fn test_stamp_without_fix_clears_stale_location() {
        let mut rec = CaptureRecord::default();
        rec.stamp(CaptureStep::Device, &at(9, 5), Some(TOKYO));
        rec.stamp(CaptureStep::Device, &at(10, 0), None);
        assert_eq!(rec.device_datetime.as_deref(), Some("2024-01-31 10:00"));
        assert!(rec.device_location.is_none());
    }

    #[test]
    fn test_clear_step_only_touches_that_step() {
        let mut rec = CaptureRecord::default();
        rec.stamp(CaptureStep::Subject, &at(9, 5), Some(TOKYO));
        rec.stamp(CaptureStep::Device, &at(9, 6), Some(TOKYO));
        rec.clear_step(CaptureStep::Subject);
        assert!(rec.datetime(CaptureStep::Subject).is_none());
        assert!(rec.coordinate(CaptureStep::Subject).is_none());
        assert_eq!(rec.datetime(CaptureStep::Device), Some("2024-01-31 09:06"));
        rec.clear_step(CaptureStep::Device);
        assert!(rec.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut rec = CaptureRecord::default();
        rec.stamp(CaptureStep::Subject, &at(9, 5), Some(TOKYO));
        let json: serde_json::Value = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["userDatetime"], "2024-01-31 09:05");
        assert_eq!(json["location"]["lat"], 35.68);
        assert_eq!(json["location"]["lng"], 139.76);
        assert!(json.get("deviceDatetime").is_none());
        assert!(json.get("deviceLocation").is_none());
    }

    #[test]
    fn test_parse_partial_record() {
        let rec: CaptureRecord =
            serde_json::from_str(r#"{"deviceDatetime":"2024-02-01 12:00"}"#).unwrap();
        assert_eq!(rec.device_datetime.as_deref(), Some("2024-02-01 12:00"));
        assert!(rec.location.is_none());
    }

    #[test]
    fn test_fixed_location() {
        assert_eq!(FixedLocation(Some(TOKYO)).current(), Some(TOKYO));
        assert_eq!(FixedLocation::default().current(), None);
    }
}
