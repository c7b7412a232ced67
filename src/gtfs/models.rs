use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::utils::{format_gtfs_date, format_seconds};

// Serialization follows the reference CSV conventions: weekday flags as
// 0/1, dates as YYYYMMDD, times as HH:MM:SS (hours may exceed 23). Field
// order matches the reference column order, so the writer can serialize
// records directly.

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

fn seconds_as_time<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_seconds(*value))
}

fn date_as_ymd<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_gtfs_date(*value))
}

fn opt_date_as_ymd<S: Serializer>(
    value: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(date) => serializer.serialize_str(&format_gtfs_date(*date)),
        None => serializer.serialize_str(""),
    }
}

// ------------------------------------------------------------------------------------------------
// --- Agency
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Agency {
    #[serde(rename = "agency_id")]
    pub id: String,
    #[serde(rename = "agency_name")]
    pub name: String,
    #[serde(rename = "agency_url")]
    pub url: String,
    #[serde(rename = "agency_timezone")]
    pub timezone: String,
    #[serde(rename = "agency_lang")]
    pub lang: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// --- Stop
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stop {
    #[serde(rename = "stop_id")]
    pub id: String,
    #[serde(rename = "stop_code")]
    pub code: Option<String>,
    #[serde(rename = "stop_name")]
    pub name: String,
    #[serde(rename = "stop_lat")]
    pub latitude: Option<f64>,
    #[serde(rename = "stop_lon")]
    pub longitude: Option<f64>,
    pub location_type: Option<u32>,
    /// Must reference another stop of the same feed when present.
    pub parent_station: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// --- Route
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    #[serde(rename = "route_id")]
    pub id: String,
    pub agency_id: Option<String>,
    #[serde(rename = "route_short_name")]
    pub short_name: String,
    #[serde(rename = "route_long_name")]
    pub long_name: String,
    pub route_type: u32,
}

// ------------------------------------------------------------------------------------------------
// --- Trip
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    #[serde(rename = "trip_id")]
    pub id: String,
    #[serde(rename = "trip_headsign")]
    pub headsign: Option<String>,
    pub direction_id: Option<u32>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// --- StopTime
// ------------------------------------------------------------------------------------------------

/// One `(trip, stop, sequence)` row. Times are non-negative seconds from
/// midnight and may exceed 24:00:00.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StopTime {
    pub trip_id: String,
    #[serde(serialize_with = "seconds_as_time")]
    pub arrival_time: u32,
    #[serde(serialize_with = "seconds_as_time")]
    pub departure_time: u32,
    pub stop_id: String,
    pub stop_sequence: u32,
    pub pickup_type: u32,
    pub drop_off_type: u32,
    pub shape_dist_traveled: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// --- Calendar
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calendar {
    pub service_id: String,
    #[serde(serialize_with = "bool_as_int")]
    pub monday: bool,
    #[serde(serialize_with = "bool_as_int")]
    pub tuesday: bool,
    #[serde(serialize_with = "bool_as_int")]
    pub wednesday: bool,
    #[serde(serialize_with = "bool_as_int")]
    pub thursday: bool,
    #[serde(serialize_with = "bool_as_int")]
    pub friday: bool,
    #[serde(serialize_with = "bool_as_int")]
    pub saturday: bool,
    #[serde(serialize_with = "bool_as_int")]
    pub sunday: bool,
    #[serde(serialize_with = "date_as_ymd")]
    pub start_date: NaiveDate,
    #[serde(serialize_with = "date_as_ymd")]
    pub end_date: NaiveDate,
}

impl Calendar {
    /// The flag for the given date's weekday.
    pub fn weekday_flag(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        match date.weekday() {
            chrono::Weekday::Mon => self.monday,
            chrono::Weekday::Tue => self.tuesday,
            chrono::Weekday::Wed => self.wednesday,
            chrono::Weekday::Thu => self.thursday,
            chrono::Weekday::Fri => self.friday,
            chrono::Weekday::Sat => self.saturday,
            chrono::Weekday::Sun => self.sunday,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// --- ExceptionType
// ------------------------------------------------------------------------------------------------

/// `exception_type` of a calendar_dates row: 1 adds, 2 removes. Unknown
/// values are kept verbatim so the row can round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Added,
    Removed,
    Other(u32),
}

impl ExceptionType {
    pub fn from_value(value: u32) -> Self {
        match value {
            1 => Self::Added,
            2 => Self::Removed,
            other => Self::Other(other),
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            Self::Added => 1,
            Self::Removed => 2,
            Self::Other(value) => *value,
        }
    }
}

impl Serialize for ExceptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.value())
    }
}

// ------------------------------------------------------------------------------------------------
// --- CalendarDate
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDate {
    pub service_id: String,
    #[serde(serialize_with = "date_as_ymd")]
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
}

// ------------------------------------------------------------------------------------------------
// --- ShapePoint
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapePoint {
    pub shape_id: String,
    #[serde(rename = "shape_pt_lat")]
    pub latitude: f64,
    #[serde(rename = "shape_pt_lon")]
    pub longitude: f64,
    #[serde(rename = "shape_pt_sequence")]
    pub sequence: u32,
    pub shape_dist_traveled: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// --- Shape
// ------------------------------------------------------------------------------------------------

/// Aggregated view of a shape: its points in strictly increasing sequence
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub id: String,
    pub points: Vec<ShapePoint>,
}

// ------------------------------------------------------------------------------------------------
// --- Frequency
// ------------------------------------------------------------------------------------------------

/// Read-through passthrough of frequencies.txt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frequency {
    pub trip_id: String,
    #[serde(serialize_with = "seconds_as_time")]
    pub start_time: u32,
    #[serde(serialize_with = "seconds_as_time")]
    pub end_time: u32,
    pub headway_secs: u32,
    pub exact_times: Option<u32>,
}

// ------------------------------------------------------------------------------------------------
// --- FeedInfo
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedInfo {
    pub feed_publisher_name: String,
    pub feed_publisher_url: String,
    pub feed_lang: String,
    #[serde(serialize_with = "opt_date_as_ymd")]
    pub feed_start_date: Option<NaiveDate>,
    #[serde(serialize_with = "opt_date_as_ymd")]
    pub feed_end_date: Option<NaiveDate>,
    pub feed_version: Option<String>,
}
