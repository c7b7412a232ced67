/// Header-driven readers, one per table. Unknown columns are ignored,
/// missing optional columns default, and a missing required column or an
/// unparseable field fails with the offending file, line and column.
use chrono::NaiveDate;

use crate::{
    error::GtfsError,
    gtfs::models::{
        Agency, Calendar, CalendarDate, ExceptionType, FeedInfo, Frequency, Route, Shape,
        ShapePoint, Stop, StopTime, Trip,
    },
    io::{CsvDocument, CsvRow},
    utils::parse_gtfs_date,
};

fn parse_error(file_name: &str, line: u64, column: &str, reason: &str) -> GtfsError {
    GtfsError::Parse {
        file_name: file_name.to_string(),
        line_number: line,
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

fn required<'a>(
    row: &CsvRow<'a>,
    document: &CsvDocument,
    file_name: &str,
    column: &str,
) -> Result<&'a str, GtfsError> {
    match row.get_non_empty(column) {
        Some(value) => Ok(value),
        None if document.has_column(column) => Err(parse_error(
            file_name,
            row.line(),
            column,
            "missing required value",
        )),
        None => Err(parse_error(
            file_name,
            row.line(),
            column,
            "missing required column",
        )),
    }
}

fn optional(row: &CsvRow<'_>, column: &str) -> Option<String> {
    row.get_non_empty(column).map(String::from)
}

fn required_f64(
    row: &CsvRow<'_>,
    document: &CsvDocument,
    file_name: &str,
    column: &str,
) -> Result<f64, GtfsError> {
    let value = required(row, document, file_name, column)?;
    value
        .parse()
        .map_err(|_| parse_error(file_name, row.line(), column, "invalid number"))
}

fn optional_f64(row: &CsvRow<'_>, file_name: &str, column: &str) -> Result<Option<f64>, GtfsError> {
    row.get_non_empty(column)
        .map(|value| {
            value
                .parse()
                .map_err(|_| parse_error(file_name, row.line(), column, "invalid number"))
        })
        .transpose()
}

fn required_u32(
    row: &CsvRow<'_>,
    document: &CsvDocument,
    file_name: &str,
    column: &str,
) -> Result<u32, GtfsError> {
    let value = required(row, document, file_name, column)?;
    value
        .parse()
        .map_err(|_| parse_error(file_name, row.line(), column, "invalid integer"))
}

fn optional_u32(row: &CsvRow<'_>, file_name: &str, column: &str) -> Result<Option<u32>, GtfsError> {
    row.get_non_empty(column)
        .map(|value| {
            value
                .parse()
                .map_err(|_| parse_error(file_name, row.line(), column, "invalid integer"))
        })
        .transpose()
}

fn required_date(
    row: &CsvRow<'_>,
    document: &CsvDocument,
    file_name: &str,
    column: &str,
) -> Result<NaiveDate, GtfsError> {
    let value = required(row, document, file_name, column)?;
    parse_gtfs_date(value)
        .ok_or_else(|| parse_error(file_name, row.line(), column, "invalid YYYYMMDD date"))
}

fn optional_date(
    row: &CsvRow<'_>,
    file_name: &str,
    column: &str,
) -> Result<Option<NaiveDate>, GtfsError> {
    row.get_non_empty(column)
        .map(|value| {
            parse_gtfs_date(value)
                .ok_or_else(|| parse_error(file_name, row.line(), column, "invalid YYYYMMDD date"))
        })
        .transpose()
}

fn required_flag(
    row: &CsvRow<'_>,
    document: &CsvDocument,
    file_name: &str,
    column: &str,
) -> Result<bool, GtfsError> {
    match required(row, document, file_name, column)? {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(parse_error(
            file_name,
            row.line(),
            column,
            "expected 0 or 1",
        )),
    }
}

/// `H:MM:SS` or `HH:MM:SS` to seconds from midnight; hours may exceed 23.
fn required_time(
    row: &CsvRow<'_>,
    document: &CsvDocument,
    file_name: &str,
    column: &str,
) -> Result<u32, GtfsError> {
    let value = required(row, document, file_name, column)?;
    parse_time(value).ok_or_else(|| parse_error(file_name, row.line(), column, "invalid time"))
}

fn parse_time(value: &str) -> Option<u32> {
    let mut parts = value.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(hours * 3_600 + minutes * 60 + seconds)
}

// ------------------------------------------------------------------------------------------------
// --- Table readers
// ------------------------------------------------------------------------------------------------

pub(crate) fn parse_agencies(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<Agency>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(Agency {
                id: optional(&row, "agency_id").unwrap_or_default(),
                name: required(&row, document, file_name, "agency_name")?.to_string(),
                url: optional(&row, "agency_url").unwrap_or_default(),
                timezone: optional(&row, "agency_timezone").unwrap_or_default(),
                lang: optional(&row, "agency_lang"),
            })
        })
        .collect()
}

pub(crate) fn parse_stops(document: &CsvDocument, file_name: &str) -> Result<Vec<Stop>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(Stop {
                id: required(&row, document, file_name, "stop_id")?.to_string(),
                code: optional(&row, "stop_code"),
                name: optional(&row, "stop_name").unwrap_or_default(),
                latitude: optional_f64(&row, file_name, "stop_lat")?,
                longitude: optional_f64(&row, file_name, "stop_lon")?,
                location_type: optional_u32(&row, file_name, "location_type")?,
                parent_station: optional(&row, "parent_station"),
            })
        })
        .collect()
}

pub(crate) fn parse_routes(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<Route>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(Route {
                id: required(&row, document, file_name, "route_id")?.to_string(),
                agency_id: optional(&row, "agency_id"),
                short_name: optional(&row, "route_short_name").unwrap_or_default(),
                long_name: optional(&row, "route_long_name").unwrap_or_default(),
                route_type: required_u32(&row, document, file_name, "route_type")?,
            })
        })
        .collect()
}

pub(crate) fn parse_trips(document: &CsvDocument, file_name: &str) -> Result<Vec<Trip>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(Trip {
                route_id: required(&row, document, file_name, "route_id")?.to_string(),
                service_id: required(&row, document, file_name, "service_id")?.to_string(),
                id: required(&row, document, file_name, "trip_id")?.to_string(),
                headsign: optional(&row, "trip_headsign"),
                direction_id: optional_u32(&row, file_name, "direction_id")?,
                block_id: optional(&row, "block_id"),
                shape_id: optional(&row, "shape_id"),
            })
        })
        .collect()
}

pub(crate) fn parse_stop_times(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<StopTime>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(StopTime {
                trip_id: required(&row, document, file_name, "trip_id")?.to_string(),
                arrival_time: required_time(&row, document, file_name, "arrival_time")?,
                departure_time: required_time(&row, document, file_name, "departure_time")?,
                stop_id: required(&row, document, file_name, "stop_id")?.to_string(),
                stop_sequence: required_u32(&row, document, file_name, "stop_sequence")?,
                pickup_type: optional_u32(&row, file_name, "pickup_type")?.unwrap_or(0),
                drop_off_type: optional_u32(&row, file_name, "drop_off_type")?.unwrap_or(0),
                shape_dist_traveled: optional_f64(&row, file_name, "shape_dist_traveled")?,
            })
        })
        .collect()
}

pub(crate) fn parse_calendars(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<Calendar>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(Calendar {
                service_id: required(&row, document, file_name, "service_id")?.to_string(),
                monday: required_flag(&row, document, file_name, "monday")?,
                tuesday: required_flag(&row, document, file_name, "tuesday")?,
                wednesday: required_flag(&row, document, file_name, "wednesday")?,
                thursday: required_flag(&row, document, file_name, "thursday")?,
                friday: required_flag(&row, document, file_name, "friday")?,
                saturday: required_flag(&row, document, file_name, "saturday")?,
                sunday: required_flag(&row, document, file_name, "sunday")?,
                start_date: required_date(&row, document, file_name, "start_date")?,
                end_date: required_date(&row, document, file_name, "end_date")?,
            })
        })
        .collect()
}

pub(crate) fn parse_calendar_dates(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<CalendarDate>, GtfsError> {
    document
        .rows()
        .map(|row| {
            let exception_type =
                ExceptionType::from_value(required_u32(&row, document, file_name, "exception_type")?);
            if let ExceptionType::Other(value) = exception_type {
                log::warn!("{file_name}: unknown exception_type {value}");
            }
            Ok(CalendarDate {
                service_id: required(&row, document, file_name, "service_id")?.to_string(),
                date: required_date(&row, document, file_name, "date")?,
                exception_type,
            })
        })
        .collect()
}

/// Shape point rows, aggregated by shape id. Shapes keep first-seen order,
/// points are sorted by sequence.
pub(crate) fn parse_shapes(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<Shape>, GtfsError> {
    let mut shapes: Vec<Shape> = Vec::new();
    for row in document.rows() {
        let point = ShapePoint {
            shape_id: required(&row, document, file_name, "shape_id")?.to_string(),
            latitude: required_f64(&row, document, file_name, "shape_pt_lat")?,
            longitude: required_f64(&row, document, file_name, "shape_pt_lon")?,
            sequence: required_u32(&row, document, file_name, "shape_pt_sequence")?,
            shape_dist_traveled: optional_f64(&row, file_name, "shape_dist_traveled")?,
        };
        match shapes.iter_mut().find(|shape| shape.id == point.shape_id) {
            Some(shape) => shape.points.push(point),
            None => shapes.push(Shape {
                id: point.shape_id.clone(),
                points: vec![point],
            }),
        }
    }
    for shape in &mut shapes {
        shape.points.sort_by_key(|point| point.sequence);
    }
    Ok(shapes)
}

pub(crate) fn parse_frequencies(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<Frequency>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(Frequency {
                trip_id: required(&row, document, file_name, "trip_id")?.to_string(),
                start_time: required_time(&row, document, file_name, "start_time")?,
                end_time: required_time(&row, document, file_name, "end_time")?,
                headway_secs: required_u32(&row, document, file_name, "headway_secs")?,
                exact_times: optional_u32(&row, file_name, "exact_times")?,
            })
        })
        .collect()
}

pub(crate) fn parse_feed_info(
    document: &CsvDocument,
    file_name: &str,
) -> Result<Vec<FeedInfo>, GtfsError> {
    document
        .rows()
        .map(|row| {
            Ok(FeedInfo {
                feed_publisher_name: optional(&row, "feed_publisher_name").unwrap_or_default(),
                feed_publisher_url: optional(&row, "feed_publisher_url").unwrap_or_default(),
                feed_lang: optional(&row, "feed_lang").unwrap_or_default(),
                feed_start_date: optional_date(&row, file_name, "feed_start_date")?,
                feed_end_date: optional_date(&row, file_name, "feed_end_date")?,
                feed_version: optional(&row, "feed_version"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_required_column_names_the_column() {
        let document = CsvDocument::from_bytes(b"stop_name\nMain Street\n").unwrap();
        match parse_stops(&document, "stops.txt") {
            Err(GtfsError::Parse {
                file_name,
                line_number,
                column,
                ..
            }) => {
                assert_eq!("stops.txt", file_name);
                assert_eq!(2, line_number);
                assert_eq!("stop_id", column);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let document = CsvDocument::from_bytes(
            b"agency_id,agency_name,agency_url,agency_timezone,wheelchair_ramp\n\
              a1,Agency,https://example.com,Europe/London,yes\n",
        )
        .unwrap();
        let agencies = parse_agencies(&document, "agency.txt").unwrap();
        assert_eq!(1, agencies.len());
        assert_eq!("a1", agencies[0].id);
    }

    #[test]
    fn times_accept_single_digit_hours_and_past_midnight() {
        assert_eq!(Some(9 * 3_600), parse_time("9:00:00"));
        assert_eq!(Some(26 * 3_600 + 30 * 60), parse_time("26:30:00"));
        assert_eq!(None, parse_time("9:00"));
        assert_eq!(None, parse_time("09:61:00"));
    }

    #[test]
    fn shapes_are_aggregated_and_sorted_by_sequence() {
        let document = CsvDocument::from_bytes(
            b"shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
              s1,51.1,-2.1,2\n\
              s2,52.0,-2.5,1\n\
              s1,51.0,-2.0,1\n",
        )
        .unwrap();
        let shapes = parse_shapes(&document, "shapes.txt").unwrap();
        assert_eq!(2, shapes.len());
        assert_eq!("s1", shapes[0].id);
        assert_eq!(vec![1, 2], shapes[0].points.iter().map(|p| p.sequence).collect::<Vec<_>>());
    }

    #[test]
    fn calendar_flags_must_be_binary() {
        let document = CsvDocument::from_bytes(
            b"service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
              weekday,1,1,1,1,yes,0,0,20250101,20251231\n",
        )
        .unwrap();
        match parse_calendars(&document, "calendar.txt") {
            Err(GtfsError::Parse { column, .. }) => assert_eq!("friday", column),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
