/// Feed writer: the canonical tables in reference column order with
/// RFC 4180 quoting, to a directory or a ZIP archive. The five core tables
/// are always written (headers only when empty); optional tables are
/// omitted when they hold no rows.
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use zip::write::SimpleFileOptions;

use crate::{
    error::{GtfsError, TResult},
    gtfs::feed::{
        AGENCY_FILE, CALENDAR_DATES_FILE, CALENDAR_FILE, FEED_INFO_FILE, FREQUENCIES_FILE,
        GtfsFeed, ROUTES_FILE, SHAPES_FILE, STOP_TIMES_FILE, STOPS_FILE, TRIPS_FILE,
    },
    gtfs::models::ShapePoint,
};

const AGENCY_COLUMNS: [&str; 5] = [
    "agency_id",
    "agency_name",
    "agency_url",
    "agency_timezone",
    "agency_lang",
];
const STOP_COLUMNS: [&str; 7] = [
    "stop_id",
    "stop_code",
    "stop_name",
    "stop_lat",
    "stop_lon",
    "location_type",
    "parent_station",
];
const ROUTE_COLUMNS: [&str; 5] = [
    "route_id",
    "agency_id",
    "route_short_name",
    "route_long_name",
    "route_type",
];
const TRIP_COLUMNS: [&str; 7] = [
    "route_id",
    "service_id",
    "trip_id",
    "trip_headsign",
    "direction_id",
    "block_id",
    "shape_id",
];
const STOP_TIME_COLUMNS: [&str; 8] = [
    "trip_id",
    "arrival_time",
    "departure_time",
    "stop_id",
    "stop_sequence",
    "pickup_type",
    "drop_off_type",
    "shape_dist_traveled",
];

fn table_bytes<T: Serialize>(rows: &[T], columns: &[&str]) -> Result<Vec<u8>, GtfsError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        // Headers come from the serialized records, so an empty table needs
        // its header row written explicitly.
        writer.write_record(columns)?;
    } else {
        for row in rows {
            writer.serialize(row)?;
        }
    }
    writer
        .into_inner()
        .map_err(|error| GtfsError::Io(std::io::Error::other(error.error().to_string())))
}

/// `(file name, bytes)` for every table that must appear on disk.
fn tables(feed: &GtfsFeed) -> Result<Vec<(&'static str, Vec<u8>)>, GtfsError> {
    let mut tables = vec![
        (AGENCY_FILE, table_bytes(&feed.agencies, &AGENCY_COLUMNS)?),
        (STOPS_FILE, table_bytes(&feed.stops, &STOP_COLUMNS)?),
        (ROUTES_FILE, table_bytes(&feed.routes, &ROUTE_COLUMNS)?),
        (TRIPS_FILE, table_bytes(&feed.trips, &TRIP_COLUMNS)?),
        (
            STOP_TIMES_FILE,
            table_bytes(&feed.stop_times, &STOP_TIME_COLUMNS)?,
        ),
    ];
    if !feed.calendars.is_empty() {
        tables.push((CALENDAR_FILE, table_bytes(&feed.calendars, &[])?));
    }
    if !feed.calendar_dates.is_empty() {
        tables.push((CALENDAR_DATES_FILE, table_bytes(&feed.calendar_dates, &[])?));
    }
    if !feed.shapes.is_empty() {
        let points: Vec<&ShapePoint> = feed
            .shapes
            .iter()
            .flat_map(|shape| &shape.points)
            .collect();
        tables.push((SHAPES_FILE, table_bytes(&points, &[])?));
    }
    if !feed.frequencies.is_empty() {
        tables.push((FREQUENCIES_FILE, table_bytes(&feed.frequencies, &[])?));
    }
    if !feed.feed_info.is_empty() {
        tables.push((FEED_INFO_FILE, table_bytes(&feed.feed_info, &[])?));
    }
    Ok(tables)
}

pub(crate) fn write_to_path(feed: &GtfsFeed, path: &Path) -> TResult<()> {
    fs::create_dir_all(path).map_err(GtfsError::Io)?;
    for (file_name, bytes) in tables(feed)? {
        fs::write(path.join(file_name), bytes).map_err(GtfsError::Io)?;
    }
    log::info!("Wrote GTFS feed to {}", path.display());
    Ok(())
}

pub(crate) fn write_to_zip_path(feed: &GtfsFeed, path: &Path) -> TResult<()> {
    let file = fs::File::create(path).map_err(GtfsError::Io)?;
    let mut archive = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (file_name, bytes) in tables(feed)? {
        archive
            .start_file(file_name, options)
            .map_err(GtfsError::Zip)?;
        archive.write_all(&bytes).map_err(GtfsError::Io)?;
    }
    archive.finish().map_err(GtfsError::Zip)?;
    log::info!("Wrote GTFS feed to {}", path.display());
    Ok(())
}

impl GtfsFeed {
    /// Writes the feed as a directory of CSV tables.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> TResult<()> {
        write_to_path(self, path.as_ref())
    }

    /// Writes the feed as a ZIP archive.
    pub fn write_to_zip_path<P: AsRef<Path>>(&self, path: P) -> TResult<()> {
        write_to_zip_path(self, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::models::{Agency, Stop};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_required_table_still_gets_a_header() {
        let feed = GtfsFeed::default();
        let tables = tables(&feed).unwrap();
        assert_eq!(5, tables.len());
        let agency = String::from_utf8(tables[0].1.clone()).unwrap();
        assert_eq!("agency_id,agency_name,agency_url,agency_timezone,agency_lang\n", agency);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let feed = GtfsFeed {
            stops: vec![Stop {
                id: "s1".into(),
                name: "Main Street, North".into(),
                ..Stop::default()
            }],
            ..GtfsFeed::default()
        };
        let tables = tables(&feed).unwrap();
        let stops = String::from_utf8(tables[1].1.clone()).unwrap();
        assert!(stops.contains("\"Main Street, North\""));
    }

    #[test]
    fn optional_empty_tables_are_omitted() {
        let feed = GtfsFeed {
            agencies: vec![Agency {
                id: "a1".into(),
                name: "Agency".into(),
                ..Agency::default()
            }],
            ..GtfsFeed::default()
        };
        let names: Vec<&str> = tables(&feed).unwrap().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            vec![AGENCY_FILE, STOPS_FILE, ROUTES_FILE, TRIPS_FILE, STOP_TIMES_FILE],
            names
        );
    }
}
