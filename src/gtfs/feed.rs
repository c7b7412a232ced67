use std::cell::OnceCell;
use std::fs::File;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    error::{GtfsError, TResult},
    gtfs::models::{
        Agency, Calendar, CalendarDate, FeedInfo, Frequency, Route, Shape, StopTime, Stop, Trip,
    },
    gtfs::read,
    io::{CsvDocument, count_data_rows},
};

pub(crate) const AGENCY_FILE: &str = "agency.txt";
pub(crate) const STOPS_FILE: &str = "stops.txt";
pub(crate) const ROUTES_FILE: &str = "routes.txt";
pub(crate) const TRIPS_FILE: &str = "trips.txt";
pub(crate) const STOP_TIMES_FILE: &str = "stop_times.txt";
pub(crate) const CALENDAR_FILE: &str = "calendar.txt";
pub(crate) const CALENDAR_DATES_FILE: &str = "calendar_dates.txt";
pub(crate) const SHAPES_FILE: &str = "shapes.txt";
pub(crate) const FREQUENCIES_FILE: &str = "frequencies.txt";
pub(crate) const FEED_INFO_FILE: &str = "feed_info.txt";

const REQUIRED_FILES: [&str; 5] = [
    AGENCY_FILE,
    STOPS_FILE,
    ROUTES_FILE,
    TRIPS_FILE,
    STOP_TIMES_FILE,
];

const RECOGNIZED_FILES: [&str; 10] = [
    AGENCY_FILE,
    STOPS_FILE,
    ROUTES_FILE,
    TRIPS_FILE,
    STOP_TIMES_FILE,
    CALENDAR_FILE,
    CALENDAR_DATES_FILE,
    SHAPES_FILE,
    FREQUENCIES_FILE,
    FEED_INFO_FILE,
];

// ------------------------------------------------------------------------------------------------
// --- FeedAccess
// ------------------------------------------------------------------------------------------------

/// Capability surface shared by the eager and the lazy feed. The filter
/// layer operates over this trait, never over a concrete feed type.
///
/// Getters are fallible because the lazy feed parses a table on first
/// access; the eager feed always answers `Ok`.
pub trait FeedAccess {
    fn agencies(&self) -> TResult<&[Agency]>;
    fn stops(&self) -> TResult<&[Stop]>;
    fn routes(&self) -> TResult<&[Route]>;
    fn trips(&self) -> TResult<&[Trip]>;
    fn stop_times(&self) -> TResult<&[StopTime]>;
    fn calendars(&self) -> TResult<&[Calendar]>;
    fn calendar_dates(&self) -> TResult<&[CalendarDate]>;
    fn shapes(&self) -> TResult<&[Shape]>;
    fn frequencies(&self) -> TResult<&[Frequency]>;
    fn feed_info(&self) -> TResult<&[FeedInfo]>;

    fn agency_count(&self) -> TResult<usize> {
        Ok(self.agencies()?.len())
    }

    fn stop_count(&self) -> TResult<usize> {
        Ok(self.stops()?.len())
    }

    fn route_count(&self) -> TResult<usize> {
        Ok(self.routes()?.len())
    }

    fn trip_count(&self) -> TResult<usize> {
        Ok(self.trips()?.len())
    }

    fn stop_time_count(&self) -> TResult<usize> {
        Ok(self.stop_times()?.len())
    }
}

// ------------------------------------------------------------------------------------------------
// --- FeedSource
// ------------------------------------------------------------------------------------------------

/// Where a feed's tables live: a directory of `.txt` files or members of a
/// ZIP archive. Opening records which recognized tables are present; each
/// table read opens and closes its file independently.
#[derive(Debug)]
pub(crate) struct FeedSource {
    kind: SourceKind,
}

#[derive(Debug)]
enum SourceKind {
    Directory(PathBuf),
    Zip {
        path: PathBuf,
        members: FxHashMap<&'static str, String>,
    },
}

impl FeedSource {
    pub(crate) fn open(path: &Path) -> Result<Self, GtfsError> {
        if !path.exists() {
            return Err(GtfsError::FileNotFound {
                path: path.to_path_buf(),
                missing_files: Vec::new(),
            });
        }
        if path.is_dir() {
            return Ok(Self {
                kind: SourceKind::Directory(path.to_path_buf()),
            });
        }

        let archive = zip::ZipArchive::new(File::open(path)?)?;
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        let mut members = FxHashMap::default();
        for file_name in RECOGNIZED_FILES {
            // Feeds are sometimes zipped inside a top-level folder.
            if let Some(member) = names
                .iter()
                .find(|name| *name == file_name || name.ends_with(&format!("/{file_name}")))
            {
                members.insert(file_name, member.clone());
            }
        }
        Ok(Self {
            kind: SourceKind::Zip {
                path: path.to_path_buf(),
                members,
            },
        })
    }

    pub(crate) fn has(&self, file_name: &'static str) -> bool {
        match &self.kind {
            SourceKind::Directory(dir) => dir.join(file_name).is_file(),
            SourceKind::Zip { members, .. } => members.contains_key(file_name),
        }
    }

    pub(crate) fn require_core_files(&self) -> Result<(), GtfsError> {
        let missing: Vec<String> = REQUIRED_FILES
            .into_iter()
            .filter(|file_name| !self.has(file_name))
            .map(String::from)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GtfsError::FileNotFound {
                path: self.path().to_path_buf(),
                missing_files: missing,
            })
        }
    }

    pub(crate) fn path(&self) -> &Path {
        match &self.kind {
            SourceKind::Directory(dir) => dir,
            SourceKind::Zip { path, .. } => path,
        }
    }

    pub(crate) fn read(&self, file_name: &'static str) -> Result<Option<CsvDocument>, GtfsError> {
        if !self.has(file_name) {
            return Ok(None);
        }
        match &self.kind {
            SourceKind::Directory(dir) => Ok(Some(CsvDocument::from_path(dir.join(file_name))?)),
            SourceKind::Zip { path, members } => {
                let mut archive = zip::ZipArchive::new(File::open(path)?)?;
                let entry = archive.by_name(&members[file_name])?;
                Ok(Some(CsvDocument::from_reader(entry)?))
            }
        }
    }

    /// Fast data-row count without parsing the table.
    pub(crate) fn count_rows(&self, file_name: &'static str) -> Result<usize, GtfsError> {
        if !self.has(file_name) {
            return Ok(0);
        }
        match &self.kind {
            SourceKind::Directory(dir) => Ok(count_data_rows(File::open(dir.join(file_name))?)?),
            SourceKind::Zip { path, members } => {
                let mut archive = zip::ZipArchive::new(File::open(path)?)?;
                let entry = archive.by_name(&members[file_name])?;
                Ok(count_data_rows(entry)?)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// --- GtfsFeed
// ------------------------------------------------------------------------------------------------

/// Fully parsed feed: every recognized table is read on open. Collections
/// iterate in file order and are immutable after construction.
#[derive(Debug, Default, Clone)]
pub struct GtfsFeed {
    pub(crate) agencies: Vec<Agency>,
    pub(crate) stops: Vec<Stop>,
    pub(crate) routes: Vec<Route>,
    pub(crate) trips: Vec<Trip>,
    pub(crate) stop_times: Vec<StopTime>,
    pub(crate) calendars: Vec<Calendar>,
    pub(crate) calendar_dates: Vec<CalendarDate>,
    pub(crate) shapes: Vec<Shape>,
    pub(crate) frequencies: Vec<Frequency>,
    pub(crate) feed_info: Vec<FeedInfo>,
}

impl GtfsFeed {
    /// Loads from a directory of `.txt` tables or from a `.zip` archive.
    /// The five core tables must be present.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TResult<Self> {
        let source = FeedSource::open(path.as_ref())?;
        source.require_core_files()?;
        log::info!("Loading GTFS feed from {}", source.path().display());

        let mut feed = Self::default();
        if let Some(document) = source.read(AGENCY_FILE)? {
            feed.agencies = read::parse_agencies(&document, AGENCY_FILE)?;
        }
        if let Some(document) = source.read(STOPS_FILE)? {
            feed.stops = read::parse_stops(&document, STOPS_FILE)?;
        }
        if let Some(document) = source.read(ROUTES_FILE)? {
            feed.routes = read::parse_routes(&document, ROUTES_FILE)?;
        }
        if let Some(document) = source.read(TRIPS_FILE)? {
            feed.trips = read::parse_trips(&document, TRIPS_FILE)?;
        }
        if let Some(document) = source.read(STOP_TIMES_FILE)? {
            feed.stop_times = read::parse_stop_times(&document, STOP_TIMES_FILE)?;
        }
        if let Some(document) = source.read(CALENDAR_FILE)? {
            feed.calendars = read::parse_calendars(&document, CALENDAR_FILE)?;
        }
        if let Some(document) = source.read(CALENDAR_DATES_FILE)? {
            feed.calendar_dates = read::parse_calendar_dates(&document, CALENDAR_DATES_FILE)?;
        }
        if let Some(document) = source.read(SHAPES_FILE)? {
            feed.shapes = read::parse_shapes(&document, SHAPES_FILE)?;
        }
        if let Some(document) = source.read(FREQUENCIES_FILE)? {
            feed.frequencies = read::parse_frequencies(&document, FREQUENCIES_FILE)?;
        }
        if let Some(document) = source.read(FEED_INFO_FILE)? {
            feed.feed_info = read::parse_feed_info(&document, FEED_INFO_FILE)?;
        }
        Ok(feed)
    }

    /// Cross-table integrity check: unique ids, resolvable references,
    /// strictly increasing stop sequences. Structural defects are errors,
    /// missing coordinates are warnings.
    pub fn validate(&self) -> TResult<()> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut stop_ids = FxHashSet::default();
        for stop in &self.stops {
            if !stop_ids.insert(stop.id.as_str()) {
                errors.push(format!("duplicate stop_id {:?}", stop.id));
            }
            if stop.latitude.is_none() || stop.longitude.is_none() {
                warnings.push(format!("stop {:?} has no coordinates", stop.id));
            }
        }
        for stop in &self.stops {
            if let Some(parent) = &stop.parent_station
                && !stop_ids.contains(parent.as_str())
            {
                errors.push(format!(
                    "stop {:?}: parent_station {parent:?} does not exist",
                    stop.id
                ));
            }
        }

        let mut route_ids = FxHashSet::default();
        let agency_ids: FxHashSet<&str> =
            self.agencies.iter().map(|agency| agency.id.as_str()).collect();
        for route in &self.routes {
            if !route_ids.insert(route.id.as_str()) {
                errors.push(format!("duplicate route_id {:?}", route.id));
            }
            if let Some(agency_id) = &route.agency_id
                && !agency_ids.contains(agency_id.as_str())
            {
                errors.push(format!(
                    "route {:?}: agency_id {agency_id:?} does not exist",
                    route.id
                ));
            }
        }

        let service_ids: FxHashSet<&str> = self
            .calendars
            .iter()
            .map(|calendar| calendar.service_id.as_str())
            .chain(
                self.calendar_dates
                    .iter()
                    .map(|calendar_date| calendar_date.service_id.as_str()),
            )
            .collect();
        let mut trip_ids = FxHashSet::default();
        for trip in &self.trips {
            if !trip_ids.insert(trip.id.as_str()) {
                errors.push(format!("duplicate trip_id {:?}", trip.id));
            }
            if !route_ids.contains(trip.route_id.as_str()) {
                errors.push(format!(
                    "trip {:?}: route_id {:?} does not exist",
                    trip.id, trip.route_id
                ));
            }
            if !service_ids.contains(trip.service_id.as_str()) {
                errors.push(format!(
                    "trip {:?}: service_id {:?} does not exist",
                    trip.id, trip.service_id
                ));
            }
        }

        let mut last_sequence: FxHashMap<&str, u32> = FxHashMap::default();
        for stop_time in &self.stop_times {
            if !trip_ids.contains(stop_time.trip_id.as_str()) {
                errors.push(format!(
                    "stop time references unknown trip {:?}",
                    stop_time.trip_id
                ));
            }
            if !stop_ids.contains(stop_time.stop_id.as_str()) {
                errors.push(format!(
                    "stop time references unknown stop {:?}",
                    stop_time.stop_id
                ));
            }
            if stop_time.arrival_time > stop_time.departure_time {
                errors.push(format!(
                    "trip {:?} sequence {}: arrival after departure",
                    stop_time.trip_id, stop_time.stop_sequence
                ));
            }
            if let Some(previous) = last_sequence.get(stop_time.trip_id.as_str())
                && *previous >= stop_time.stop_sequence
            {
                errors.push(format!(
                    "trip {:?}: stop_sequence not strictly increasing at {}",
                    stop_time.trip_id, stop_time.stop_sequence
                ));
            }
            last_sequence.insert(stop_time.trip_id.as_str(), stop_time.stop_sequence);
        }

        for calendar in &self.calendars {
            if calendar.start_date > calendar.end_date {
                errors.push(format!(
                    "calendar {:?}: start_date after end_date",
                    calendar.service_id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GtfsError::Validation { errors, warnings }.into())
        }
    }
}

impl FeedAccess for GtfsFeed {
    fn agencies(&self) -> TResult<&[Agency]> {
        Ok(&self.agencies)
    }

    fn stops(&self) -> TResult<&[Stop]> {
        Ok(&self.stops)
    }

    fn routes(&self) -> TResult<&[Route]> {
        Ok(&self.routes)
    }

    fn trips(&self) -> TResult<&[Trip]> {
        Ok(&self.trips)
    }

    fn stop_times(&self) -> TResult<&[StopTime]> {
        Ok(&self.stop_times)
    }

    fn calendars(&self) -> TResult<&[Calendar]> {
        Ok(&self.calendars)
    }

    fn calendar_dates(&self) -> TResult<&[CalendarDate]> {
        Ok(&self.calendar_dates)
    }

    fn shapes(&self) -> TResult<&[Shape]> {
        Ok(&self.shapes)
    }

    fn frequencies(&self) -> TResult<&[Frequency]> {
        Ok(&self.frequencies)
    }

    fn feed_info(&self) -> TResult<&[FeedInfo]> {
        Ok(&self.feed_info)
    }
}

// ------------------------------------------------------------------------------------------------
// --- LazyGtfsFeed
// ------------------------------------------------------------------------------------------------

/// Feed that defers parsing: opening only records which tables exist, a
/// table is parsed on first access and cached in a one-time cell. Counts
/// for tables not yet parsed come from a fast line count.
pub struct LazyGtfsFeed {
    source: FeedSource,
    agencies: OnceCell<Vec<Agency>>,
    stops: OnceCell<Vec<Stop>>,
    routes: OnceCell<Vec<Route>>,
    trips: OnceCell<Vec<Trip>>,
    stop_times: OnceCell<Vec<StopTime>>,
    calendars: OnceCell<Vec<Calendar>>,
    calendar_dates: OnceCell<Vec<CalendarDate>>,
    shapes: OnceCell<Vec<Shape>>,
    frequencies: OnceCell<Vec<Frequency>>,
    feed_info: OnceCell<Vec<FeedInfo>>,
}

impl LazyGtfsFeed {
    pub fn from_path<P: AsRef<Path>>(path: P) -> TResult<Self> {
        let source = FeedSource::open(path.as_ref())?;
        source.require_core_files()?;
        Ok(Self {
            source,
            agencies: OnceCell::new(),
            stops: OnceCell::new(),
            routes: OnceCell::new(),
            trips: OnceCell::new(),
            stop_times: OnceCell::new(),
            calendars: OnceCell::new(),
            calendar_dates: OnceCell::new(),
            shapes: OnceCell::new(),
            frequencies: OnceCell::new(),
            feed_info: OnceCell::new(),
        })
    }

    /// Parses every remaining table and returns the equivalent eager feed.
    pub fn materialize(&self) -> TResult<GtfsFeed> {
        Ok(GtfsFeed {
            agencies: self.agencies()?.to_vec(),
            stops: self.stops()?.to_vec(),
            routes: self.routes()?.to_vec(),
            trips: self.trips()?.to_vec(),
            stop_times: self.stop_times()?.to_vec(),
            calendars: self.calendars()?.to_vec(),
            calendar_dates: self.calendar_dates()?.to_vec(),
            shapes: self.shapes()?.to_vec(),
            frequencies: self.frequencies()?.to_vec(),
            feed_info: self.feed_info()?.to_vec(),
        })
    }

    fn table<'s, T>(
        &'s self,
        cell: &'s OnceCell<Vec<T>>,
        file_name: &'static str,
        parse: impl Fn(&CsvDocument, &str) -> Result<Vec<T>, GtfsError>,
    ) -> TResult<&'s [T]> {
        if let Some(values) = cell.get() {
            return Ok(values);
        }
        let parsed = match self.source.read(file_name)? {
            Some(document) => parse(&document, file_name)?,
            None => Vec::new(),
        };
        Ok(cell.get_or_init(|| parsed))
    }

    fn count(
        &self,
        len: Option<usize>,
        file_name: &'static str,
    ) -> TResult<usize> {
        match len {
            Some(len) => Ok(len),
            None => Ok(self.source.count_rows(file_name)?),
        }
    }
}

impl FeedAccess for LazyGtfsFeed {
    fn agencies(&self) -> TResult<&[Agency]> {
        self.table(&self.agencies, AGENCY_FILE, read::parse_agencies)
    }

    fn stops(&self) -> TResult<&[Stop]> {
        self.table(&self.stops, STOPS_FILE, read::parse_stops)
    }

    fn routes(&self) -> TResult<&[Route]> {
        self.table(&self.routes, ROUTES_FILE, read::parse_routes)
    }

    fn trips(&self) -> TResult<&[Trip]> {
        self.table(&self.trips, TRIPS_FILE, read::parse_trips)
    }

    fn stop_times(&self) -> TResult<&[StopTime]> {
        self.table(&self.stop_times, STOP_TIMES_FILE, read::parse_stop_times)
    }

    fn calendars(&self) -> TResult<&[Calendar]> {
        self.table(&self.calendars, CALENDAR_FILE, read::parse_calendars)
    }

    fn calendar_dates(&self) -> TResult<&[CalendarDate]> {
        self.table(
            &self.calendar_dates,
            CALENDAR_DATES_FILE,
            read::parse_calendar_dates,
        )
    }

    fn shapes(&self) -> TResult<&[Shape]> {
        self.table(&self.shapes, SHAPES_FILE, read::parse_shapes)
    }

    fn frequencies(&self) -> TResult<&[Frequency]> {
        self.table(&self.frequencies, FREQUENCIES_FILE, read::parse_frequencies)
    }

    fn feed_info(&self) -> TResult<&[FeedInfo]> {
        self.table(&self.feed_info, FEED_INFO_FILE, read::parse_feed_info)
    }

    fn agency_count(&self) -> TResult<usize> {
        self.count(self.agencies.get().map(Vec::len), AGENCY_FILE)
    }

    fn stop_count(&self) -> TResult<usize> {
        self.count(self.stops.get().map(Vec::len), STOPS_FILE)
    }

    fn route_count(&self) -> TResult<usize> {
        self.count(self.routes.get().map(Vec::len), ROUTES_FILE)
    }

    fn trip_count(&self) -> TResult<usize> {
        self.count(self.trips.get().map(Vec::len), TRIPS_FILE)
    }

    fn stop_time_count(&self) -> TResult<usize> {
        self.count(self.stop_times.get().map(Vec::len), STOP_TIMES_FILE)
    }
}
