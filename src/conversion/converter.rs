use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use strum_macros::{Display, EnumString};

use crate::{
    error::{ConversionError, TResult},
    gtfs::{Agency, Calendar, CalendarDate, GtfsFeed, Route, Shape, ShapePoint, Stop, StopTime, Trip},
    models::{
        Direction, JourneyPattern, JourneyPatternSection, Service, StopPoint, TimingLink,
        TransportMode, VehicleJourney,
    },
    txc::TxcDocument,
    utils::haversine_km,
};

use super::calendar;

// ------------------------------------------------------------------------------------------------
// --- Region
// ------------------------------------------------------------------------------------------------

/// Selects the bank-holiday set used for calendar expansion. `None` skips
/// bank-holiday expansion entirely.
#[derive(Clone, Copy, Debug, Default, Display, EnumString, PartialEq, Eq)]
pub enum Region {
    #[default]
    #[strum(serialize = "england")]
    England,

    #[strum(serialize = "scotland")]
    Scotland,

    #[strum(serialize = "wales")]
    Wales,

    #[strum(serialize = "northern_ireland")]
    NorthernIreland,

    #[strum(serialize = "null")]
    None,
}

// ------------------------------------------------------------------------------------------------
// --- ConversionOptions
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct ConversionOptions {
    pub include_shapes: bool,
    pub region: Region,
    /// Clamp the lower bound of every calendar window.
    pub calendar_start: Option<NaiveDate>,
    /// Clamp the upper bound of every calendar window.
    pub calendar_end: Option<NaiveDate>,
    /// Defaults to `Europe/London`.
    pub default_agency_timezone: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_shapes: false,
            region: Region::England,
            calendar_start: None,
            calendar_end: None,
            default_agency_timezone: None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// --- ConversionWarning
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum WarningKind {
    DanglingReference,
    Duplicate,
    DwellConflict,
    MissingCoordinates,
    MissingValue,
    UnknownValue,
    Unsupported,
}

/// A skipped or degraded entity. The conversion never aborts on a single
/// bad entity; it records one of these instead.
#[derive(Clone, Debug)]
pub struct ConversionWarning {
    pub kind: WarningKind,
    pub entity_type: String,
    pub entity_id: String,
    pub reason: String,
}

impl ConversionWarning {
    pub(crate) fn new(kind: WarningKind, entity_type: &str, entity_id: &str, reason: &str) -> Self {
        Self {
            kind,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// --- ConversionStats
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct ConversionStats {
    pub agencies: usize,
    pub stops: usize,
    pub routes: usize,
    pub trips_converted: usize,
    pub stop_times_generated: usize,
    pub calendars: usize,
    pub calendar_dates: usize,
    pub shapes: usize,
    pub skipped_journeys: usize,
}

// ------------------------------------------------------------------------------------------------
// --- ConversionResult
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct ConversionResult {
    pub feed: GtfsFeed,
    pub stats: ConversionStats,
    pub warnings: Vec<ConversionWarning>,
}

// ------------------------------------------------------------------------------------------------
// --- TxcToGtfsConverter
// ------------------------------------------------------------------------------------------------

/// Deterministic TXC to GTFS pipeline: identical input and options produce
/// byte-identical output, every collection is sorted by its primary id
/// before emission.
#[derive(Debug, Default)]
pub struct TxcToGtfsConverter {
    options: ConversionOptions,
}

impl TxcToGtfsConverter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn convert(&self, document: &TxcDocument) -> TResult<ConversionResult> {
        Conversion::new(document, &self.options).run()
    }
}

// ------------------------------------------------------------------------------------------------
// --- Conversion
// ------------------------------------------------------------------------------------------------

struct Conversion<'a> {
    document: &'a TxcDocument,
    options: &'a ConversionOptions,
    warnings: Vec<ConversionWarning>,
    stats: ConversionStats,
    services_by_code: FxHashMap<&'a str, &'a Service>,
    patterns_by_id: FxHashMap<&'a str, &'a JourneyPattern>,
    sections_by_id: FxHashMap<&'a str, &'a JourneyPatternSection>,
    stop_points_by_code: FxHashMap<&'a str, &'a StopPoint>,
    operator_ids: FxHashSet<&'a str>,
    /// Calendar window per service code, clamped to the options.
    windows: FxHashMap<&'a str, (NaiveDate, NaiveDate)>,
}

impl<'a> Conversion<'a> {
    fn new(document: &'a TxcDocument, options: &'a ConversionOptions) -> Self {
        let services_by_code = document
            .services()
            .iter()
            .map(|service| (service.service_code(), service))
            .collect();
        let patterns_by_id = document
            .journey_patterns()
            .iter()
            .map(|pattern| (pattern.id(), pattern))
            .collect();
        let sections_by_id = document
            .journey_pattern_sections()
            .iter()
            .map(|section| (section.id(), section))
            .collect();
        let stop_points_by_code = document
            .stop_points()
            .iter()
            .map(|stop_point| (stop_point.atco_code(), stop_point))
            .collect();
        let operator_ids = document
            .operators()
            .iter()
            .map(|operator| operator.id())
            .collect();

        let mut conversion = Self {
            document,
            options,
            warnings: Vec::new(),
            stats: ConversionStats::default(),
            services_by_code,
            patterns_by_id,
            sections_by_id,
            stop_points_by_code,
            operator_ids,
            windows: FxHashMap::default(),
        };
        conversion.compute_windows();
        conversion
    }

    fn run(mut self) -> TResult<ConversionResult> {
        log::info!(
            "Converting {} vehicle journeys across {} services...",
            self.document.vehicle_journey_count(),
            self.document.service_count()
        );

        let agencies = self.build_agencies();
        let routes = self.build_routes();
        let journeys = self.build_journeys();
        let stops = self.build_stops(&journeys.used_stop_codes);

        let JourneyOutput {
            mut trips,
            mut stop_times,
            mut calendars,
            mut calendar_dates,
            mut shapes,
            ..
        } = journeys;

        // All output collections sort by primary id so byte-identical
        // inputs and options give byte-identical files.
        trips.sort_by(|a, b| a.id.cmp(&b.id));
        stop_times.sort_by(|a, b| {
            a.trip_id
                .cmp(&b.trip_id)
                .then(a.stop_sequence.cmp(&b.stop_sequence))
        });
        calendars.sort_by(|a, b| a.service_id.cmp(&b.service_id));
        calendar_dates.sort_by(|a, b| {
            a.service_id
                .cmp(&b.service_id)
                .then(a.date.cmp(&b.date))
        });
        shapes.sort_by(|a, b| a.id.cmp(&b.id));

        self.stats.agencies = agencies.len();
        self.stats.stops = stops.len();
        self.stats.routes = routes.len();
        self.stats.trips_converted = trips.len();
        self.stats.stop_times_generated = stop_times.len();
        self.stats.calendars = calendars.len();
        self.stats.calendar_dates = calendar_dates.len();
        self.stats.shapes = shapes.len();

        let mut rows_per_trip: FxHashMap<&str, usize> = FxHashMap::default();
        for stop_time in &stop_times {
            *rows_per_trip.entry(stop_time.trip_id.as_str()).or_default() += 1;
        }
        if !rows_per_trip.values().any(|&rows| rows >= 2) {
            return Err(ConversionError {
                stats: self.stats,
                warnings: self.warnings,
                reason: "no trip with at least two stop times was produced".to_string(),
            }
            .into());
        }

        log::info!(
            "Converted {} trips with {} stop times ({} journeys skipped)",
            self.stats.trips_converted,
            self.stats.stop_times_generated,
            self.stats.skipped_journeys
        );

        Ok(ConversionResult {
            feed: GtfsFeed {
                agencies,
                stops,
                routes,
                trips,
                stop_times,
                calendars,
                calendar_dates,
                shapes,
                frequencies: Vec::new(),
                feed_info: Vec::new(),
            },
            stats: self.stats,
            warnings: self.warnings,
        })
    }

    fn compute_windows(&mut self) {
        // GTFS needs concrete dates, so open-ended windows fall back to a
        // fixed far-future bound and a missing start to the options clamp.
        let fallback_start = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid constant date");
        let fallback_end = NaiveDate::from_ymd_opt(2099, 12, 31).expect("valid constant date");

        for service in self.document.services() {
            if service.start_date().is_none() && self.options.calendar_start.is_none() {
                self.warnings.push(ConversionWarning::new(
                    WarningKind::MissingValue,
                    "service",
                    service.service_code(),
                    "no operating period start date",
                ));
            }
            let start = match (service.start_date(), self.options.calendar_start) {
                (Some(own), Some(clamp)) => own.max(clamp),
                (Some(own), None) => own,
                (None, Some(clamp)) => clamp,
                (None, None) => fallback_start,
            };
            let end = match (service.end_date(), self.options.calendar_end) {
                (Some(own), Some(clamp)) => own.min(clamp),
                (Some(own), None) => own,
                (None, Some(clamp)) => clamp,
                (None, None) => fallback_end,
            };
            let window = if start > end {
                self.warnings.push(ConversionWarning::new(
                    WarningKind::MissingValue,
                    "service",
                    service.service_code(),
                    "operating window is empty after clamping",
                ));
                (start, start)
            } else {
                (start, end)
            };
            self.windows.insert(service.service_code(), window);
        }
    }

    // Step 1: one agency per operator.
    fn build_agencies(&mut self) -> Vec<Agency> {
        let timezone = self
            .options
            .default_agency_timezone
            .clone()
            .unwrap_or_else(|| "Europe/London".to_string());
        let mut agencies: Vec<Agency> = self
            .document
            .operators()
            .iter()
            .map(|operator| Agency {
                id: operator.id().to_string(),
                name: operator.display_name().to_string(),
                url: String::new(),
                timezone: timezone.clone(),
                lang: None,
            })
            .collect();
        agencies.sort_by(|a, b| a.id.cmp(&b.id));
        agencies
    }

    // Step 3: one route per (service_code, line_id) pair.
    fn build_routes(&mut self) -> Vec<Route> {
        let mut seen = FxHashSet::default();
        let mut routes = Vec::new();
        for service in self.document.services() {
            let agency_id = self.resolve_agency(service);
            for line in service.lines() {
                let route_id = format!("{}:{}", service.service_code(), line.id());
                if !seen.insert(route_id.clone()) {
                    self.warnings.push(ConversionWarning::new(
                        WarningKind::Duplicate,
                        "route",
                        &route_id,
                        "duplicate (service, line) pair",
                    ));
                    continue;
                }
                routes.push(Route {
                    id: route_id,
                    agency_id: agency_id.clone(),
                    short_name: line.name().to_string(),
                    long_name: String::new(),
                    route_type: self.route_type(service),
                });
            }
        }
        routes.sort_by(|a, b| a.id.cmp(&b.id));
        routes
    }

    fn resolve_agency(&mut self, service: &Service) -> Option<String> {
        let operator_ref = service.operator_ref();
        if operator_ref.is_empty() {
            return None;
        }
        if self.operator_ids.contains(operator_ref) {
            Some(operator_ref.to_string())
        } else {
            self.warnings.push(ConversionWarning::new(
                WarningKind::DanglingReference,
                "service",
                service.service_code(),
                &format!("operator {operator_ref:?} is not declared"),
            ));
            None
        }
    }

    fn route_type(&mut self, service: &Service) -> u32 {
        match service.mode() {
            TransportMode::Tram => 0,
            TransportMode::Metro | TransportMode::Underground => 1,
            TransportMode::Rail => 2,
            TransportMode::Bus | TransportMode::Coach => 3,
            TransportMode::Ferry => 4,
            TransportMode::TrolleyBus => 11,
            TransportMode::Other(raw) => {
                self.warnings.push(ConversionWarning::new(
                    WarningKind::UnknownValue,
                    "service",
                    service.service_code(),
                    &format!("unknown mode {raw:?} mapped to bus"),
                ));
                3
            }
        }
    }

    // Steps 4-7: trips, calendars, stop times and shapes per vehicle
    // journey, in journey-code order.
    fn build_journeys(&mut self) -> JourneyOutput {
        let mut output = JourneyOutput::default();
        let mut seen_codes: FxHashSet<&str> = FxHashSet::default();
        let mut calendar_ids: FxHashMap<String, String> = FxHashMap::default();
        let mut shape_ids: FxHashMap<&str, Option<String>> = FxHashMap::default();

        let mut journeys: Vec<&VehicleJourney> = self.document.vehicle_journeys().iter().collect();
        journeys.sort_by_key(|journey| journey.code());

        for journey in journeys {
            if !seen_codes.insert(journey.code()) {
                self.skip_journey(journey, WarningKind::Duplicate, "duplicate journey code");
                continue;
            }
            let Some(pattern) = journey
                .journey_pattern_ref()
                .and_then(|pattern_ref| self.patterns_by_id.get(pattern_ref).copied())
            else {
                self.skip_journey(
                    journey,
                    WarningKind::DanglingReference,
                    "journey pattern does not resolve",
                );
                continue;
            };
            let Some(service) = journey
                .service_ref()
                .and_then(|service_ref| self.services_by_code.get(service_ref).copied())
            else {
                self.skip_journey(
                    journey,
                    WarningKind::DanglingReference,
                    "service does not resolve",
                );
                continue;
            };
            // Routes only exist for a service's own lines, so the pairing
            // must hold here too or the trip would reference a route that
            // was never built.
            let Some(line_ref) = journey.line_ref() else {
                self.skip_journey(journey, WarningKind::DanglingReference, "missing line ref");
                continue;
            };
            if !service.lines().iter().any(|line| line.id() == line_ref) {
                self.skip_journey(
                    journey,
                    WarningKind::DanglingReference,
                    "line is not declared by the referenced service",
                );
                continue;
            }
            let links = self.expand_pattern(pattern);
            if links.is_empty() {
                self.skip_journey(
                    journey,
                    WarningKind::MissingValue,
                    "journey pattern expands to no usable timing links",
                );
                continue;
            }

            let route_id = format!("{}:{}", service.service_code(), line_ref);
            let service_id = self.calendar_for(journey, service, &mut calendar_ids, &mut output);
            let headsign = pattern
                .destination_display()
                .or(service.description())
                .map(str::to_string);
            let shape_id = if self.options.include_shapes {
                self.shape_for(pattern, &links, &mut shape_ids, &mut output.shapes)
            } else {
                None
            };

            let rows = self.build_stop_times(journey, &links);
            for row in &rows {
                output.used_stop_codes.insert(row.stop_id.clone());
            }
            output.trips.push(Trip {
                route_id,
                service_id,
                id: journey.code().to_string(),
                headsign,
                direction_id: match pattern.direction() {
                    Direction::Outbound => Some(0),
                    Direction::Inbound => Some(1),
                    Direction::Other(_) => None,
                },
                block_id: None,
                shape_id,
            });
            output.stop_times.extend(rows);
        }
        output
    }

    fn skip_journey(&mut self, journey: &VehicleJourney, kind: WarningKind, reason: &str) {
        self.stats.skipped_journeys += 1;
        self.warnings.push(ConversionWarning::new(
            kind,
            "vehicle_journey",
            journey.code(),
            reason,
        ));
    }

    /// Concatenates the pattern's sections into one ordered link run.
    /// Links with missing endpoints invalidate the expansion: a hole in
    /// the chain would silently shift every later stop.
    fn expand_pattern(&mut self, pattern: &JourneyPattern) -> Vec<&'a TimingLink> {
        let mut links = Vec::new();
        for section_ref in pattern.section_refs() {
            let Some(section) = self.sections_by_id.get(section_ref.as_str()) else {
                self.warnings.push(ConversionWarning::new(
                    WarningKind::DanglingReference,
                    "journey_pattern",
                    pattern.id(),
                    &format!("section {section_ref:?} does not resolve"),
                ));
                return Vec::new();
            };
            links.extend(section.timing_links());
        }
        if links
            .iter()
            .any(|link| link.from_stop().is_empty() || link.to_stop().is_empty())
        {
            self.warnings.push(ConversionWarning::new(
                WarningKind::MissingValue,
                "journey_pattern",
                pattern.id(),
                "timing link without stop refs",
            ));
            return Vec::new();
        }
        links
    }

    fn calendar_for(
        &mut self,
        journey: &VehicleJourney,
        service: &Service,
        calendar_ids: &mut FxHashMap<String, String>,
        output: &mut JourneyOutput,
    ) -> String {
        let profile = journey
            .operating_profile()
            .unwrap_or_else(|| service.operating_profile());
        let (start_date, end_date) = self.windows[service.service_code()];
        let fingerprint =
            calendar::profile_fingerprint(profile, start_date, end_date, self.options.region);
        if let Some(service_id) = calendar_ids.get(&fingerprint) {
            return service_id.clone();
        }
        let service_id = calendar::service_id_for(&fingerprint);
        let (calendar, dates) = calendar::build_calendar(
            &service_id,
            profile,
            start_date,
            end_date,
            self.options.region,
            &mut self.warnings,
        );
        output.calendars.push(calendar);
        output.calendar_dates.extend(dates);
        calendar_ids.insert(fingerprint, service_id.clone());
        service_id
    }

    // Step 6: accumulate run times from the departure, dwell only where a
    // wait time says so. A wait on both sides of a stop takes the longer
    // one and leaves a trace.
    fn build_stop_times(&mut self, journey: &VehicleJourney, links: &[&TimingLink]) -> Vec<StopTime> {
        let mut rows = Vec::with_capacity(links.len() + 1);
        let mut current = journey.departure_time();
        rows.push(StopTime {
            trip_id: journey.code().to_string(),
            arrival_time: current,
            departure_time: current,
            stop_id: links[0].from_stop().to_string(),
            stop_sequence: 1,
            pickup_type: 0,
            drop_off_type: 0,
            shape_dist_traveled: None,
        });

        for (index, link) in links.iter().enumerate() {
            let arrival = current + link.run_time();
            let dwell = if index + 1 < links.len() {
                let trailing = link.to_wait_time();
                let leading = links[index + 1].from_wait_time();
                match (trailing, leading) {
                    (Some(trailing), Some(leading)) => {
                        self.warnings.push(ConversionWarning::new(
                            WarningKind::DwellConflict,
                            "vehicle_journey",
                            journey.code(),
                            &format!(
                                "wait time on both sides of {:?}, using the longer",
                                link.to_stop()
                            ),
                        ));
                        trailing.max(leading)
                    }
                    (Some(wait), None) | (None, Some(wait)) => wait,
                    (None, None) => 0,
                }
            } else {
                link.to_wait_time().unwrap_or(0)
            };
            current = arrival + dwell;
            rows.push(StopTime {
                trip_id: journey.code().to_string(),
                arrival_time: arrival,
                departure_time: current,
                stop_id: link.to_stop().to_string(),
                stop_sequence: (index + 2) as u32,
                pickup_type: 0,
                drop_off_type: 0,
                shape_dist_traveled: None,
            });
        }

        if journey.start_dead_run() {
            rows[0].pickup_type = 1;
        }
        if journey.end_dead_run()
            && let Some(last) = rows.last_mut()
        {
            last.drop_off_type = 1;
        }
        rows
    }

    // Step 7: one shape per unique journey pattern from stop coordinates.
    fn shape_for(
        &mut self,
        pattern: &'a JourneyPattern,
        links: &[&TimingLink],
        shape_ids: &mut FxHashMap<&'a str, Option<String>>,
        shapes: &mut Vec<Shape>,
    ) -> Option<String> {
        if let Some(cached) = shape_ids.get(pattern.id()) {
            return cached.clone();
        }

        let mut stop_codes: Vec<&str> = vec![links[0].from_stop()];
        stop_codes.extend(links.iter().map(|link| link.to_stop()));
        let shape_id = format!(
            "shape_{}",
            calendar::short_digest(&stop_codes.join(">"))
        );

        let mut points = Vec::new();
        let mut cumulative = 0.0;
        let mut previous: Option<(f64, f64)> = None;
        for code in &stop_codes {
            let Some(stop_point) = self.stop_points_by_code.get(code) else {
                continue;
            };
            let (Some(latitude), Some(longitude)) =
                (stop_point.latitude(), stop_point.longitude())
            else {
                continue;
            };
            if let Some((previous_lat, previous_lon)) = previous {
                cumulative += haversine_km(previous_lat, previous_lon, latitude, longitude);
            }
            points.push(ShapePoint {
                shape_id: shape_id.clone(),
                latitude,
                longitude,
                sequence: points.len() as u32 + 1,
                shape_dist_traveled: Some(cumulative),
            });
            previous = Some((latitude, longitude));
        }

        let result = if points.len() < 2 {
            self.warnings.push(ConversionWarning::new(
                WarningKind::MissingCoordinates,
                "journey_pattern",
                pattern.id(),
                "not enough stop coordinates to synthesize a shape",
            ));
            None
        } else {
            shapes.push(Shape {
                id: shape_id.clone(),
                points,
            });
            Some(shape_id)
        };
        shape_ids.insert(pattern.id(), result.clone());
        result
    }

    // Step 2: one stop per stop point referenced by a retained journey.
    fn build_stops(&mut self, used_stop_codes: &FxHashSet<String>) -> Vec<Stop> {
        let mut codes: Vec<&String> = used_stop_codes.iter().collect();
        codes.sort();

        let mut stops = Vec::with_capacity(codes.len());
        for code in codes {
            match self.stop_points_by_code.get(code.as_str()) {
                Some(stop_point) => {
                    if stop_point.latitude().is_none() || stop_point.longitude().is_none() {
                        self.warnings.push(ConversionWarning::new(
                            WarningKind::MissingCoordinates,
                            "stop",
                            code,
                            "stop point has no coordinates",
                        ));
                    }
                    stops.push(Stop {
                        id: code.clone(),
                        code: None,
                        name: stop_point
                            .common_name()
                            .unwrap_or(stop_point.atco_code())
                            .to_string(),
                        latitude: stop_point.latitude(),
                        longitude: stop_point.longitude(),
                        location_type: None,
                        parent_station: None,
                    });
                }
                None => {
                    self.warnings.push(ConversionWarning::new(
                        WarningKind::DanglingReference,
                        "stop",
                        code,
                        "referenced by a journey pattern but not declared",
                    ));
                    stops.push(Stop {
                        id: code.clone(),
                        code: None,
                        name: code.clone(),
                        latitude: None,
                        longitude: None,
                        location_type: None,
                        parent_station: None,
                    });
                }
            }
        }
        stops
    }
}

#[derive(Default)]
struct JourneyOutput {
    trips: Vec<Trip>,
    stop_times: Vec<StopTime>,
    calendars: Vec<Calendar>,
    calendar_dates: Vec<CalendarDate>,
    shapes: Vec<Shape>,
    used_stop_codes: FxHashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransitParserError;
    use crate::FeedAccess;
    use crate::txc::test_fixtures::{CROSS_SERVICE_XML, SAMPLE_SERVICE_XML, sample_document};
    use pretty_assertions::assert_eq;

    fn convert_sample() -> ConversionResult {
        TxcToGtfsConverter::default()
            .convert(&sample_document())
            .unwrap()
    }

    #[test]
    fn converts_the_sample_document() {
        let result = convert_sample();
        let feed = &result.feed;

        assert_eq!(1, result.stats.agencies);
        assert_eq!(4, result.stats.stops);
        assert_eq!(1, result.stats.routes);
        assert_eq!(5, result.stats.trips_converted);
        assert_eq!(20, result.stats.stop_times_generated);
        assert_eq!(0, result.stats.skipped_journeys);

        let agency = &feed.agencies().unwrap()[0];
        assert_eq!("OP1", agency.id);
        assert_eq!("Sample Bus", agency.name);
        assert_eq!("Europe/London", agency.timezone);

        let route = &feed.routes().unwrap()[0];
        assert_eq!("SVC001:L1", route.id);
        assert_eq!("1", route.short_name);
        assert_eq!(3, route.route_type);
        assert_eq!(Some("OP1".to_string()), route.agency_id);

        // One weekday calendar shared by all five trips.
        let calendars = feed.calendars().unwrap();
        assert_eq!(1, calendars.len());
        let calendar = &calendars[0];
        assert!(calendar.service_id.starts_with("calendar_"));
        assert!(calendar.monday && calendar.friday);
        assert!(!calendar.saturday && !calendar.sunday);
        assert_eq!(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            calendar.start_date
        );

        feed.validate().unwrap();
    }

    #[test]
    fn stop_times_accumulate_run_and_wait_times() {
        let result = convert_sample();
        let rows: Vec<&StopTime> = result
            .feed
            .stop_times()
            .unwrap()
            .iter()
            .filter(|row| row.trip_id == "VJ1")
            .collect();

        assert_eq!(4, rows.len());
        assert_eq!(
            vec![1, 2, 3, 4],
            rows.iter().map(|row| row.stop_sequence).collect::<Vec<_>>()
        );
        // 07:00 departure, then 5, 3 (+1 wait) and 4 minute links.
        assert_eq!(7 * 3600, rows[0].arrival_time);
        assert_eq!(7 * 3600 + 300, rows[1].arrival_time);
        assert_eq!(7 * 3600 + 480, rows[2].arrival_time);
        assert_eq!(7 * 3600 + 540, rows[2].departure_time);
        assert_eq!(7 * 3600 + 780, rows[3].arrival_time);
        assert_eq!(rows[3].arrival_time, rows[3].departure_time);
    }

    #[test]
    fn conversion_is_deterministic_on_disk() {
        let document = sample_document();
        let converter = TxcToGtfsConverter::default();
        let dir = tempfile::tempdir().unwrap();

        let first = dir.path().join("first");
        let second = dir.path().join("second");
        converter.convert(&document).unwrap().feed.write_to_path(&first).unwrap();
        converter.convert(&document).unwrap().feed.write_to_path(&second).unwrap();

        for file_name in ["agency.txt", "stops.txt", "routes.txt", "trips.txt", "stop_times.txt", "calendar.txt"] {
            let a = std::fs::read(first.join(file_name)).unwrap();
            let b = std::fs::read(second.join(file_name)).unwrap();
            assert_eq!(a, b, "{file_name} differs between runs");
        }
    }

    fn assert_reference_integrity(feed: &GtfsFeed) {
        let stop_ids: rustc_hash::FxHashSet<&str> =
            feed.stops().unwrap().iter().map(|s| s.id.as_str()).collect();
        let trip_ids: rustc_hash::FxHashSet<&str> =
            feed.trips().unwrap().iter().map(|t| t.id.as_str()).collect();
        let route_ids: rustc_hash::FxHashSet<&str> =
            feed.routes().unwrap().iter().map(|r| r.id.as_str()).collect();
        let service_ids: rustc_hash::FxHashSet<&str> = feed
            .calendars()
            .unwrap()
            .iter()
            .map(|c| c.service_id.as_str())
            .collect();

        for stop_time in feed.stop_times().unwrap() {
            assert!(trip_ids.contains(stop_time.trip_id.as_str()));
            assert!(stop_ids.contains(stop_time.stop_id.as_str()));
        }
        for trip in feed.trips().unwrap() {
            assert!(
                route_ids.contains(trip.route_id.as_str()),
                "trip {:?} references route {:?} that was never built",
                trip.id,
                trip.route_id
            );
            assert!(service_ids.contains(trip.service_id.as_str()));
        }
    }

    #[test]
    fn reference_integrity_after_conversion() {
        assert_reference_integrity(&convert_sample().feed);

        // Two services with one line each: trips may only reference the
        // (service, line) routes that step 3 actually built.
        let document = crate::txc::TxcDocument::from_string(CROSS_SERVICE_XML).unwrap();
        let result = TxcToGtfsConverter::default().convert(&document).unwrap();
        let route_ids: Vec<&str> = result
            .feed
            .routes()
            .unwrap()
            .iter()
            .map(|route| route.id.as_str())
            .collect();
        assert_eq!(vec!["SVC001:L1", "SVC002:L2"], route_ids);
        let trips = result.feed.trips().unwrap();
        assert_eq!(2, trips.len());
        assert!(trips.iter().all(|trip| trip.id != "VJX"));
        assert_reference_integrity(&result.feed);
    }

    #[test]
    fn journey_with_another_services_line_is_skipped() {
        // The parser already drops the cross-service journey; a document
        // that bypassed linking must not fare any better.
        let mut document = crate::txc::TxcDocument::from_string(CROSS_SERVICE_XML).unwrap();
        let mut rogue = VehicleJourney::new("VJX2".to_string());
        rogue.set_departure_time(10 * 3600);
        rogue.set_journey_pattern_ref("JP1".to_string());
        rogue.set_service_ref("SVC001".to_string());
        rogue.set_line_ref("L2".to_string());
        document.vehicle_journeys.push(rogue);

        let result = TxcToGtfsConverter::default().convert(&document).unwrap();
        assert_eq!(2, result.stats.trips_converted);
        assert_eq!(1, result.stats.skipped_journeys);
        assert!(result.warnings.iter().any(|warning| {
            warning.kind == WarningKind::DanglingReference && warning.entity_id == "VJX2"
        }));
        assert!(
            result
                .feed
                .routes()
                .unwrap()
                .iter()
                .all(|route| route.id != "SVC001:L2")
        );
        assert_reference_integrity(&result.feed);
    }

    #[test]
    fn shapes_follow_stop_coordinates() {
        let options = ConversionOptions {
            include_shapes: true,
            ..ConversionOptions::default()
        };
        let result = TxcToGtfsConverter::new(options)
            .convert(&sample_document())
            .unwrap();

        // Two journey patterns, one shape each.
        let shapes = result.feed.shapes().unwrap();
        assert_eq!(2, shapes.len());
        for shape in shapes {
            assert_eq!(4, shape.points.len());
            let distances: Vec<f64> = shape
                .points
                .iter()
                .map(|point| point.shape_dist_traveled.unwrap())
                .collect();
            assert_eq!(Some(0.0), distances.first().copied());
            assert!(distances.windows(2).all(|pair| pair[0] < pair[1]));
        }
        assert!(
            result
                .feed
                .trips()
                .unwrap()
                .iter()
                .all(|trip| trip.shape_id.is_some())
        );
    }

    #[test]
    fn bank_holiday_operation_emits_calendar_dates() {
        let xml = SAMPLE_SERVICE_XML.replace(
            "<RegularDayType><DaysOfWeek><MondayToFriday/></DaysOfWeek></RegularDayType>",
            "<RegularDayType><DaysOfWeek><MondayToFriday/></DaysOfWeek></RegularDayType>\
             <BankHolidayOperation>\
               <DaysOfNonOperation><ChristmasDay/><BoxingDay/></DaysOfNonOperation>\
             </BankHolidayOperation>",
        );
        let document = crate::txc::TxcDocument::from_string(&xml).unwrap();

        let result = TxcToGtfsConverter::default().convert(&document).unwrap();
        let dates = result.feed.calendar_dates().unwrap();
        assert_eq!(2, dates.len());
        assert!(
            dates
                .iter()
                .all(|row| row.exception_type == crate::gtfs::ExceptionType::Removed)
        );

        // Without a region there is nothing to expand, only a warning.
        let options = ConversionOptions {
            region: Region::None,
            ..ConversionOptions::default()
        };
        let result = TxcToGtfsConverter::new(options).convert(&document).unwrap();
        assert!(result.feed.calendar_dates().unwrap().is_empty());
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.kind == WarningKind::Unsupported)
        );
    }

    #[test]
    fn calendar_window_clamps_to_options() {
        let options = ConversionOptions {
            calendar_start: chrono::NaiveDate::from_ymd_opt(2025, 4, 28),
            calendar_end: chrono::NaiveDate::from_ymd_opt(2025, 6, 30),
            ..ConversionOptions::default()
        };
        let result = TxcToGtfsConverter::new(options)
            .convert(&sample_document())
            .unwrap();
        let calendar = &result.feed.calendars().unwrap()[0];
        assert_eq!(
            chrono::NaiveDate::from_ymd_opt(2025, 4, 28).unwrap(),
            calendar.start_date
        );
        assert_eq!(
            chrono::NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            calendar.end_date
        );
    }

    #[test]
    fn dead_runs_disable_pickup_and_drop_off() {
        let xml = SAMPLE_SERVICE_XML.replace(
            "<VehicleJourneyCode>VJ1</VehicleJourneyCode>",
            "<VehicleJourneyCode>VJ1</VehicleJourneyCode><StartDeadRun><ShortWorking/></StartDeadRun><EndDeadRun><ShortWorking/></EndDeadRun>",
        );
        let document = crate::txc::TxcDocument::from_string(&xml).unwrap();
        let result = TxcToGtfsConverter::default().convert(&document).unwrap();
        let rows: Vec<&StopTime> = result
            .feed
            .stop_times()
            .unwrap()
            .iter()
            .filter(|row| row.trip_id == "VJ1")
            .collect();
        assert_eq!(1, rows[0].pickup_type);
        assert_eq!(0, rows[0].drop_off_type);
        assert_eq!(1, rows[3].drop_off_type);
    }

    #[test]
    fn empty_document_fails_with_conversion_error() {
        let document = crate::txc::TxcDocument::from_string("").unwrap();
        match TxcToGtfsConverter::default().convert(&document) {
            Err(TransitParserError::Conversion(error)) => {
                assert_eq!(0, error.stats.trips_converted);
                assert!(error.reason.contains("stop times"));
            }
            other => panic!("expected ConversionError, got {other:?}"),
        }
    }

    #[test]
    fn trip_headsign_falls_back_to_the_service_description() {
        let xml = SAMPLE_SERVICE_XML
            .replace("<DestinationDisplay>Broadmead</DestinationDisplay>", "")
            .replace("<DestinationDisplay>Temple Meads</DestinationDisplay>", "");
        let document = crate::txc::TxcDocument::from_string(&xml).unwrap();
        let result = TxcToGtfsConverter::default().convert(&document).unwrap();
        assert!(
            result
                .feed
                .trips()
                .unwrap()
                .iter()
                .all(|trip| trip.headsign.as_deref() == Some("Temple Meads to Broadmead"))
        );
    }
}
