use std::cell::OnceCell;

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    error::{InvalidDateError, TResult},
    gtfs::feed::FeedAccess,
    gtfs::models::{Calendar, ExceptionType, Route, Stop, StopTime, Trip},
};

// ------------------------------------------------------------------------------------------------
// --- DateInput
// ------------------------------------------------------------------------------------------------

/// A query date: either already typed or a `YYYY-MM-DD` string.
#[derive(Debug, Clone)]
pub enum DateInput {
    Date(NaiveDate),
    Text(String),
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl DateInput {
    fn resolve(self) -> Result<NaiveDate, InvalidDateError> {
        match self {
            Self::Date(date) => Ok(date),
            Self::Text(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map_err(|_| InvalidDateError::new(&text)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// --- GtfsFilter
// ------------------------------------------------------------------------------------------------

/// Index-backed lookups over any feed. Every index maps stable ids to
/// offsets in the feed's base vectors, is built on first use and cached for
/// the filter's lifetime; feeds are immutable, so a cache never goes stale.
pub struct GtfsFilter<'a, F: FeedAccess> {
    feed: &'a F,
    stop_index: OnceCell<FxHashMap<String, usize>>,
    route_index: OnceCell<FxHashMap<String, usize>>,
    trip_index: OnceCell<FxHashMap<String, usize>>,
    calendar_index: OnceCell<FxHashMap<String, usize>>,
    trips_by_route: OnceCell<FxHashMap<String, Vec<usize>>>,
    stop_times_by_trip: OnceCell<FxHashMap<String, Vec<usize>>>,
    stop_times_by_stop: OnceCell<FxHashMap<String, Vec<usize>>>,
    trips_by_service: OnceCell<FxHashMap<String, Vec<usize>>>,
    exceptions: OnceCell<FxHashMap<String, FxHashMap<NaiveDate, ExceptionType>>>,
}

impl<'a, F: FeedAccess> GtfsFilter<'a, F> {
    pub fn new(feed: &'a F) -> Self {
        Self {
            feed,
            stop_index: OnceCell::new(),
            route_index: OnceCell::new(),
            trip_index: OnceCell::new(),
            calendar_index: OnceCell::new(),
            trips_by_route: OnceCell::new(),
            stop_times_by_trip: OnceCell::new(),
            stop_times_by_stop: OnceCell::new(),
            trips_by_service: OnceCell::new(),
            exceptions: OnceCell::new(),
        }
    }

    // Id lookups, O(1) after the first index build. Duplicate ids keep the
    // first occurrence.

    pub fn get_stop(&self, stop_id: &str) -> TResult<Option<&Stop>> {
        let stops = self.feed.stops()?;
        Ok(self.stop_index()?.get(stop_id).map(|&offset| &stops[offset]))
    }

    pub fn get_route(&self, route_id: &str) -> TResult<Option<&Route>> {
        let routes = self.feed.routes()?;
        Ok(self.route_index()?.get(route_id).map(|&offset| &routes[offset]))
    }

    pub fn get_trip(&self, trip_id: &str) -> TResult<Option<&Trip>> {
        let trips = self.feed.trips()?;
        Ok(self.trip_index()?.get(trip_id).map(|&offset| &trips[offset]))
    }

    pub fn get_calendar(&self, service_id: &str) -> TResult<Option<&Calendar>> {
        let calendars = self.feed.calendars()?;
        Ok(self
            .calendar_index()?
            .get(service_id)
            .map(|&offset| &calendars[offset]))
    }

    // By route

    pub fn trips_for_route(&self, route_id: &str) -> TResult<Vec<&Trip>> {
        let trips = self.feed.trips()?;
        let index = self.trips_by_route()?;
        Ok(offsets(index, route_id).iter().map(|&offset| &trips[offset]).collect())
    }

    pub fn stop_times_for_route(&self, route_id: &str) -> TResult<Vec<&StopTime>> {
        let mut result = Vec::new();
        for trip in self.trips_for_route(route_id)? {
            result.extend(self.stop_times_for_trip(&trip.id)?);
        }
        Ok(result)
    }

    /// Stops served by a route, deduplicated in first-seen order.
    pub fn stops_for_route(&self, route_id: &str) -> TResult<Vec<&Stop>> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for stop_time in self.stop_times_for_route(route_id)? {
            if seen.insert(stop_time.stop_id.clone())
                && let Some(stop) = self.get_stop(&stop_time.stop_id)?
            {
                result.push(stop);
            }
        }
        Ok(result)
    }

    pub fn route_trip_count(&self, route_id: &str) -> TResult<usize> {
        Ok(offsets(self.trips_by_route()?, route_id).len())
    }

    pub fn route_stop_count(&self, route_id: &str) -> TResult<usize> {
        Ok(self.stops_for_route(route_id)?.len())
    }

    // By trip

    /// Rows in strictly increasing `stop_sequence`.
    pub fn stop_times_for_trip(&self, trip_id: &str) -> TResult<Vec<&StopTime>> {
        let stop_times = self.feed.stop_times()?;
        let index = self.stop_times_by_trip()?;
        Ok(offsets(index, trip_id)
            .iter()
            .map(|&offset| &stop_times[offset])
            .collect())
    }

    /// Stops of a trip in stop-sequence order.
    pub fn stops_for_trip(&self, trip_id: &str) -> TResult<Vec<&Stop>> {
        let mut result = Vec::new();
        for stop_time in self.stop_times_for_trip(trip_id)? {
            if let Some(stop) = self.get_stop(&stop_time.stop_id)? {
                result.push(stop);
            }
        }
        Ok(result)
    }

    // By stop

    pub fn stop_times_at_stop(&self, stop_id: &str) -> TResult<Vec<&StopTime>> {
        let stop_times = self.feed.stop_times()?;
        let index = self.stop_times_by_stop()?;
        Ok(offsets(index, stop_id)
            .iter()
            .map(|&offset| &stop_times[offset])
            .collect())
    }

    /// Trips calling at a stop, deduplicated.
    pub fn trips_serving_stop(&self, stop_id: &str) -> TResult<Vec<&Trip>> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for stop_time in self.stop_times_at_stop(stop_id)? {
            if seen.insert(stop_time.trip_id.clone())
                && let Some(trip) = self.get_trip(&stop_time.trip_id)?
            {
                result.push(trip);
            }
        }
        Ok(result)
    }

    /// Routes calling at a stop, deduplicated.
    pub fn routes_serving_stop(&self, stop_id: &str) -> TResult<Vec<&Route>> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for trip in self.trips_serving_stop(stop_id)? {
            if seen.insert(trip.route_id.clone())
                && let Some(route) = self.get_route(&trip.route_id)?
            {
                result.push(route);
            }
        }
        Ok(result)
    }

    pub fn stop_trip_count(&self, stop_id: &str) -> TResult<usize> {
        Ok(self.trips_serving_stop(stop_id)?.len())
    }

    // By service and date

    pub fn trips_for_service(&self, service_id: &str) -> TResult<Vec<&Trip>> {
        let trips = self.feed.trips()?;
        let index = self.trips_by_service()?;
        Ok(offsets(index, service_id)
            .iter()
            .map(|&offset| &trips[offset])
            .collect())
    }

    /// Calendars active on the given date. A service is active when the
    /// date lies in its window and either its weekday flag holds with no
    /// removal exception, or an add exception overrides the weekday test.
    pub fn active_services_on<D: Into<DateInput>>(&self, date: D) -> TResult<Vec<&Calendar>> {
        let date = date.into().resolve()?;
        let mut result = Vec::new();
        for calendar in self.feed.calendars()? {
            if self.service_active(calendar, date)? {
                result.push(calendar);
            }
        }
        Ok(result)
    }

    /// Trips whose service is active on the given date.
    pub fn trips_on_date<D: Into<DateInput>>(&self, date: D) -> TResult<Vec<&Trip>> {
        let date = date.into().resolve()?;
        let mut active: FxHashSet<&str> = FxHashSet::default();
        for calendar in self.feed.calendars()? {
            if self.service_active(calendar, date)? {
                active.insert(calendar.service_id.as_str());
            }
        }
        Ok(self
            .feed
            .trips()?
            .iter()
            .filter(|trip| active.contains(trip.service_id.as_str()))
            .collect())
    }

    fn service_active(&self, calendar: &Calendar, date: NaiveDate) -> TResult<bool> {
        if date < calendar.start_date || date > calendar.end_date {
            return Ok(false);
        }
        let exception = self
            .exceptions()?
            .get(calendar.service_id.as_str())
            .and_then(|dates| dates.get(&date));
        Ok(match exception {
            Some(ExceptionType::Added) => true,
            Some(ExceptionType::Removed) => false,
            _ => calendar.weekday_flag(date),
        })
    }

    // Index construction, on demand and cached.

    fn stop_index(&self) -> TResult<&FxHashMap<String, usize>> {
        if let Some(index) = self.stop_index.get() {
            return Ok(index);
        }
        let mut index = FxHashMap::default();
        for (offset, stop) in self.feed.stops()?.iter().enumerate() {
            index.entry(stop.id.clone()).or_insert(offset);
        }
        Ok(self.stop_index.get_or_init(|| index))
    }

    fn route_index(&self) -> TResult<&FxHashMap<String, usize>> {
        if let Some(index) = self.route_index.get() {
            return Ok(index);
        }
        let mut index = FxHashMap::default();
        for (offset, route) in self.feed.routes()?.iter().enumerate() {
            index.entry(route.id.clone()).or_insert(offset);
        }
        Ok(self.route_index.get_or_init(|| index))
    }

    fn trip_index(&self) -> TResult<&FxHashMap<String, usize>> {
        if let Some(index) = self.trip_index.get() {
            return Ok(index);
        }
        let mut index = FxHashMap::default();
        for (offset, trip) in self.feed.trips()?.iter().enumerate() {
            index.entry(trip.id.clone()).or_insert(offset);
        }
        Ok(self.trip_index.get_or_init(|| index))
    }

    fn calendar_index(&self) -> TResult<&FxHashMap<String, usize>> {
        if let Some(index) = self.calendar_index.get() {
            return Ok(index);
        }
        let mut index = FxHashMap::default();
        for (offset, calendar) in self.feed.calendars()?.iter().enumerate() {
            index.entry(calendar.service_id.clone()).or_insert(offset);
        }
        Ok(self.calendar_index.get_or_init(|| index))
    }

    fn trips_by_route(&self) -> TResult<&FxHashMap<String, Vec<usize>>> {
        if let Some(index) = self.trips_by_route.get() {
            return Ok(index);
        }
        let mut index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (offset, trip) in self.feed.trips()?.iter().enumerate() {
            index.entry(trip.route_id.clone()).or_default().push(offset);
        }
        Ok(self.trips_by_route.get_or_init(|| index))
    }

    fn stop_times_by_trip(&self) -> TResult<&FxHashMap<String, Vec<usize>>> {
        if let Some(index) = self.stop_times_by_trip.get() {
            return Ok(index);
        }
        let stop_times = self.feed.stop_times()?;
        let mut index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (offset, stop_time) in stop_times.iter().enumerate() {
            index
                .entry(stop_time.trip_id.clone())
                .or_default()
                .push(offset);
        }
        for offsets in index.values_mut() {
            offsets.sort_by_key(|&offset| stop_times[offset].stop_sequence);
        }
        Ok(self.stop_times_by_trip.get_or_init(|| index))
    }

    fn stop_times_by_stop(&self) -> TResult<&FxHashMap<String, Vec<usize>>> {
        if let Some(index) = self.stop_times_by_stop.get() {
            return Ok(index);
        }
        let mut index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (offset, stop_time) in self.feed.stop_times()?.iter().enumerate() {
            index
                .entry(stop_time.stop_id.clone())
                .or_default()
                .push(offset);
        }
        Ok(self.stop_times_by_stop.get_or_init(|| index))
    }

    fn trips_by_service(&self) -> TResult<&FxHashMap<String, Vec<usize>>> {
        if let Some(index) = self.trips_by_service.get() {
            return Ok(index);
        }
        let mut index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (offset, trip) in self.feed.trips()?.iter().enumerate() {
            index
                .entry(trip.service_id.clone())
                .or_default()
                .push(offset);
        }
        Ok(self.trips_by_service.get_or_init(|| index))
    }

    fn exceptions(&self) -> TResult<&FxHashMap<String, FxHashMap<NaiveDate, ExceptionType>>> {
        if let Some(index) = self.exceptions.get() {
            return Ok(index);
        }
        let mut index: FxHashMap<String, FxHashMap<NaiveDate, ExceptionType>> =
            FxHashMap::default();
        for calendar_date in self.feed.calendar_dates()? {
            index
                .entry(calendar_date.service_id.clone())
                .or_default()
                .insert(calendar_date.date, calendar_date.exception_type);
        }
        Ok(self.exceptions.get_or_init(|| index))
    }
}

fn offsets<'m>(index: &'m FxHashMap<String, Vec<usize>>, key: &str) -> &'m [usize] {
    index.get(key).map(Vec::as_slice).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransitParserError;
    use crate::gtfs::test_fixtures::sample_feed;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_lookups() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);

        let stop = filter.get_stop("stop_1").unwrap().unwrap();
        assert_eq!("Main Street Station", stop.name);
        assert!(filter.get_stop("nonexistent").unwrap().is_none());

        assert!(filter.get_route("route_1").unwrap().is_some());
        assert!(filter.get_trip("trip_1").unwrap().is_some());
        let calendar = filter.get_calendar("weekday").unwrap().unwrap();
        assert_eq!("weekday", calendar.service_id);
    }

    #[test]
    fn trips_and_stops_for_route() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);

        let trips = filter.trips_for_route("route_1").unwrap();
        assert_eq!(2, trips.len());
        assert!(trips.iter().all(|trip| trip.route_id == "route_1"));

        assert_eq!(2, filter.route_trip_count("route_1").unwrap());
        assert!(filter.route_stop_count("route_1").unwrap() >= 1);

        let stops = filter.stops_for_route("route_1").unwrap();
        // Deduplicated: both trips serve the same four stops.
        assert_eq!(4, stops.len());
    }

    #[test]
    fn stop_times_for_trip_are_sequence_ordered() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);

        let stop_times = filter.stop_times_for_trip("trip_1").unwrap();
        assert_eq!(4, stop_times.len());
        let sequences: Vec<u32> = stop_times.iter().map(|st| st.stop_sequence).collect();
        assert_eq!(vec![1, 2, 3, 4], sequences);
        assert!(
            stop_times
                .windows(2)
                .all(|pair| pair[0].arrival_time <= pair[1].arrival_time)
        );

        assert_eq!(4, filter.stops_for_trip("trip_1").unwrap().len());
    }

    #[test]
    fn queries_by_stop() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);

        let stop_times = filter.stop_times_at_stop("stop_1").unwrap();
        assert!(!stop_times.is_empty());
        assert!(stop_times.iter().all(|st| st.stop_id == "stop_1"));

        let trips = filter.trips_serving_stop("stop_1").unwrap();
        assert!(!trips.is_empty());
        assert_eq!(trips.len(), filter.stop_trip_count("stop_1").unwrap());

        let routes = filter.routes_serving_stop("stop_1").unwrap();
        assert!(!routes.is_empty());
    }

    #[test]
    fn active_services_by_weekday() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);

        // 2025-01-06 is a Monday.
        let services = filter.active_services_on("2025-01-06").unwrap();
        let ids: Vec<&str> = services.iter().map(|c| c.service_id.as_str()).collect();
        assert!(ids.contains(&"weekday"));
        assert!(!ids.contains(&"weekend"));

        // 2025-01-04 is a Saturday.
        let services = filter.active_services_on("2025-01-04").unwrap();
        let ids: Vec<&str> = services.iter().map(|c| c.service_id.as_str()).collect();
        assert!(ids.contains(&"weekend"));
        assert!(!ids.contains(&"weekday"));
    }

    #[test]
    fn active_services_accepts_typed_dates() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);
        let services = filter
            .active_services_on(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
            .unwrap();
        assert!(services.iter().any(|c| c.service_id == "weekday"));
    }

    #[test]
    fn calendar_date_exceptions_override_the_weekday_flag() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);

        // 2025-07-04 is a Friday, but the holiday removes the weekday
        // service and adds the weekend one.
        let services = filter.active_services_on("2025-07-04").unwrap();
        let ids: Vec<&str> = services.iter().map(|c| c.service_id.as_str()).collect();
        assert!(!ids.contains(&"weekday"));
        assert!(ids.contains(&"weekend"));
    }

    #[test]
    fn trips_on_date_follow_active_services() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);
        let trips = filter.trips_on_date("2025-01-06").unwrap();
        assert!(!trips.is_empty());
        assert!(trips.iter().all(|trip| trip.service_id == "weekday"));
    }

    #[test]
    fn invalid_date_string_is_an_invalid_date_error() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);
        match filter.active_services_on("not-a-valid-date") {
            Err(TransitParserError::InvalidDate(error)) => {
                assert_eq!("not-a-valid-date", error.date_string);
                assert!(error.expected_format.contains("YYYY-MM-DD"));
            }
            other => panic!("expected InvalidDateError, got {other:?}"),
        }
    }

    #[test]
    fn trips_for_service() {
        let feed = sample_feed();
        let filter = GtfsFilter::new(&feed);
        let trips = filter.trips_for_service("weekday").unwrap();
        assert_eq!(3, trips.len());
        assert!(trips.iter().all(|trip| trip.service_id == "weekday"));
    }
}
