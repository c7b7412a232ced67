#![doc = include_str!("../README.md")]
mod conversion;
mod error;
mod gtfs;
mod io;
mod models;
mod parsing;
mod txc;
mod utils;
mod xml;

pub use conversion::{
    ConversionOptions, ConversionResult, ConversionStats, ConversionWarning, Region,
    TxcToGtfsConverter, WarningKind,
};
pub use error::{
    CalendarConversionError, ConversionError, FilterError, GtfsError, InvalidDateError,
    MappingError, TResult, TransitParserError, TxcError,
};
pub use gtfs::{
    Agency, Calendar, CalendarDate, DateInput, ExceptionType, FeedAccess, FeedInfo, Frequency,
    GtfsFeed, GtfsFilter, LazyGtfsFeed, Route, Shape, ShapePoint, Stop, StopTime, Trip,
};
pub use io::{CsvDocument, CsvRow, JsonDocument};
// The TXC route definition is renamed on export: `Route` is the GTFS entity.
pub use models::{
    BankHolidayName, BankHolidayOperation, DateRange, Direction, JourneyPattern,
    JourneyPatternSection, Line, Operator, OperatingProfile, RegularDayType, Route as TxcRoute,
    RouteLink, RouteSection, Service, SpecialDaysOperation, StopPoint, TimingLink, TransportMode,
    VehicleJourney,
};
pub use txc::TxcDocument;
pub use xml::{XmlEvent, XmlReader};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    /// Full pipeline: parse a TXC document, convert it, write the feed,
    /// load it back and query it.
    #[test]
    fn parse_convert_write_reload_query() {
        let document = txc::test_fixtures::sample_document();
        let converter = TxcToGtfsConverter::new(ConversionOptions {
            include_shapes: true,
            ..ConversionOptions::default()
        });
        let result = converter.convert(&document).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtfs");
        result.feed.write_to_path(&path).unwrap();

        let reloaded = GtfsFeed::from_path(&path).unwrap();
        assert_eq!(
            result.feed.trip_count().unwrap(),
            reloaded.trip_count().unwrap()
        );
        assert_eq!(
            result.feed.stop_time_count().unwrap(),
            reloaded.stop_time_count().unwrap()
        );

        let filter = GtfsFilter::new(&reloaded);
        let trips = filter.trips_for_route("SVC001:L1").unwrap();
        assert_eq!(5, trips.len());

        // 2025-06-02 is a Monday inside the service window.
        let active = filter.active_services_on("2025-06-02").unwrap();
        assert_eq!(1, active.len());
        let weekday_trips = filter.trips_on_date("2025-06-02").unwrap();
        assert_eq!(5, weekday_trips.len());

        // 2025-06-07 is a Saturday: the weekday-only service rests.
        assert!(filter.active_services_on("2025-06-07").unwrap().is_empty());
    }
}
