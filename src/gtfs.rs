mod feed;
mod filter;
mod models;
mod read;
mod write;

pub use feed::{FeedAccess, GtfsFeed, LazyGtfsFeed};
pub use filter::{DateInput, GtfsFilter};
pub use models::{
    Agency, Calendar, CalendarDate, ExceptionType, FeedInfo, Frequency, Route, Shape, ShapePoint,
    Stop, StopTime, Trip,
};


#[cfg(test)]
mod tests {
    use super::test_fixtures::{sample_feed, write_sample_feed};
    use super::*;
    use crate::error::{GtfsError, TransitParserError};
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;

    #[test]
    fn eager_feed_loads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_feed(dir.path());
        let feed = GtfsFeed::from_path(dir.path()).unwrap();

        assert_eq!(2, feed.agency_count().unwrap());
        assert_eq!(5, feed.stop_count().unwrap());
        assert_eq!(3, feed.route_count().unwrap());
        assert_eq!(5, feed.trip_count().unwrap());
        assert_eq!(16, feed.stop_time_count().unwrap());
        assert_eq!(2, feed.calendars().unwrap().len());
        assert_eq!(3, feed.calendar_dates().unwrap().len());
        assert_eq!(1, feed.shapes().unwrap().len());

        let agency = &feed.agencies().unwrap()[0];
        assert_eq!("agency_1", agency.id);
        assert_eq!("Test Transit Agency", agency.name);
        assert_eq!("America/New_York", agency.timezone);

        let stop = &feed.stops().unwrap()[0];
        assert!((stop.latitude.unwrap() - 40.712776).abs() < 1e-4);
        assert!((stop.longitude.unwrap() + 74.005974).abs() < 1e-4);

        // Child station references its parent.
        let platform = &feed.stops().unwrap()[4];
        assert_eq!(Some("stop_4".to_string()), platform.parent_station);

        feed.validate().unwrap();
    }

    #[test]
    fn nonexistent_path_is_file_not_found() {
        match GtfsFeed::from_path("/nonexistent/path") {
            Err(TransitParserError::Gtfs(GtfsError::FileNotFound { path, .. })) => {
                assert_eq!("/nonexistent/path", path.to_string_lossy());
            }
            other => panic!("expected GtfsFileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_directory_lists_missing_core_files() {
        let dir = tempfile::tempdir().unwrap();
        match GtfsFeed::from_path(dir.path()) {
            Err(TransitParserError::Gtfs(GtfsError::FileNotFound { missing_files, .. })) => {
                assert_eq!(
                    vec![
                        "agency.txt",
                        "stops.txt",
                        "routes.txt",
                        "trips.txt",
                        "stop_times.txt"
                    ],
                    missing_files
                );
            }
            other => panic!("expected GtfsFileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn csv_round_trip_preserves_counts_and_id_sets() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_feed(dir.path());
        let feed = GtfsFeed::from_path(dir.path()).unwrap();

        let out = dir.path().join("out");
        feed.write_to_path(&out).unwrap();
        let reloaded = GtfsFeed::from_path(&out).unwrap();

        assert_eq!(feed.agency_count().unwrap(), reloaded.agency_count().unwrap());
        assert_eq!(feed.stop_count().unwrap(), reloaded.stop_count().unwrap());
        assert_eq!(feed.route_count().unwrap(), reloaded.route_count().unwrap());
        assert_eq!(feed.trip_count().unwrap(), reloaded.trip_count().unwrap());
        assert_eq!(
            feed.stop_time_count().unwrap(),
            reloaded.stop_time_count().unwrap()
        );

        let stop_ids = |feed: &GtfsFeed| -> FxHashSet<String> {
            feed.stops().unwrap().iter().map(|s| s.id.clone()).collect()
        };
        assert_eq!(stop_ids(&feed), stop_ids(&reloaded));
        let trip_ids = |feed: &GtfsFeed| -> FxHashSet<String> {
            feed.trips().unwrap().iter().map(|t| t.id.clone()).collect()
        };
        assert_eq!(trip_ids(&feed), trip_ids(&reloaded));
        let service_ids = |feed: &GtfsFeed| -> FxHashSet<String> {
            feed.calendars()
                .unwrap()
                .iter()
                .map(|c| c.service_id.clone())
                .collect()
        };
        assert_eq!(service_ids(&feed), service_ids(&reloaded));
    }

    #[test]
    fn zip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let feed = sample_feed();
        let archive_path = dir.path().join("feed.zip");
        feed.write_to_zip_path(&archive_path).unwrap();

        let reloaded = GtfsFeed::from_path(&archive_path).unwrap();
        assert_eq!(5, reloaded.trip_count().unwrap());
        assert_eq!(16, reloaded.stop_time_count().unwrap());
        assert_eq!(1, reloaded.shapes().unwrap().len());

        let lazy = LazyGtfsFeed::from_path(&archive_path).unwrap();
        assert_eq!(16, lazy.stop_time_count().unwrap());
    }

    #[test]
    fn lazy_feed_counts_without_parsing() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_feed(dir.path());
        let lazy = LazyGtfsFeed::from_path(dir.path()).unwrap();

        // Counts come from a line count before any table is parsed.
        assert_eq!(2, lazy.agency_count().unwrap());
        assert_eq!(5, lazy.stop_count().unwrap());
        assert_eq!(3, lazy.route_count().unwrap());
        assert_eq!(5, lazy.trip_count().unwrap());
        assert_eq!(16, lazy.stop_time_count().unwrap());
    }

    #[test]
    fn lazy_and_eager_answer_equally() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_feed(dir.path());
        let eager = GtfsFeed::from_path(dir.path()).unwrap();
        let lazy = LazyGtfsFeed::from_path(dir.path()).unwrap();

        assert_eq!(eager.agencies().unwrap(), lazy.agencies().unwrap());
        assert_eq!(eager.stops().unwrap(), lazy.stops().unwrap());
        assert_eq!(eager.routes().unwrap(), lazy.routes().unwrap());
        assert_eq!(eager.trips().unwrap(), lazy.trips().unwrap());
        assert_eq!(eager.stop_times().unwrap(), lazy.stop_times().unwrap());
        assert_eq!(eager.calendars().unwrap(), lazy.calendars().unwrap());
        assert_eq!(eager.calendar_dates().unwrap(), lazy.calendar_dates().unwrap());
        assert_eq!(eager.shapes().unwrap(), lazy.shapes().unwrap());
        assert_eq!(eager.agency_count().unwrap(), lazy.agency_count().unwrap());
        assert_eq!(
            eager.stop_time_count().unwrap(),
            lazy.stop_time_count().unwrap()
        );

        let eager_filter = GtfsFilter::new(&eager);
        let lazy_filter = GtfsFilter::new(&lazy);
        assert_eq!(
            eager_filter.trips_for_route("route_1").unwrap(),
            lazy_filter.trips_for_route("route_1").unwrap()
        );
        assert_eq!(
            eager_filter.stop_times_for_trip("trip_1").unwrap(),
            lazy_filter.stop_times_for_trip("trip_1").unwrap()
        );
        assert_eq!(
            eager_filter
                .active_services_on("2025-01-06")
                .unwrap()
                .len(),
            lazy_filter.active_services_on("2025-01-06").unwrap().len()
        );
    }

    #[test]
    fn lazy_feed_materializes_to_eager() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_feed(dir.path());
        let lazy = LazyGtfsFeed::from_path(dir.path()).unwrap();
        let feed = lazy.materialize().unwrap();
        assert_eq!(2, feed.agency_count().unwrap());
        assert_eq!(5, feed.stop_count().unwrap());
        assert_eq!(3, feed.route_count().unwrap());
    }

    #[test]
    fn repeated_access_returns_the_same_data() {
        let feed = sample_feed();
        let first: Vec<String> = feed.agencies().unwrap().iter().map(|a| a.id.clone()).collect();
        let second: Vec<String> = feed.agencies().unwrap().iter().map(|a| a.id.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn frequencies_and_feed_info_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_feed(dir.path());
        std::fs::write(
            dir.path().join("frequencies.txt"),
            "trip_id,start_time,end_time,headway_secs\ntrip_1,06:00:00,09:00:00,600\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("feed_info.txt"),
            "feed_publisher_name,feed_publisher_url,feed_lang\nSample,https://example.com,en\n",
        )
        .unwrap();

        let feed = GtfsFeed::from_path(dir.path()).unwrap();
        assert_eq!(1, feed.frequencies().unwrap().len());
        assert_eq!(600, feed.frequencies().unwrap()[0].headway_secs);
        assert_eq!(1, feed.feed_info().unwrap().len());

        let out = dir.path().join("out");
        feed.write_to_path(&out).unwrap();
        let reloaded = GtfsFeed::from_path(&out).unwrap();
        assert_eq!(1, reloaded.frequencies().unwrap().len());
        assert_eq!("Sample", reloaded.feed_info().unwrap()[0].feed_publisher_name);
    }

    #[test]
    fn validation_flags_dangling_references() {
        let mut feed = sample_feed();
        feed.trips.push(Trip {
            route_id: "missing_route".into(),
            service_id: "weekday".into(),
            id: "trip_6".into(),
            ..Trip::default()
        });
        match feed.validate() {
            Err(TransitParserError::Gtfs(GtfsError::Validation { errors, .. })) => {
                assert!(errors.iter().any(|error| error.contains("missing_route")));
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
