use chrono::NaiveDate;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two WGS84 points, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Formats seconds from midnight as `HH:MM:SS`. Hours may exceed 23 for
/// trips that run past midnight.
pub fn format_seconds(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

pub fn format_gtfs_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn parse_gtfs_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn haversine_bristol_to_bath() {
        // Bristol Temple Meads to Bath Spa, roughly 17.8 km apart.
        let km = haversine_km(51.4491, -2.5813, 51.3775, -2.3571);
        assert!((km - 17.8).abs() < 0.5, "got {km}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        assert_eq!(0.0, haversine_km(51.0, -2.0, 51.0, -2.0));
    }

    #[test]
    fn formats_times_past_midnight() {
        assert_eq!("08:05:00", format_seconds(8 * 3600 + 5 * 60));
        assert_eq!("25:30:09", format_seconds(25 * 3600 + 30 * 60 + 9));
    }

    #[test]
    fn gtfs_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!("20250106", format_gtfs_date(date));
        assert_eq!(Some(date), parse_gtfs_date("20250106"));
        assert_eq!(None, parse_gtfs_date("2025-01-06"));
    }
}
