use std::path::PathBuf;

use thiserror::Error;

use crate::conversion::{ConversionStats, ConversionWarning};

// ------------------------------------------------------------------------------------------------
// --- TransitParserError
// ------------------------------------------------------------------------------------------------

/// Root of the error taxonomy. Every fallible public operation returns this
/// type; callers can match on a whole category (`Gtfs`, `Txc`) or on a
/// specific variant inside it.
#[derive(Debug, Error)]
pub enum TransitParserError {
    #[error(transparent)]
    Gtfs(#[from] GtfsError),
    #[error(transparent)]
    Txc(#[from] TxcError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    CalendarConversion(#[from] CalendarConversionError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),
}

pub type TResult<T> = Result<T, TransitParserError>;

// ------------------------------------------------------------------------------------------------
// --- GtfsError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GtfsError {
    #[error("GTFS feed not found at {path}: missing {missing_files:?}")]
    FileNotFound {
        path: PathBuf,
        missing_files: Vec<String>,
    },
    #[error("{file_name}, line {line_number}, column \"{column}\": {reason}")]
    Parse {
        file_name: String,
        line_number: u64,
        column: String,
        reason: String,
    },
    #[error("GTFS validation failed: {errors:?}")]
    Validation {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
}

// ------------------------------------------------------------------------------------------------
// --- TxcError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TxcError {
    #[error("TXC document not found at {path}")]
    FileNotFound { path: PathBuf },
    #[error("{}: parse error at byte {}: {reason}", file_name.as_deref().unwrap_or("<string>"), byte_offset.unwrap_or(0))]
    Parse {
        file_name: Option<String>,
        byte_offset: Option<u64>,
        reason: String,
    },
    #[error("TXC validation failed: {errors:?}")]
    Validation {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// --- ConversionError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("conversion produced no usable output: {reason}")]
pub struct ConversionError {
    pub stats: ConversionStats,
    pub warnings: Vec<ConversionWarning>,
    pub reason: String,
}

// ------------------------------------------------------------------------------------------------
// --- MappingError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("cannot map {source_ref} to {target_kind}: {reason}")]
pub struct MappingError {
    pub source_ref: String,
    pub target_kind: String,
    pub reason: String,
}

// ------------------------------------------------------------------------------------------------
// --- CalendarConversionError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("cannot convert operating profile {profile_fingerprint}: {reason}")]
pub struct CalendarConversionError {
    pub profile_fingerprint: String,
    pub reason: String,
}

// ------------------------------------------------------------------------------------------------
// --- FilterError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("query {query} failed: {reason}")]
pub struct FilterError {
    pub query: String,
    pub reason: String,
}

// ------------------------------------------------------------------------------------------------
// --- InvalidDateError
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("invalid date {date_string:?}, expected {expected_format}")]
pub struct InvalidDateError {
    pub date_string: String,
    pub expected_format: String,
}

impl InvalidDateError {
    pub fn new(date_string: &str) -> Self {
        Self {
            date_string: date_string.to_string(),
            expected_format: "YYYY-MM-DD".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn categories_convert_to_the_root_error() {
        let err: TransitParserError = GtfsError::FileNotFound {
            path: PathBuf::from("/path/to/gtfs"),
            missing_files: vec!["agency.txt".into(), "stops.txt".into()],
        }
        .into();
        assert!(matches!(
            err,
            TransitParserError::Gtfs(GtfsError::FileNotFound { .. })
        ));

        let err: TransitParserError = TxcError::FileNotFound {
            path: PathBuf::from("/nonexistent/path"),
        }
        .into();
        assert!(matches!(err, TransitParserError::Txc(_)));

        let err: TransitParserError = MappingError {
            source_ref: "JP1".into(),
            target_kind: "trip".into(),
            reason: "pattern expands to no stops".into(),
        }
        .into();
        assert!(matches!(err, TransitParserError::Mapping(_)));

        let err: TransitParserError = CalendarConversionError {
            profile_fingerprint: "calendar_0a1b2c3d".into(),
            reason: "empty operating window".into(),
        }
        .into();
        assert!(matches!(err, TransitParserError::CalendarConversion(_)));

        let err: TransitParserError = FilterError {
            query: "trips_for_route".into(),
            reason: "feed has no trips table".into(),
        }
        .into();
        assert!(matches!(err, TransitParserError::Filter(_)));
    }

    #[test]
    fn invalid_date_carries_the_offending_string() {
        let err = InvalidDateError::new("not-a-valid-date");
        assert_eq!(err.date_string, "not-a-valid-date");
        assert!(err.expected_format.contains("YYYY-MM-DD"));
    }

    #[test]
    fn gtfs_parse_error_names_file_line_and_column() {
        let err = GtfsError::Parse {
            file_name: "stops.txt".into(),
            line_number: 42,
            column: "stop_lat".into(),
            reason: "invalid float literal".into(),
        };
        let text = err.to_string();
        assert!(text.contains("stops.txt"));
        assert!(text.contains("42"));
        assert!(text.contains("stop_lat"));
    }
}
