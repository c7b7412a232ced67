/// Operating-profile to calendar expansion: weekday flags, the stable
/// service-id fingerprint, and calendar_dates rows for bank-holiday and
/// special-days operations.
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use sha1::{Digest, Sha1};

use crate::{
    gtfs::{Calendar, CalendarDate, ExceptionType},
    models::{OperatingProfile, RegularDayType},
};

use super::converter::{ConversionWarning, Region, WarningKind};

pub(crate) fn weekday_flags(day_type: &RegularDayType) -> [bool; 7] {
    match day_type {
        RegularDayType::MondayToFriday => [true, true, true, true, true, false, false],
        RegularDayType::MondayToSaturday => [true, true, true, true, true, true, false],
        RegularDayType::Weekend => [false, false, false, false, false, true, true],
        RegularDayType::Days(days) => {
            let mut flags = [false; 7];
            for day in days {
                flags[day.num_days_from_monday() as usize] = true;
            }
            flags
        }
        RegularDayType::Any => [true; 7],
        RegularDayType::HolidaysOnly => [false; 7],
    }
}

/// Canonical encoding of everything that distinguishes one calendar from
/// another. Equal profiles over equal windows collapse to one service_id.
pub(crate) fn profile_fingerprint(
    profile: &OperatingProfile,
    start_date: NaiveDate,
    end_date: NaiveDate,
    region: Region,
) -> String {
    let flags = weekday_flags(profile.regular_day_type());
    let days: String = flags.iter().map(|&flag| if flag { '1' } else { '0' }).collect();

    let mut bank_operation: Vec<String> = Vec::new();
    let mut bank_non_operation: Vec<String> = Vec::new();
    if let Some(operation) = profile.bank_holiday_operation() {
        bank_operation = operation
            .days_of_operation()
            .iter()
            .map(ToString::to_string)
            .collect();
        bank_non_operation = operation
            .days_of_non_operation()
            .iter()
            .map(ToString::to_string)
            .collect();
        bank_operation.sort_unstable();
        bank_non_operation.sort_unstable();
    }

    let mut special_operation: Vec<String> = Vec::new();
    let mut special_non_operation: Vec<String> = Vec::new();
    if let Some(operation) = profile.special_days_operation() {
        special_operation = operation
            .days_of_operation()
            .iter()
            .map(|range| format!("{}..{}", range.start, range.end))
            .collect();
        special_non_operation = operation
            .days_of_non_operation()
            .iter()
            .map(|range| format!("{}..{}", range.start, range.end))
            .collect();
        special_operation.sort_unstable();
        special_non_operation.sort_unstable();
    }

    format!(
        "days={days};window={start_date}..{end_date};region={region};\
         bh+={bank_operation:?};bh-={bank_non_operation:?};\
         sd+={special_operation:?};sd-={special_non_operation:?}"
    )
}

/// First eight hex characters of the SHA-1 of the input.
pub(crate) fn short_digest(input: &str) -> String {
    let digest = Sha1::digest(input.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}

pub(crate) fn service_id_for(fingerprint: &str) -> String {
    format!("calendar_{}", short_digest(fingerprint))
}

/// The calendar row plus its exception rows for one profile over one
/// service window. Special days override bank holidays, and removals
/// override additions on the same date.
pub(crate) fn build_calendar(
    service_id: &str,
    profile: &OperatingProfile,
    start_date: NaiveDate,
    end_date: NaiveDate,
    region: Region,
    warnings: &mut Vec<ConversionWarning>,
) -> (Calendar, Vec<CalendarDate>) {
    let flags = weekday_flags(profile.regular_day_type());
    let calendar = Calendar {
        service_id: service_id.to_string(),
        monday: flags[0],
        tuesday: flags[1],
        wednesday: flags[2],
        thursday: flags[3],
        friday: flags[4],
        saturday: flags[5],
        sunday: flags[6],
        start_date,
        end_date,
    };

    let mut exceptions: BTreeMap<NaiveDate, ExceptionType> = BTreeMap::new();
    let in_window = |date: &NaiveDate| *date >= start_date && *date <= end_date;

    if let Some(operation) = profile.bank_holiday_operation() {
        if region == Region::None && !operation.is_empty() {
            warnings.push(ConversionWarning::new(
                WarningKind::Unsupported,
                "operating_profile",
                service_id,
                "bank-holiday operation ignored: no region selected",
            ));
        }
        for year in start_date.year()..=end_date.year() {
            for name in operation.days_of_operation() {
                for date in super::bank_holidays::holiday_dates(name, region, year) {
                    if in_window(&date) {
                        exceptions.insert(date, ExceptionType::Added);
                    }
                }
            }
        }
        for year in start_date.year()..=end_date.year() {
            for name in operation.days_of_non_operation() {
                for date in super::bank_holidays::holiday_dates(name, region, year) {
                    if in_window(&date) {
                        exceptions.insert(date, ExceptionType::Removed);
                    }
                }
            }
        }
        for name in operation
            .days_of_operation()
            .iter()
            .chain(operation.days_of_non_operation())
        {
            if let crate::models::BankHolidayName::Other(raw) = name {
                warnings.push(ConversionWarning::new(
                    WarningKind::UnknownValue,
                    "operating_profile",
                    service_id,
                    &format!("unknown bank holiday {raw:?}"),
                ));
            }
        }
    }

    if let Some(operation) = profile.special_days_operation() {
        for range in operation.days_of_operation() {
            for date in range.iter().filter(in_window) {
                exceptions.insert(date, ExceptionType::Added);
            }
        }
        for range in operation.days_of_non_operation() {
            for date in range.iter().filter(in_window) {
                exceptions.insert(date, ExceptionType::Removed);
            }
        }
    }

    if !profile.serviced_organisation_refs().is_empty() {
        warnings.push(ConversionWarning::new(
            WarningKind::Unsupported,
            "operating_profile",
            service_id,
            "serviced organisation day types are not expanded",
        ));
    }

    if *profile.regular_day_type() == RegularDayType::HolidaysOnly
        && !exceptions.values().any(|e| *e == ExceptionType::Added)
    {
        warnings.push(ConversionWarning::new(
            WarningKind::MissingValue,
            "operating_profile",
            service_id,
            "holidays-only profile has no operating dates",
        ));
    }

    let calendar_dates = exceptions
        .into_iter()
        .map(|(date, exception_type)| CalendarDate {
            service_id: service_id.to_string(),
            date,
            exception_type,
        })
        .collect();

    (calendar, calendar_dates)
}
