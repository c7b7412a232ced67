/// UK bank-holiday dates per region and year. Fixed-date holidays are
/// shifted to the following weekday when the UK observes a substitute day;
/// movable feasts derive from the Gregorian computus.
use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::BankHolidayName;

use super::converter::Region;

/// Easter Sunday by the anonymous Gregorian computus.
pub(crate) fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn first_monday(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let shift = (7 - first.weekday().num_days_from_monday()) % 7;
    first.checked_add_days(chrono::Days::new(u64::from(shift)))
}

fn last_monday(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_month.pred_opt()?;
    last.checked_sub_days(chrono::Days::new(u64::from(
        last.weekday().num_days_from_monday(),
    )))
}

/// Weekend holidays move to the following Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + chrono::Days::new(2),
        Weekday::Sun => date + chrono::Days::new(1),
        _ => date,
    }
}

fn new_years_day(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(observed)
}

/// Christmas and Boxing Day substitutes never collide: a weekend Christmas
/// observes on the 27th, a weekend Boxing Day on the 28th.
fn christmas_day(year: i32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year, 12, 25)?;
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => NaiveDate::from_ymd_opt(year, 12, 27),
        _ => Some(date),
    }
}

fn boxing_day(year: i32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year, 12, 26)?;
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => NaiveDate::from_ymd_opt(year, 12, 28),
        _ => Some(date),
    }
}

fn late_summer(year: i32, region: Region) -> Option<NaiveDate> {
    match region {
        Region::Scotland => first_monday(year, 8),
        _ => last_monday(year, 8),
    }
}

/// The region's full bank-holiday set for one year.
fn all_for_region(year: i32, region: Region) -> Vec<NaiveDate> {
    let easter = easter_sunday(year);
    let mut dates = vec![
        new_years_day(year),
        easter.map(|e| e - chrono::Days::new(2)), // Good Friday
        first_monday(year, 5),                    // Early May
        last_monday(year, 5),                     // Spring bank holiday
        late_summer(year, region),
        christmas_day(year),
        boxing_day(year),
    ];
    match region {
        Region::Scotland => {
            dates.push(NaiveDate::from_ymd_opt(year, 1, 2).map(observed));
            dates.push(NaiveDate::from_ymd_opt(year, 11, 30).map(observed)); // St Andrew's Day
        }
        Region::NorthernIreland => {
            dates.push(easter.map(|e| e + chrono::Days::new(1))); // Easter Monday
            dates.push(NaiveDate::from_ymd_opt(year, 3, 17).map(observed)); // St Patrick's Day
            dates.push(NaiveDate::from_ymd_opt(year, 7, 12).map(observed)); // Battle of the Boyne
        }
        _ => {
            dates.push(easter.map(|e| e + chrono::Days::new(1))); // Easter Monday
        }
    }
    let mut dates: Vec<NaiveDate> = dates.into_iter().flatten().collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Dates selected by one named bank-holiday element in one year. Explicit
/// names are honored whatever the region; the region only decides what the
/// aggregate names expand to. `Region::None` always yields nothing.
pub(crate) fn holiday_dates(name: &BankHolidayName, region: Region, year: i32) -> Vec<NaiveDate> {
    if region == Region::None {
        return Vec::new();
    }
    let easter = easter_sunday(year);
    let single = |date: Option<NaiveDate>| date.into_iter().collect::<Vec<_>>();
    match name {
        BankHolidayName::AllBankHolidays => all_for_region(year, region),
        BankHolidayName::AllHolidaysExceptChristmas => {
            let christmas: Vec<Option<NaiveDate>> = vec![christmas_day(year), boxing_day(year)];
            all_for_region(year, region)
                .into_iter()
                .filter(|date| !christmas.contains(&Some(*date)))
                .collect()
        }
        BankHolidayName::HolidayMondays => {
            let mut dates: Vec<NaiveDate> = [
                easter.map(|e| e + chrono::Days::new(1)),
                first_monday(year, 5),
                last_monday(year, 5),
                late_summer(year, region),
            ]
            .into_iter()
            .flatten()
            .collect();
            dates.sort_unstable();
            dates
        }
        BankHolidayName::Christmas => [christmas_day(year), boxing_day(year)]
            .into_iter()
            .flatten()
            .collect(),
        BankHolidayName::ChristmasDay => single(christmas_day(year)),
        BankHolidayName::ChristmasEve => single(NaiveDate::from_ymd_opt(year, 12, 24)),
        BankHolidayName::BoxingDay => single(boxing_day(year)),
        BankHolidayName::NewYearsDay => single(new_years_day(year)),
        BankHolidayName::NewYearsEve => single(NaiveDate::from_ymd_opt(year, 12, 31)),
        BankHolidayName::Jan2ndScotland => {
            single(NaiveDate::from_ymd_opt(year, 1, 2).map(observed))
        }
        BankHolidayName::GoodFriday => single(easter.map(|e| e - chrono::Days::new(2))),
        BankHolidayName::EasterMonday => single(easter.map(|e| e + chrono::Days::new(1))),
        BankHolidayName::MayDay => single(first_monday(year, 5)),
        BankHolidayName::SpringBank => single(last_monday(year, 5)),
        BankHolidayName::AugustBankHolidayScotland => single(first_monday(year, 8)),
        BankHolidayName::LateSummerBankHolidayNotScotland => single(last_monday(year, 8)),
        BankHolidayName::StAndrewsDay => {
            single(NaiveDate::from_ymd_opt(year, 11, 30).map(observed))
        }
        // Unknown names carry no date set; the caller records the warning.
        BankHolidayName::Other(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn easter_known_years() {
        assert_eq!(Some(ymd(2024, 3, 31)), easter_sunday(2024));
        assert_eq!(Some(ymd(2025, 4, 20)), easter_sunday(2025));
        assert_eq!(Some(ymd(2026, 4, 5)), easter_sunday(2026));
    }

    #[test]
    fn good_friday_and_easter_monday_2025() {
        assert_eq!(
            vec![ymd(2025, 4, 18)],
            holiday_dates(&BankHolidayName::GoodFriday, Region::England, 2025)
        );
        assert_eq!(
            vec![ymd(2025, 4, 21)],
            holiday_dates(&BankHolidayName::EasterMonday, Region::England, 2025)
        );
    }

    #[test]
    fn weekend_holidays_observe_the_following_weekday() {
        // 1 January 2022 was a Saturday; observed Monday 3 January.
        assert_eq!(
            vec![ymd(2022, 1, 3)],
            holiday_dates(&BankHolidayName::NewYearsDay, Region::England, 2022)
        );
        // Christmas 2021: Saturday, observed Monday 27th; Boxing Day
        // Sunday, observed Tuesday 28th.
        assert_eq!(
            vec![ymd(2021, 12, 27)],
            holiday_dates(&BankHolidayName::ChristmasDay, Region::England, 2021)
        );
        assert_eq!(
            vec![ymd(2021, 12, 28)],
            holiday_dates(&BankHolidayName::BoxingDay, Region::England, 2021)
        );
    }

    #[test]
    fn monday_holidays_2025() {
        assert_eq!(
            vec![ymd(2025, 5, 5)],
            holiday_dates(&BankHolidayName::MayDay, Region::England, 2025)
        );
        assert_eq!(
            vec![ymd(2025, 5, 26)],
            holiday_dates(&BankHolidayName::SpringBank, Region::England, 2025)
        );
        assert_eq!(
            vec![ymd(2025, 8, 25)],
            holiday_dates(
                &BankHolidayName::LateSummerBankHolidayNotScotland,
                Region::England,
                2025
            )
        );
        assert_eq!(
            vec![ymd(2025, 8, 4)],
            holiday_dates(
                &BankHolidayName::AugustBankHolidayScotland,
                Region::Scotland,
                2025
            )
        );
    }

    #[test]
    fn region_selects_the_aggregate_set() {
        let england = holiday_dates(&BankHolidayName::AllBankHolidays, Region::England, 2025);
        let scotland = holiday_dates(&BankHolidayName::AllBankHolidays, Region::Scotland, 2025);
        let northern_ireland = holiday_dates(
            &BankHolidayName::AllBankHolidays,
            Region::NorthernIreland,
            2025,
        );

        assert_eq!(8, england.len());
        // Scotland swaps Easter Monday for 2 January and St Andrew's Day.
        assert!(scotland.contains(&ymd(2025, 1, 2)));
        assert!(!scotland.contains(&ymd(2025, 4, 21)));
        assert!(northern_ireland.contains(&ymd(2025, 3, 17)));
        assert!(northern_ireland.contains(&ymd(2025, 7, 14))); // 12 July observed
    }

    #[test]
    fn null_region_expands_to_nothing() {
        assert!(holiday_dates(&BankHolidayName::AllBankHolidays, Region::None, 2025).is_empty());
    }
}
