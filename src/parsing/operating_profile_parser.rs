/// # OperatingProfile
///
/// Shared by `Service` and `VehicleJourney` (a journey profile overrides its
/// service's). Recognized content:
///
/// - `RegularDayType/DaysOfWeek` with combined (`MondayToFriday`,
///   `MondayToSaturday`, `MondayToSunday`, `Weekend`) or individual day
///   elements, or `RegularDayType/HolidaysOnly`
/// - `BankHolidayOperation/DaysOfOperation|DaysOfNonOperation` with named
///   bank-holiday elements
/// - `SpecialDaysOperation/DaysOfOperation|DaysOfNonOperation` with
///   `DateRange` children
/// - `ServicedOrganisationDayType`: refs are collected but not expanded
use std::io::BufRead;
use std::str::FromStr;

use chrono::Weekday;

use crate::{
    error::TxcError,
    models::{
        BankHolidayName, BankHolidayOperation, DateRange, OperatingProfile, RegularDayType,
        SpecialDaysOperation,
    },
    parsing::helpers::{parse_date, read_text, skip_element},
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<OperatingProfile, TxcError> {
    let mut profile = OperatingProfile::default();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "RegularDayType" => {
                    profile.set_regular_day_type(parse_regular_day_type(reader, warnings)?);
                }
                "BankHolidayOperation" => {
                    profile.set_bank_holiday_operation(parse_bank_holidays(reader)?);
                }
                "SpecialDaysOperation" => {
                    profile.set_special_days_operation(parse_special_days(reader, warnings)?);
                }
                "ServicedOrganisationDayType" => {
                    for organisation_ref in collect_organisation_refs(reader)? {
                        profile.add_serviced_organisation_ref(organisation_ref);
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(profile)
}

fn parse_regular_day_type<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<RegularDayType, TxcError> {
    let mut day_type = RegularDayType::Any;
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "DaysOfWeek" => day_type = parse_days_of_week(reader, warnings)?,
                "HolidaysOnly" => {
                    day_type = RegularDayType::HolidaysOnly;
                    skip_element(reader)?;
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(day_type)
}

fn parse_days_of_week<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<RegularDayType, TxcError> {
    let mut combined = None;
    let mut days: Vec<Weekday> = Vec::new();

    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => {
                match name.as_str() {
                    "MondayToFriday" => combined = Some(RegularDayType::MondayToFriday),
                    "MondayToSaturday" => combined = Some(RegularDayType::MondayToSaturday),
                    "MondayToSunday" | "Everyday" => combined = Some(RegularDayType::Any),
                    "Weekend" => combined = Some(RegularDayType::Weekend),
                    "Monday" => days.push(Weekday::Mon),
                    "Tuesday" => days.push(Weekday::Tue),
                    "Wednesday" => days.push(Weekday::Wed),
                    "Thursday" => days.push(Weekday::Thu),
                    "Friday" => days.push(Weekday::Fri),
                    "Saturday" => days.push(Weekday::Sat),
                    "Sunday" => days.push(Weekday::Sun),
                    other => {
                        warnings.push(format!("unknown day element {other:?} was ignored"));
                    }
                }
                skip_element(reader)?;
            }
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }

    if let Some(day_type) = combined {
        return Ok(day_type);
    }
    if days.is_empty() {
        return Ok(RegularDayType::Any);
    }
    days.sort_by_key(|day| day.num_days_from_monday());
    days.dedup();
    Ok(RegularDayType::Days(days))
}

fn parse_bank_holidays<R: BufRead>(
    reader: &mut XmlReader<R>,
) -> Result<BankHolidayOperation, TxcError> {
    let mut operation = BankHolidayOperation::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "DaysOfOperation" => {
                    for holiday in parse_bank_holiday_names(reader)? {
                        operation.add_day_of_operation(holiday);
                    }
                }
                "DaysOfNonOperation" => {
                    for holiday in parse_bank_holiday_names(reader)? {
                        operation.add_day_of_non_operation(holiday);
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(operation)
}

fn parse_bank_holiday_names<R: BufRead>(
    reader: &mut XmlReader<R>,
) -> Result<Vec<BankHolidayName>, TxcError> {
    let mut holidays = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => {
                // The strum default variant keeps unknown spellings verbatim.
                if let Ok(holiday) = BankHolidayName::from_str(&name) {
                    holidays.push(holiday);
                }
                skip_element(reader)?;
            }
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(holidays)
}

fn parse_special_days<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<SpecialDaysOperation, TxcError> {
    let mut operation = SpecialDaysOperation::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "DaysOfOperation" => {
                    for range in parse_date_ranges(reader, warnings)? {
                        operation.add_day_of_operation(range);
                    }
                }
                "DaysOfNonOperation" => {
                    for range in parse_date_ranges(reader, warnings)? {
                        operation.add_day_of_non_operation(range);
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(operation)
}

fn parse_date_ranges<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<Vec<DateRange>, TxcError> {
    let mut ranges = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "DateRange" => {
                    let mut start = None;
                    let mut end = None;
                    while let Some(inner) = reader.next_event()? {
                        match inner {
                            XmlEvent::Start { name, .. } => match name.as_str() {
                                "StartDate" => start = parse_date(&read_text(reader)?),
                                "EndDate" => end = parse_date(&read_text(reader)?),
                                _ => skip_element(reader)?,
                            },
                            XmlEvent::End { .. } => break,
                            XmlEvent::Text(_) => {}
                        }
                    }
                    match (start, end) {
                        // A single-day range may omit the end date.
                        (Some(start), end) => ranges.push(DateRange::new(start, end.unwrap_or(start))),
                        _ => warnings.push("date range without a start date was skipped".to_string()),
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(ranges)
}

fn collect_organisation_refs<R: BufRead>(
    reader: &mut XmlReader<R>,
) -> Result<Vec<String>, TxcError> {
    let mut refs = Vec::new();
    let mut depth = 0usize;
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => {
                if name == "ServicedOrganisationRef" {
                    refs.push(read_text(reader)?);
                } else {
                    depth += 1;
                }
            }
            XmlEvent::End { .. } => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            XmlEvent::Text(_) => {}
        }
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_profile(xml: &str) -> (OperatingProfile, Vec<String>) {
        let mut reader = XmlReader::from_bytes(xml.as_bytes());
        reader.next_event().unwrap(); // <OperatingProfile>
        let mut warnings = Vec::new();
        let profile = parse(&mut reader, &mut warnings).unwrap();
        (profile, warnings)
    }

    #[test]
    fn monday_to_friday() {
        let (profile, warnings) = parse_profile(
            "<OperatingProfile><RegularDayType><DaysOfWeek><MondayToFriday/></DaysOfWeek>\
             </RegularDayType></OperatingProfile>",
        );
        assert_eq!(&RegularDayType::MondayToFriday, profile.regular_day_type());
        assert!(warnings.is_empty());
    }

    #[test]
    fn individual_days_sorted_and_deduped() {
        let (profile, _) = parse_profile(
            "<OperatingProfile><RegularDayType><DaysOfWeek>\
             <Friday/><Monday/><Friday/><Wednesday/>\
             </DaysOfWeek></RegularDayType></OperatingProfile>",
        );
        assert_eq!(
            &RegularDayType::Days(vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]),
            profile.regular_day_type()
        );
    }

    #[test]
    fn holidays_only() {
        let (profile, _) = parse_profile(
            "<OperatingProfile><RegularDayType><HolidaysOnly/></RegularDayType>\
             </OperatingProfile>",
        );
        assert_eq!(&RegularDayType::HolidaysOnly, profile.regular_day_type());
    }

    #[test]
    fn empty_days_of_week_operates_daily() {
        let (profile, _) = parse_profile(
            "<OperatingProfile><RegularDayType><DaysOfWeek/></RegularDayType>\
             </OperatingProfile>",
        );
        assert_eq!(&RegularDayType::Any, profile.regular_day_type());
    }

    #[test]
    fn bank_holiday_operation() {
        let (profile, _) = parse_profile(
            "<OperatingProfile>\
             <RegularDayType><DaysOfWeek><MondayToFriday/></DaysOfWeek></RegularDayType>\
             <BankHolidayOperation>\
               <DaysOfOperation><GoodFriday/></DaysOfOperation>\
               <DaysOfNonOperation><ChristmasDay/><BoxingDay/></DaysOfNonOperation>\
             </BankHolidayOperation></OperatingProfile>",
        );
        let operation = profile.bank_holiday_operation().unwrap();
        assert_eq!(&[BankHolidayName::GoodFriday], operation.days_of_operation());
        assert_eq!(
            &[BankHolidayName::ChristmasDay, BankHolidayName::BoxingDay],
            operation.days_of_non_operation()
        );
    }

    #[test]
    fn special_days_with_single_day_range() {
        let (profile, _) = parse_profile(
            "<OperatingProfile><SpecialDaysOperation><DaysOfNonOperation>\
             <DateRange><StartDate>2025-12-25</StartDate><EndDate>2025-12-26</EndDate></DateRange>\
             <DateRange><StartDate>2026-01-01</StartDate></DateRange>\
             </DaysOfNonOperation></SpecialDaysOperation></OperatingProfile>",
        );
        let special = profile.special_days_operation().unwrap();
        assert_eq!(2, special.days_of_non_operation().len());
        let single = special.days_of_non_operation()[1];
        assert_eq!(single.start, single.end);
    }

    #[test]
    fn serviced_organisation_refs_are_collected() {
        let (profile, _) = parse_profile(
            "<OperatingProfile><ServicedOrganisationDayType><DaysOfOperation>\
             <WorkingDays><ServicedOrganisationRef>SCH1</ServicedOrganisationRef></WorkingDays>\
             </DaysOfOperation></ServicedOrganisationDayType></OperatingProfile>",
        );
        assert_eq!(&["SCH1".to_string()], profile.serviced_organisation_refs());
    }
}
