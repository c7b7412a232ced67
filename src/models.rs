use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

// ------------------------------------------------------------------------------------------------
// --- Operator
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Operator {
    id: String,
    code: String,
    short_name: String,
    trading_name: Option<String>,
    license_number: Option<String>,
}

impl Operator {
    pub fn new(id: String) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, value: String) {
        self.code = value;
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn set_short_name(&mut self, value: String) {
        self.short_name = value;
    }

    pub fn trading_name(&self) -> Option<&str> {
        self.trading_name.as_deref()
    }

    pub fn set_trading_name(&mut self, value: String) {
        self.trading_name = Some(value);
    }

    pub fn license_number(&self) -> Option<&str> {
        self.license_number.as_deref()
    }

    pub fn set_license_number(&mut self, value: String) {
        self.license_number = Some(value);
    }

    // Functions

    /// Display name: short name, falling back to trading name, then code.
    pub fn display_name(&self) -> &str {
        if !self.short_name.is_empty() {
            &self.short_name
        } else if let Some(trading_name) = self.trading_name() {
            trading_name
        } else {
            &self.code
        }
    }
}

// ------------------------------------------------------------------------------------------------
// --- StopPoint
// ------------------------------------------------------------------------------------------------

/// A stop referenced by its national ATCO code, e.g. `0100BRP90310`.
/// Coordinates may be absent.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StopPoint {
    atco_code: String,
    common_name: Option<String>,
    locality: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    stop_type: Option<String>,
}

impl StopPoint {
    pub fn new(atco_code: String) -> Self {
        Self {
            atco_code,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn atco_code(&self) -> &str {
        &self.atco_code
    }

    pub fn set_atco_code(&mut self, value: String) {
        self.atco_code = value;
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn set_common_name(&mut self, value: String) {
        self.common_name = Some(value);
    }

    pub fn locality(&self) -> Option<&str> {
        self.locality.as_deref()
    }

    pub fn set_locality(&mut self, value: String) {
        self.locality = Some(value);
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    pub fn set_longitude(&mut self, value: f64) {
        self.longitude = Some(value);
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn set_latitude(&mut self, value: f64) {
        self.latitude = Some(value);
    }

    pub fn stop_type(&self) -> Option<&str> {
        self.stop_type.as_deref()
    }

    pub fn set_stop_type(&mut self, value: String) {
        self.stop_type = Some(value);
    }
}

// ------------------------------------------------------------------------------------------------
// --- Line
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Line {
    id: String,
    name: String,
}

impl Line {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ------------------------------------------------------------------------------------------------
// --- TransportMode
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Display, EnumString, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMode {
    #[default]
    #[strum(serialize = "bus")]
    Bus,

    #[strum(serialize = "coach")]
    Coach,

    #[strum(serialize = "ferry")]
    Ferry,

    #[strum(serialize = "metro")]
    Metro,

    #[strum(serialize = "rail")]
    Rail,

    #[strum(serialize = "tram")]
    Tram,

    #[strum(serialize = "trolleyBus")]
    TrolleyBus,

    #[strum(serialize = "underground")]
    Underground,

    #[strum(default)]
    Other(String),
}

// ------------------------------------------------------------------------------------------------
// --- Service
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Service {
    service_code: String,
    lines: Vec<Line>,
    operator_ref: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    mode: TransportMode,
    description: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    operating_profile: OperatingProfile,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    // Getters/Setters

    pub fn service_code(&self) -> &str {
        &self.service_code
    }

    pub fn set_service_code(&mut self, value: String) {
        self.service_code = value;
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn add_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn operator_ref(&self) -> &str {
        &self.operator_ref
    }

    pub fn set_operator_ref(&mut self, value: String) {
        self.operator_ref = value;
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn set_start_date(&mut self, value: NaiveDate) {
        self.start_date = Some(value);
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn set_end_date(&mut self, value: NaiveDate) {
        self.end_date = Some(value);
    }

    pub fn mode(&self) -> &TransportMode {
        &self.mode
    }

    pub fn set_mode(&mut self, value: TransportMode) {
        self.mode = value;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, value: String) {
        self.description = Some(value);
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn set_origin(&mut self, value: String) {
        self.origin = Some(value);
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn set_destination(&mut self, value: String) {
        self.destination = Some(value);
    }

    pub fn operating_profile(&self) -> &OperatingProfile {
        &self.operating_profile
    }

    pub fn set_operating_profile(&mut self, value: OperatingProfile) {
        self.operating_profile = value;
    }
}

// ------------------------------------------------------------------------------------------------
// --- Direction
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Display, EnumString, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[strum(serialize = "outbound")]
    Outbound,

    #[strum(serialize = "inbound")]
    Inbound,

    #[strum(default)]
    Other(String),
}

// ------------------------------------------------------------------------------------------------
// --- JourneyPattern
// ------------------------------------------------------------------------------------------------

/// Expansion of the section refs, in order, yields the pattern's full stop
/// sequence.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct JourneyPattern {
    id: String,
    section_refs: Vec<String>,
    direction: Direction,
    route_ref: Option<String>,
    destination_display: Option<String>,
}

impl JourneyPattern {
    pub fn new(id: String) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn section_refs(&self) -> &[String] {
        &self.section_refs
    }

    pub fn add_section_ref(&mut self, value: String) {
        self.section_refs.push(value);
    }

    pub fn direction(&self) -> &Direction {
        &self.direction
    }

    pub fn set_direction(&mut self, value: Direction) {
        self.direction = value;
    }

    pub fn route_ref(&self) -> Option<&str> {
        self.route_ref.as_deref()
    }

    pub fn set_route_ref(&mut self, value: String) {
        self.route_ref = Some(value);
    }

    pub fn destination_display(&self) -> Option<&str> {
        self.destination_display.as_deref()
    }

    pub fn set_destination_display(&mut self, value: String) {
        self.destination_display = Some(value);
    }
}

// ------------------------------------------------------------------------------------------------
// --- JourneyPatternSection
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct JourneyPatternSection {
    id: String,
    timing_links: Vec<TimingLink>,
}

impl JourneyPatternSection {
    pub fn new(id: String) -> Self {
        Self {
            id,
            timing_links: Vec::new(),
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timing_links(&self) -> &[TimingLink] {
        &self.timing_links
    }

    pub fn add_timing_link(&mut self, link: TimingLink) {
        self.timing_links.push(link);
    }
}

// ------------------------------------------------------------------------------------------------
// --- TimingLink
// ------------------------------------------------------------------------------------------------

/// One stop-to-stop edge of a journey pattern. Run and wait times are in
/// seconds; wait times may be present on either endpoint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TimingLink {
    id: String,
    from_stop: String,
    to_stop: String,
    run_time: u32,
    from_wait_time: Option<u32>,
    to_wait_time: Option<u32>,
    from_timing_status: Option<String>,
    to_timing_status: Option<String>,
}

impl TimingLink {
    pub fn new(id: String) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from_stop(&self) -> &str {
        &self.from_stop
    }

    pub fn set_from_stop(&mut self, value: String) {
        self.from_stop = value;
    }

    pub fn to_stop(&self) -> &str {
        &self.to_stop
    }

    pub fn set_to_stop(&mut self, value: String) {
        self.to_stop = value;
    }

    pub fn run_time(&self) -> u32 {
        self.run_time
    }

    pub fn set_run_time(&mut self, value: u32) {
        self.run_time = value;
    }

    pub fn from_wait_time(&self) -> Option<u32> {
        self.from_wait_time
    }

    pub fn set_from_wait_time(&mut self, value: u32) {
        self.from_wait_time = Some(value);
    }

    pub fn to_wait_time(&self) -> Option<u32> {
        self.to_wait_time
    }

    pub fn set_to_wait_time(&mut self, value: u32) {
        self.to_wait_time = Some(value);
    }

    pub fn from_timing_status(&self) -> Option<&str> {
        self.from_timing_status.as_deref()
    }

    pub fn set_from_timing_status(&mut self, value: String) {
        self.from_timing_status = Some(value);
    }

    pub fn to_timing_status(&self) -> Option<&str> {
        self.to_timing_status.as_deref()
    }

    pub fn set_to_timing_status(&mut self, value: String) {
        self.to_timing_status = Some(value);
    }
}

// ------------------------------------------------------------------------------------------------
// --- VehicleJourney
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct VehicleJourney {
    code: String,
    departure_time: u32,
    journey_pattern_ref: Option<String>,
    service_ref: Option<String>,
    line_ref: Option<String>,
    operator_ref: Option<String>,
    operating_profile: Option<OperatingProfile>,
    start_dead_run: bool,
    end_dead_run: bool,
}

impl VehicleJourney {
    pub fn new(code: String) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, value: String) {
        self.code = value;
    }

    /// Departure from the first stop, in seconds from midnight.
    pub fn departure_time(&self) -> u32 {
        self.departure_time
    }

    pub fn set_departure_time(&mut self, value: u32) {
        self.departure_time = value;
    }

    pub fn journey_pattern_ref(&self) -> Option<&str> {
        self.journey_pattern_ref.as_deref()
    }

    pub fn set_journey_pattern_ref(&mut self, value: String) {
        self.journey_pattern_ref = Some(value);
    }

    pub fn service_ref(&self) -> Option<&str> {
        self.service_ref.as_deref()
    }

    pub fn set_service_ref(&mut self, value: String) {
        self.service_ref = Some(value);
    }

    pub fn line_ref(&self) -> Option<&str> {
        self.line_ref.as_deref()
    }

    pub fn set_line_ref(&mut self, value: String) {
        self.line_ref = Some(value);
    }

    pub fn operator_ref(&self) -> Option<&str> {
        self.operator_ref.as_deref()
    }

    pub fn set_operator_ref(&mut self, value: String) {
        self.operator_ref = Some(value);
    }

    pub fn operating_profile(&self) -> Option<&OperatingProfile> {
        self.operating_profile.as_ref()
    }

    pub fn set_operating_profile(&mut self, value: OperatingProfile) {
        self.operating_profile = Some(value);
    }

    pub fn start_dead_run(&self) -> bool {
        self.start_dead_run
    }

    pub fn set_start_dead_run(&mut self, value: bool) {
        self.start_dead_run = value;
    }

    pub fn end_dead_run(&self) -> bool {
        self.end_dead_run
    }

    pub fn set_end_dead_run(&mut self, value: bool) {
        self.end_dead_run = value;
    }
}

// ------------------------------------------------------------------------------------------------
// --- RegularDayType
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegularDayType {
    MondayToFriday,
    MondayToSaturday,
    Weekend,
    /// An explicit set of individual days.
    Days(Vec<Weekday>),
    /// Operates every day of the week.
    #[default]
    Any,
    HolidaysOnly,
}

// ------------------------------------------------------------------------------------------------
// --- BankHolidayName
// ------------------------------------------------------------------------------------------------

/// Named bank-holiday selectors as they appear in operating profiles. The
/// spellings are the element names of the source format.
#[derive(Clone, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankHolidayName {
    AllBankHolidays,
    AllHolidaysExceptChristmas,
    HolidayMondays,
    Christmas,
    ChristmasDay,
    ChristmasEve,
    BoxingDay,
    NewYearsDay,
    NewYearsEve,
    Jan2ndScotland,
    GoodFriday,
    EasterMonday,
    MayDay,
    SpringBank,
    AugustBankHolidayScotland,
    LateSummerBankHolidayNotScotland,
    StAndrewsDay,

    #[strum(default)]
    Other(String),
}

// ------------------------------------------------------------------------------------------------
// --- BankHolidayOperation
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankHolidayOperation {
    days_of_operation: Vec<BankHolidayName>,
    days_of_non_operation: Vec<BankHolidayName>,
}

impl BankHolidayOperation {
    pub fn new() -> Self {
        Self::default()
    }

    // Getters/Setters

    pub fn days_of_operation(&self) -> &[BankHolidayName] {
        &self.days_of_operation
    }

    pub fn add_day_of_operation(&mut self, value: BankHolidayName) {
        self.days_of_operation.push(value);
    }

    pub fn days_of_non_operation(&self) -> &[BankHolidayName] {
        &self.days_of_non_operation
    }

    pub fn add_day_of_non_operation(&mut self, value: BankHolidayName) {
        self.days_of_non_operation.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.days_of_operation.is_empty() && self.days_of_non_operation.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// --- DateRange
// ------------------------------------------------------------------------------------------------

/// Inclusive date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let mut current = Some(self.start);
        let end = self.end;
        std::iter::from_fn(move || {
            let date = current?;
            if date > end {
                return None;
            }
            current = date.succ_opt();
            Some(date)
        })
    }
}

// ------------------------------------------------------------------------------------------------
// --- SpecialDaysOperation
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDaysOperation {
    days_of_operation: Vec<DateRange>,
    days_of_non_operation: Vec<DateRange>,
}

impl SpecialDaysOperation {
    pub fn new() -> Self {
        Self::default()
    }

    // Getters/Setters

    pub fn days_of_operation(&self) -> &[DateRange] {
        &self.days_of_operation
    }

    pub fn add_day_of_operation(&mut self, value: DateRange) {
        self.days_of_operation.push(value);
    }

    pub fn days_of_non_operation(&self) -> &[DateRange] {
        &self.days_of_non_operation
    }

    pub fn add_day_of_non_operation(&mut self, value: DateRange) {
        self.days_of_non_operation.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.days_of_operation.is_empty() && self.days_of_non_operation.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// --- OperatingProfile
// ------------------------------------------------------------------------------------------------

/// Rules describing which calendar dates a journey operates. Serviced
/// organisation day types are kept as opaque refs and not expanded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingProfile {
    regular_day_type: RegularDayType,
    bank_holiday_operation: Option<BankHolidayOperation>,
    special_days_operation: Option<SpecialDaysOperation>,
    serviced_organisation_refs: Vec<String>,
}

impl OperatingProfile {
    pub fn new(regular_day_type: RegularDayType) -> Self {
        Self {
            regular_day_type,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn regular_day_type(&self) -> &RegularDayType {
        &self.regular_day_type
    }

    pub fn set_regular_day_type(&mut self, value: RegularDayType) {
        self.regular_day_type = value;
    }

    pub fn bank_holiday_operation(&self) -> Option<&BankHolidayOperation> {
        self.bank_holiday_operation.as_ref()
    }

    pub fn set_bank_holiday_operation(&mut self, value: BankHolidayOperation) {
        self.bank_holiday_operation = Some(value);
    }

    pub fn special_days_operation(&self) -> Option<&SpecialDaysOperation> {
        self.special_days_operation.as_ref()
    }

    pub fn set_special_days_operation(&mut self, value: SpecialDaysOperation) {
        self.special_days_operation = Some(value);
    }

    pub fn serviced_organisation_refs(&self) -> &[String] {
        &self.serviced_organisation_refs
    }

    pub fn add_serviced_organisation_ref(&mut self, value: String) {
        self.serviced_organisation_refs.push(value);
    }
}

// ------------------------------------------------------------------------------------------------
// --- Route
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Route {
    id: String,
    section_refs: Vec<String>,
}

impl Route {
    pub fn new(id: String) -> Self {
        Self {
            id,
            section_refs: Vec::new(),
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn section_refs(&self) -> &[String] {
        &self.section_refs
    }

    pub fn add_section_ref(&mut self, value: String) {
        self.section_refs.push(value);
    }
}

// ------------------------------------------------------------------------------------------------
// --- RouteSection
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RouteSection {
    id: String,
    links: Vec<RouteLink>,
}

impl RouteSection {
    pub fn new(id: String) -> Self {
        Self {
            id,
            links: Vec::new(),
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn links(&self) -> &[RouteLink] {
        &self.links
    }

    pub fn add_link(&mut self, link: RouteLink) {
        self.links.push(link);
    }
}

// ------------------------------------------------------------------------------------------------
// --- RouteLink
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RouteLink {
    id: String,
    from_stop: Option<String>,
    to_stop: Option<String>,
    distance: Option<f64>,
}

impl RouteLink {
    pub fn new(id: String) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    // Getters/Setters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from_stop(&self) -> Option<&str> {
        self.from_stop.as_deref()
    }

    pub fn set_from_stop(&mut self, value: String) {
        self.from_stop = Some(value);
    }

    pub fn to_stop(&self) -> Option<&str> {
        self.to_stop.as_deref()
    }

    pub fn set_to_stop(&mut self, value: String) {
        self.to_stop = Some(value);
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn set_distance(&mut self, value: f64) {
        self.distance = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn operator_display_name_fallback_chain() {
        let mut operator = Operator::new("OP1".into());
        operator.set_code("OP".into());
        assert_eq!("OP", operator.display_name());
        operator.set_trading_name("Sample Bus Ltd".into());
        assert_eq!("Sample Bus Ltd", operator.display_name());
        operator.set_short_name("Sample Bus".into());
        assert_eq!("Sample Bus", operator.display_name());
    }

    #[test]
    fn transport_mode_from_wire_spelling() {
        assert_eq!(TransportMode::Bus, TransportMode::from_str("bus").unwrap());
        assert_eq!(
            TransportMode::TrolleyBus,
            TransportMode::from_str("trolleyBus").unwrap()
        );
        assert_eq!(
            TransportMode::Other("hovercraft".into()),
            TransportMode::from_str("hovercraft").unwrap()
        );
    }

    #[test]
    fn bank_holiday_name_keeps_unknown_spellings() {
        assert_eq!(
            BankHolidayName::GoodFriday,
            BankHolidayName::from_str("GoodFriday").unwrap()
        );
        assert_eq!(
            BankHolidayName::Other("PlatinumJubilee".into()),
            BankHolidayName::from_str("PlatinumJubilee").unwrap()
        );
    }

    #[test]
    fn date_range_iterates_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 26).unwrap(),
        );
        let days: Vec<NaiveDate> = range.iter().collect();
        assert_eq!(3, days.len());
        assert_eq!(NaiveDate::from_ymd_opt(2025, 12, 26).unwrap(), days[2]);
    }
}
