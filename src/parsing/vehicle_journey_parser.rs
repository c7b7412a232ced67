/// # VehicleJourneys
///
/// One `VehicleJourney` per scheduled departure. Recognized fields:
/// `VehicleJourneyCode`, `DepartureTime`, `JourneyPatternRef`, `ServiceRef`,
/// `LineRef`, `OperatorRef`, an overriding `OperatingProfile`, and
/// `StartDeadRun`/`EndDeadRun` positioning markers. A journey with a
/// missing or unparseable departure time is skipped: without it no stop
/// time can be derived.
use std::io::BufRead;

use crate::{
    error::TxcError,
    models::VehicleJourney,
    parsing::helpers::{parse_clock_time, read_text, skip_element},
    parsing::operating_profile_parser,
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<Vec<VehicleJourney>, TxcError> {
    let mut journeys = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "VehicleJourney" => {
                    if let Some(journey) = parse_journey(reader, warnings)? {
                        journeys.push(journey);
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(journeys)
}

fn parse_journey<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<Option<VehicleJourney>, TxcError> {
    let mut journey = VehicleJourney::default();
    let mut departure_time = None;

    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "VehicleJourneyCode" => journey.set_code(read_text(reader)?.trim().to_string()),
                "DepartureTime" => {
                    let text = read_text(reader)?;
                    departure_time = parse_clock_time(&text);
                    if departure_time.is_none() {
                        warnings.push(format!("unparseable departure time {text:?}"));
                    }
                }
                "JourneyPatternRef" => {
                    journey.set_journey_pattern_ref(read_text(reader)?.trim().to_string());
                }
                "ServiceRef" => journey.set_service_ref(read_text(reader)?.trim().to_string()),
                "LineRef" => journey.set_line_ref(read_text(reader)?.trim().to_string()),
                "OperatorRef" => journey.set_operator_ref(read_text(reader)?.trim().to_string()),
                "OperatingProfile" => {
                    journey
                        .set_operating_profile(operating_profile_parser::parse(reader, warnings)?);
                }
                "StartDeadRun" => {
                    journey.set_start_dead_run(true);
                    skip_element(reader)?;
                }
                "EndDeadRun" => {
                    journey.set_end_dead_run(true);
                    skip_element(reader)?;
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }

    let Some(departure_time) = departure_time else {
        warnings.push(format!(
            "vehicle journey {:?} without a valid departure time was skipped",
            journey.code()
        ));
        return Ok(None);
    };
    journey.set_departure_time(departure_time);
    Ok(Some(journey))
}
