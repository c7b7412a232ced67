/// # Services
///
/// One `Service` per registered service. Recognized fields: `ServiceCode`,
/// `Lines/Line` (id attribute + `LineName`), `OperatingPeriod`
/// (`StartDate`/`EndDate`), `OperatingProfile`, `RegisteredOperatorRef` /
/// `OperatorRef`, `Mode`, `Description`, and the `StandardService` block
/// with `Origin`, `Destination` and the `JourneyPattern` definitions.
///
/// Journey patterns are returned flattened: cross-references go through
/// their ids, never through back-pointers.
use std::io::BufRead;
use std::str::FromStr;

use crate::{
    error::TxcError,
    models::{Direction, JourneyPattern, Line, Service, TransportMode},
    parsing::helpers::{attribute, parse_date, read_text, skip_element},
    parsing::operating_profile_parser,
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<(Vec<Service>, Vec<JourneyPattern>), TxcError> {
    let mut services = Vec::new();
    let mut journey_patterns = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "Service" => {
                    let service = parse_service(reader, &mut journey_patterns, warnings)?;
                    services.push(service);
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok((services, journey_patterns))
}

fn parse_service<R: BufRead>(
    reader: &mut XmlReader<R>,
    journey_patterns: &mut Vec<JourneyPattern>,
    warnings: &mut Vec<String>,
) -> Result<Service, TxcError> {
    let mut service = Service::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "ServiceCode" => service.set_service_code(read_text(reader)?),
                "Lines" => parse_lines(reader, &mut service)?,
                "OperatingPeriod" => parse_operating_period(reader, &mut service, warnings)?,
                "OperatingProfile" => {
                    service.set_operating_profile(operating_profile_parser::parse(
                        reader, warnings,
                    )?);
                }
                "RegisteredOperatorRef" | "OperatorRef" => {
                    service.set_operator_ref(read_text(reader)?);
                }
                "Mode" => {
                    // from_str is infallible thanks to the Other variant.
                    if let Ok(mode) = TransportMode::from_str(read_text(reader)?.trim()) {
                        if let TransportMode::Other(raw) = &mode {
                            warnings.push(format!("unknown transport mode {raw:?}"));
                        }
                        service.set_mode(mode);
                    }
                }
                "Description" => service.set_description(read_text(reader)?.trim().to_string()),
                "StandardService" => {
                    parse_standard_service(reader, &mut service, journey_patterns, warnings)?;
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(service)
}

fn parse_lines<R: BufRead>(
    reader: &mut XmlReader<R>,
    service: &mut Service,
) -> Result<(), TxcError> {
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "Line" => {
                    let id = attribute(&attributes, "id").unwrap_or_default();
                    let mut line_name = String::new();
                    while let Some(inner) = reader.next_event()? {
                        match inner {
                            XmlEvent::Start { name, .. } => match name.as_str() {
                                "LineName" => line_name = read_text(reader)?,
                                _ => skip_element(reader)?,
                            },
                            XmlEvent::End { .. } => break,
                            XmlEvent::Text(_) => {}
                        }
                    }
                    service.add_line(Line::new(id, line_name));
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(())
}

fn parse_operating_period<R: BufRead>(
    reader: &mut XmlReader<R>,
    service: &mut Service,
    warnings: &mut Vec<String>,
) -> Result<(), TxcError> {
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "StartDate" => {
                    let text = read_text(reader)?;
                    match parse_date(&text) {
                        Some(date) => service.set_start_date(date),
                        None => warnings.push(format!("unparseable service start date {text:?}")),
                    }
                }
                "EndDate" => {
                    let text = read_text(reader)?;
                    match parse_date(&text) {
                        Some(date) => service.set_end_date(date),
                        None => warnings.push(format!("unparseable service end date {text:?}")),
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(())
}

fn parse_standard_service<R: BufRead>(
    reader: &mut XmlReader<R>,
    service: &mut Service,
    journey_patterns: &mut Vec<JourneyPattern>,
    warnings: &mut Vec<String>,
) -> Result<(), TxcError> {
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "Origin" => service.set_origin(read_text(reader)?),
                "Destination" => service.set_destination(read_text(reader)?),
                "JourneyPattern" => {
                    journey_patterns.push(parse_journey_pattern(reader, &attributes, warnings)?);
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(())
}

fn parse_journey_pattern<R: BufRead>(
    reader: &mut XmlReader<R>,
    attributes: &[(String, String)],
    warnings: &mut Vec<String>,
) -> Result<JourneyPattern, TxcError> {
    let id = attribute(attributes, "id").unwrap_or_default();
    if id.is_empty() {
        warnings.push("journey pattern without an id".to_string());
    }
    let mut pattern = JourneyPattern::new(id);
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "DestinationDisplay" => {
                    pattern.set_destination_display(read_text(reader)?.trim().to_string());
                }
                "Direction" => {
                    if let Ok(direction) = Direction::from_str(read_text(reader)?.trim()) {
                        pattern.set_direction(direction);
                    }
                }
                "RouteRef" => pattern.set_route_ref(read_text(reader)?.trim().to_string()),
                "JourneyPatternSectionRefs" => {
                    pattern.add_section_ref(read_text(reader)?.trim().to_string());
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(pattern)
}
