/// Top-level document walk. Scans for the recognized collections, then runs
/// the cross-reference pass that drops entities with dangling refs.
use std::io::BufRead;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    error::TxcError,
    parsing::helpers::{attribute, skip_element},
    parsing::{
        journey_pattern_section_parser, operator_parser, route_parser, service_parser,
        stop_point_parser, vehicle_journey_parser,
    },
    txc::TxcDocument,
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(reader: &mut XmlReader<R>) -> Result<TxcDocument, TxcError> {
    let mut document = TxcDocument {
        filename: reader.file_name().map(str::to_string),
        ..TxcDocument::default()
    };
    let mut warnings = Vec::new();
    let mut seen_root = false;

    loop {
        let event = match reader.next_event() {
            Ok(event) => event,
            Err(error) if !seen_root => {
                // Input that never opened a recognized document parses as an
                // empty one; malformed XML inside a document is an error.
                log::warn!("treating unrecognizable XML input as empty: {error}");
                return Ok(document);
            }
            Err(error) => return Err(error),
        };
        let Some(event) = event else { break };
        let XmlEvent::Start { name, attributes } = event else {
            continue;
        };

        match name.as_str() {
            "TransXChange" => {
                seen_root = true;
                document.schema_version =
                    attribute(&attributes, "SchemaVersion").unwrap_or_default();
            }
            "Operators" | "NationalOperators" => {
                document.operators.extend(operator_parser::parse(reader)?);
            }
            "StopPoints" => {
                document
                    .stop_points
                    .extend(stop_point_parser::parse(reader, &mut warnings)?);
            }
            "RouteSections" => {
                document
                    .route_sections
                    .extend(route_parser::parse_route_sections(reader)?);
            }
            "Routes" => document.routes.extend(route_parser::parse_routes(reader)?),
            "Services" => {
                let (services, journey_patterns) = service_parser::parse(reader, &mut warnings)?;
                document.services.extend(services);
                document.journey_patterns.extend(journey_patterns);
            }
            "JourneyPatternSections" => {
                document
                    .journey_pattern_sections
                    .extend(journey_pattern_section_parser::parse(reader, &mut warnings)?);
            }
            "VehicleJourneys" => {
                document
                    .vehicle_journeys
                    .extend(vehicle_journey_parser::parse(reader, &mut warnings)?);
            }
            _ if seen_root => skip_element(reader)?,
            _ => {
                // Some other root entirely. Skip it; if it is not even
                // well-formed the document is treated as empty.
                if skip_element(reader).is_err() {
                    log::warn!("treating unrecognizable XML input as empty");
                    return Ok(document);
                }
            }
        }
    }

    link_references(&mut document, &mut warnings);
    document.warnings = warnings;
    Ok(document)
}

/// Converts textual refs into guarantees: after this pass every retained
/// journey pattern expands through existing sections and every retained
/// vehicle journey resolves its pattern, service, line and operator.
fn link_references(document: &mut TxcDocument, warnings: &mut Vec<String>) {
    let section_ids: FxHashSet<String> = document
        .journey_pattern_sections
        .iter()
        .map(|section| section.id().to_string())
        .collect();
    // Lines are owned by their declaring service, so a line ref only
    // resolves against the lines of the journey's own service.
    let lines_by_service: FxHashMap<String, FxHashSet<String>> = document
        .services
        .iter()
        .map(|service| {
            let lines = service
                .lines()
                .iter()
                .map(|line| line.id().to_string())
                .collect();
            (service.service_code().to_string(), lines)
        })
        .collect();
    let operator_ids: FxHashSet<String> = document
        .operators
        .iter()
        .map(|operator| operator.id().to_string())
        .collect();

    document.journey_patterns.retain(|pattern| {
        let dangling: Vec<&str> = pattern
            .section_refs()
            .iter()
            .map(String::as_str)
            .filter(|section_ref| !section_ids.contains(*section_ref))
            .collect();
        if dangling.is_empty() {
            true
        } else {
            warnings.push(format!(
                "journey pattern {:?} dropped: dangling section refs {dangling:?}",
                pattern.id()
            ));
            false
        }
    });

    let pattern_ids: FxHashSet<String> = document
        .journey_patterns
        .iter()
        .map(|pattern| pattern.id().to_string())
        .collect();

    document.vehicle_journeys.retain(|journey| {
        let mut dangling = Vec::new();
        match journey.journey_pattern_ref() {
            Some(pattern_ref) if pattern_ids.contains(pattern_ref) => {}
            Some(pattern_ref) => dangling.push(format!("journey pattern {pattern_ref:?}")),
            None => dangling.push("missing journey pattern ref".to_string()),
        }
        let service_lines = journey
            .service_ref()
            .and_then(|service_ref| lines_by_service.get(service_ref));
        match journey.service_ref() {
            Some(_) if service_lines.is_some() => {}
            Some(service_ref) => dangling.push(format!("service {service_ref:?}")),
            None => dangling.push("missing service ref".to_string()),
        }
        match journey.line_ref() {
            Some(line_ref) => {
                // Only judgeable once the service itself resolved.
                if let Some(lines) = service_lines
                    && !lines.contains(line_ref)
                {
                    dangling.push(format!("line {line_ref:?} not declared by its service"));
                }
            }
            None => dangling.push("missing line ref".to_string()),
        }
        if let Some(operator_ref) = journey.operator_ref()
            && !operator_ids.contains(operator_ref)
        {
            dangling.push(format!("operator {operator_ref:?}"));
        }
        if dangling.is_empty() {
            true
        } else {
            warnings.push(format!(
                "vehicle journey {:?} dropped: {}",
                journey.code(),
                dangling.join(", ")
            ));
            false
        }
    });
}
