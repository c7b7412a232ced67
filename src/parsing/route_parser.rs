/// # Routes and RouteSections
///
/// Route geometry is parsed structurally: a `Route` is a list of
/// `RouteSectionRef`s and a `RouteSection` a list of `RouteLink`s with stop
/// endpoints and an optional `Distance` in metres. `Track` geometry is not
/// extracted; shape synthesis works from stop coordinates.
use std::io::BufRead;

use crate::{
    error::TxcError,
    models::{Route, RouteLink, RouteSection},
    parsing::helpers::{attribute, read_text, skip_element},
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse_routes<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Vec<Route>, TxcError> {
    let mut routes = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "Route" => {
                    let mut route = Route::new(attribute(&attributes, "id").unwrap_or_default());
                    while let Some(inner) = reader.next_event()? {
                        match inner {
                            XmlEvent::Start { name, .. } => match name.as_str() {
                                "RouteSectionRef" => {
                                    route.add_section_ref(read_text(reader)?.trim().to_string());
                                }
                                _ => skip_element(reader)?,
                            },
                            XmlEvent::End { .. } => break,
                            XmlEvent::Text(_) => {}
                        }
                    }
                    routes.push(route);
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(routes)
}

pub(crate) fn parse_route_sections<R: BufRead>(
    reader: &mut XmlReader<R>,
) -> Result<Vec<RouteSection>, TxcError> {
    let mut sections = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "RouteSection" => {
                    let id = attribute(&attributes, "id").unwrap_or_default();
                    sections.push(parse_section(reader, id)?);
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(sections)
}

fn parse_section<R: BufRead>(
    reader: &mut XmlReader<R>,
    id: String,
) -> Result<RouteSection, TxcError> {
    let mut section = RouteSection::new(id);
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "RouteLink" => {
                    let mut link =
                        RouteLink::new(attribute(&attributes, "id").unwrap_or_default());
                    parse_link(reader, &mut link)?;
                    section.add_link(link);
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(section)
}

fn parse_link<R: BufRead>(reader: &mut XmlReader<R>, link: &mut RouteLink) -> Result<(), TxcError> {
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "From" | "To" => {
                    let is_from = name == "From";
                    while let Some(inner) = reader.next_event()? {
                        match inner {
                            XmlEvent::Start { name, .. } => match name.as_str() {
                                "StopPointRef" => {
                                    let stop = read_text(reader)?.trim().to_string();
                                    if is_from {
                                        link.set_from_stop(stop);
                                    } else {
                                        link.set_to_stop(stop);
                                    }
                                }
                                _ => skip_element(reader)?,
                            },
                            XmlEvent::End { .. } => break,
                            XmlEvent::Text(_) => {}
                        }
                    }
                }
                "Distance" => {
                    if let Ok(metres) = read_text(reader)?.trim().parse::<f64>() {
                        link.set_distance(metres);
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
