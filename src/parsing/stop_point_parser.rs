/// # StopPoints
///
/// Both forms a document may carry are recognized:
///
/// - `AnnotatedStopPointRef`: `StopPointRef`, `CommonName`, `LocalityName`,
///   optional `Location/Longitude|Latitude`
/// - full `StopPoint`: `AtcoCode`, `Descriptor/CommonName`, `Place` with
///   locality and `Location`, `StopClassification/StopType`
///
/// Coordinates are WGS84 when given as `Longitude`/`Latitude`; grid
/// (`Easting`/`Northing`) locations are left unset.
use std::io::BufRead;

use crate::{
    error::TxcError,
    models::StopPoint,
    parsing::helpers::{read_text, skip_element},
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<Vec<StopPoint>, TxcError> {
    let mut stop_points = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "AnnotatedStopPointRef" | "StopPoint" => {
                    if let Some(stop_point) = parse_stop_point(reader, warnings)? {
                        stop_points.push(stop_point);
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(stop_points)
}

fn parse_stop_point<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<Option<StopPoint>, TxcError> {
    let mut stop_point = StopPoint::default();

    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "StopPointRef" | "AtcoCode" => stop_point.set_atco_code(read_text(reader)?),
                "CommonName" => stop_point.set_common_name(read_text(reader)?),
                "LocalityName" => stop_point.set_locality(read_text(reader)?),
                "Descriptor" | "Place" | "StopClassification" | "Location" => {
                    parse_nested(reader, &mut stop_point, warnings)?;
                }
                "Longitude" => parse_coordinate(reader, &mut stop_point, warnings, false)?,
                "Latitude" => parse_coordinate(reader, &mut stop_point, warnings, true)?,
                "StopType" => stop_point.set_stop_type(read_text(reader)?),
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }

    if stop_point.atco_code().is_empty() {
        warnings.push("stop point without a stop code was skipped".to_string());
        return Ok(None);
    }
    Ok(Some(stop_point))
}

/// Descriptor/Place/StopClassification/Location wrappers share the same
/// recognized children, so one walker covers all of them.
fn parse_nested<R: BufRead>(
    reader: &mut XmlReader<R>,
    stop_point: &mut StopPoint,
    warnings: &mut Vec<String>,
) -> Result<(), TxcError> {
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "CommonName" => stop_point.set_common_name(read_text(reader)?),
                "LocalityName" | "NptgLocalityName" => {
                    stop_point.set_locality(read_text(reader)?);
                }
                "Location" | "Translation" => parse_nested(reader, stop_point, warnings)?,
                "Longitude" => parse_coordinate(reader, stop_point, warnings, false)?,
                "Latitude" => parse_coordinate(reader, stop_point, warnings, true)?,
                "StopType" => stop_point.set_stop_type(read_text(reader)?),
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(())
}

fn parse_coordinate<R: BufRead>(
    reader: &mut XmlReader<R>,
    stop_point: &mut StopPoint,
    warnings: &mut Vec<String>,
    is_latitude: bool,
) -> Result<(), TxcError> {
    let text = read_text(reader)?;
    match text.trim().parse::<f64>() {
        Ok(value) if is_latitude => stop_point.set_latitude(value),
        Ok(value) => stop_point.set_longitude(value),
        Err(_) => {
            let axis = if is_latitude { "latitude" } else { "longitude" };
            warnings.push(format!("unparseable {axis} {text:?} was ignored"));
        }
    }
    Ok(())
}
