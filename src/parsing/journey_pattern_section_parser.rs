/// # JourneyPatternSections
///
/// Each `JourneyPatternSection` is an ordered run of
/// `JourneyPatternTimingLink`s. A link carries `From`/`To` endpoints
/// (`StopPointRef`, optional `TimingStatus` and `WaitTime`) and a `RunTime`
/// duration. Links with an unparseable run time are skipped: a bad duration
/// would corrupt every stop time computed downstream of it.
use std::io::BufRead;

use crate::{
    error::TxcError,
    models::{JourneyPatternSection, TimingLink},
    parsing::helpers::{attribute, parse_duration, read_text, skip_element},
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(
    reader: &mut XmlReader<R>,
    warnings: &mut Vec<String>,
) -> Result<Vec<JourneyPatternSection>, TxcError> {
    let mut sections = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "JourneyPatternSection" => {
                    let id = attribute(&attributes, "id").unwrap_or_default();
                    sections.push(parse_section(reader, id, warnings)?);
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
    warnings: &mut Vec<String>,
) -> Result<JourneyPatternSection, TxcError> {
    let mut section = JourneyPatternSection::new(id);
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "JourneyPatternTimingLink" => {
                    let link_id = attribute(&attributes, "id").unwrap_or_default();
                    if let Some(link) = parse_timing_link(reader, link_id, warnings)? {
                        section.add_timing_link(link);
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(section)
}

fn parse_timing_link<R: BufRead>(
    reader: &mut XmlReader<R>,
    id: String,
    warnings: &mut Vec<String>,
) -> Result<Option<TimingLink>, TxcError> {
    let mut link = TimingLink::new(id);
    let mut run_time = None;

    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "From" => parse_endpoint(reader, &mut link, warnings, true)?,
                "To" => parse_endpoint(reader, &mut link, warnings, false)?,
                "RunTime" => {
                    let text = read_text(reader)?;
                    run_time = parse_duration(&text);
                    if run_time.is_none() {
                        warnings.push(format!(
                            "timing link {:?}: unparseable run time {text:?}",
                            link.id()
                        ));
                    }
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }

    match run_time {
        Some(seconds) => {
            link.set_run_time(seconds);
            Ok(Some(link))
        }
        None => {
            warnings.push(format!(
                "timing link {:?} without a valid run time was skipped",
                link.id()
            ));
            Ok(None)
        }
    }
}

fn parse_endpoint<R: BufRead>(
    reader: &mut XmlReader<R>,
    link: &mut TimingLink,
    warnings: &mut Vec<String>,
    is_from: bool,
) -> Result<(), TxcError> {
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "StopPointRef" => {
                    let stop = read_text(reader)?.trim().to_string();
                    if is_from {
                        link.set_from_stop(stop);
                    } else {
                        link.set_to_stop(stop);
                    }
                }
                "TimingStatus" => {
                    let status = read_text(reader)?.trim().to_string();
                    if is_from {
                        link.set_from_timing_status(status);
                    } else {
                        link.set_to_timing_status(status);
                    }
                }
                "WaitTime" => {
                    let text = read_text(reader)?;
                    match parse_duration(&text) {
                        Some(seconds) if is_from => link.set_from_wait_time(seconds),
                        Some(seconds) => link.set_to_wait_time(seconds),
                        None => warnings.push(format!(
                            "timing link {:?}: unparseable wait time {text:?}",
                            link.id()
                        )),
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
