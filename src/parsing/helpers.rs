/// Textual field parsers shared by the collection parsers, plus small
/// event-stream utilities for walking element subtrees.
use std::io::BufRead;

use chrono::NaiveDate;
use nom::{
    IResult, Parser,
    character::complete::{char, one_of, u32},
    combinator::{all_consuming, opt},
    sequence::{preceded, terminated},
};

use crate::{
    error::TxcError,
    xml::{XmlEvent, XmlReader},
};

/// Normalizes an ISO-8601-style duration to seconds. `PT1M30S` -> 90.
/// Accepts `PT0H5M0S`, `PT00H05M`, day components and lowercase designators.
/// `None` for anything else (including negative durations).
pub(crate) fn parse_duration(value: &str) -> Option<u32> {
    all_consuming(duration_combinator)
        .parse(value.trim())
        .ok()
        .map(|(_, seconds)| seconds)
}

fn duration_combinator(input: &str) -> IResult<&str, u32> {
    let (input, _) = one_of("Pp").parse(input)?;
    let (input, days) = opt(terminated(u32, one_of("Dd"))).parse(input)?;
    let (input, time) = opt(preceded(
        one_of("Tt"),
        (
            opt(terminated(u32, one_of("Hh"))),
            opt(terminated(u32, one_of("Mm"))),
            opt(terminated(u32, one_of("Ss"))),
        ),
    ))
    .parse(input)?;

    let (hours, minutes, seconds) = time.unwrap_or((None, None, None));
    let total = days.unwrap_or(0) * 86_400
        + hours.unwrap_or(0) * 3_600
        + minutes.unwrap_or(0) * 60
        + seconds.unwrap_or(0);
    Ok((input, total))
}

/// Normalizes `HH:MM[:SS]` to seconds from midnight. Hours up to 47 are
/// accepted for journeys that run past midnight; anything malformed or out
/// of range is `None`.
pub(crate) fn parse_clock_time(value: &str) -> Option<u32> {
    let (_, (hours, minutes, seconds)) = all_consuming(clock_time_combinator)
        .parse(value.trim())
        .ok()?;
    if hours > 47 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(hours * 3_600 + minutes * 60 + seconds)
}

fn clock_time_combinator(input: &str) -> IResult<&str, (u32, u32, u32)> {
    let (input, (hours, minutes, seconds)) = (
        u32,
        preceded(char(':'), u32),
        opt(preceded(char(':'), u32)),
    )
        .parse(input)?;
    Ok((input, (hours, minutes, seconds.unwrap_or(0))))
}

/// `YYYY-MM-DD` (a leading timestamp part is tolerated and cut off).
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub(crate) fn attribute(attributes: &[(String, String)], name: &str) -> Option<String> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

/// Consumes the rest of the current element, nested children included.
/// Call right after the element's Start event.
pub(crate) fn skip_element<R: BufRead>(reader: &mut XmlReader<R>) -> Result<(), TxcError> {
    let mut depth = 0usize;
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { .. } => depth += 1,
            XmlEvent::End { .. } => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            XmlEvent::Text(_) => {}
        }
    }
    Ok(())
}

/// Text content of the current leaf element, consumed through its End
/// event. Nested elements are skipped.
pub(crate) fn read_text<R: BufRead>(reader: &mut XmlReader<R>) -> Result<String, TxcError> {
    let mut content = String::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Text(text) => content.push_str(&text),
            XmlEvent::Start { .. } => skip_element(reader)?,
            XmlEvent::End { .. } => break,
        }
    }
    Ok(content)
}
