/// # Operators
///
/// `Operators` (and the 2.5 `NationalOperators` variant) hold one
/// `Operator`/`LicensedOperator` per operating company. Recognized fields:
///
/// - `OperatorCode` / `NationalOperatorCode`
/// - `OperatorShortName`
/// - `TradingName`
/// - `LicenceNumber`
use std::io::BufRead;

use crate::{
    error::TxcError,
    models::Operator,
    parsing::helpers::{attribute, read_text, skip_element},
    xml::{XmlEvent, XmlReader},
};

pub(crate) fn parse<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Vec<Operator>, TxcError> {
    let mut operators = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, attributes } => match name.as_str() {
                "Operator" | "LicensedOperator" => {
                    operators.push(parse_operator(reader, &attributes)?);
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(operators)
}

fn parse_operator<R: BufRead>(
    reader: &mut XmlReader<R>,
    attributes: &[(String, String)],
) -> Result<Operator, TxcError> {
    let mut operator = Operator::new(attribute(attributes, "id").unwrap_or_default());
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "OperatorCode" | "NationalOperatorCode" => {
                    operator.set_code(read_text(reader)?);
                }
                "OperatorShortName" => operator.set_short_name(read_text(reader)?),
                "TradingName" => operator.set_trading_name(read_text(reader)?),
                "LicenceNumber" => operator.set_license_number(read_text(reader)?),
                _ => skip_element(reader)?,
            },
            XmlEvent::End { .. } => break,
            XmlEvent::Text(_) => {}
        }
    }
    Ok(operator)
}
