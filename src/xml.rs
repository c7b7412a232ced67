use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;

use crate::error::TxcError;

// ------------------------------------------------------------------------------------------------
// --- XmlEvent
// ------------------------------------------------------------------------------------------------

/// A pull event with namespace prefixes already stripped. Self-closing
/// elements are expanded into a Start/End pair so consumers only ever deal
/// with these three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    End {
        name: String,
    },
}

// ------------------------------------------------------------------------------------------------
// --- XmlReader
// ------------------------------------------------------------------------------------------------

/// Namespace-agnostic pull reader over any buffered byte source.
///
/// The reader performs no schema validation: unknown elements are surfaced
/// verbatim and it is up to the consumer to skip them. The current element
/// path is tracked as a stack for error reporting.
#[derive(Debug)]
pub struct XmlReader<R: BufRead> {
    inner: quick_xml::Reader<R>,
    buf: Vec<u8>,
    path: Vec<String>,
    file_name: Option<String>,
}

impl XmlReader<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TxcError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|_| TxcError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(Self::new(BufReader::new(file), file_name))
    }
}

impl<'a> XmlReader<&'a [u8]> {
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes, None)
    }
}

impl<R: BufRead> XmlReader<R> {
    pub fn new(reader: R, file_name: Option<String>) -> Self {
        let mut inner = quick_xml::Reader::from_reader(reader);
        let config = inner.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;
        Self {
            inner,
            buf: Vec::new(),
            path: Vec::new(),
            file_name,
        }
    }

    // Getters/Setters

    /// Element stack at the last returned event: a Start's name is already
    /// on the stack, an End's name is already popped.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn buffer_position(&self) -> u64 {
        self.inner.buffer_position()
    }

    // Functions

    /// Next event, or `None` at end of input. Empty input yields `None`
    /// immediately: an empty event stream, not an error.
    pub fn next_event(&mut self) -> Result<Option<XmlEvent>, TxcError> {
        loop {
            self.buf.clear();
            let event = match self.inner.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(error) => {
                    return Err(TxcError::Parse {
                        file_name: self.file_name.clone(),
                        byte_offset: Some(self.inner.buffer_position()),
                        reason: error.to_string(),
                    });
                }
            };

            match event {
                Event::Start(start) => {
                    let name = local_name(start.name().local_name().as_ref());
                    let mut attributes = Vec::new();
                    for attribute in start.attributes().with_checks(false).flatten() {
                        let key = local_name(attribute.key.local_name().as_ref());
                        if let Ok(value) = attribute.unescape_value() {
                            attributes.push((key, value.into_owned()));
                        }
                    }
                    self.path.push(name.clone());
                    return Ok(Some(XmlEvent::Start { name, attributes }));
                }
                Event::End(end) => {
                    let name = local_name(end.name().local_name().as_ref());
                    self.path.pop();
                    return Ok(Some(XmlEvent::End { name }));
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map(|cow| cow.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    if !content.is_empty() {
                        return Ok(Some(XmlEvent::Text(content)));
                    }
                }
                Event::CData(cdata) => {
                    return Ok(Some(XmlEvent::Text(
                        String::from_utf8_lossy(&cdata).into_owned(),
                    )));
                }
                Event::Eof => return Ok(None),
                // Declaration, comments, processing instructions, DOCTYPE.
                _ => {}
            }
        }
    }

}

fn local_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(xml: &str) -> Vec<XmlEvent> {
        let mut reader = XmlReader::from_bytes(xml.as_bytes());
        let mut events = Vec::new();
        while let Some(event) = reader.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn strips_namespace_prefixes() {
        let events = drain(
            r#"<txc:Root xmlns:txc="http://www.transxchange.org.uk/">
                 <txc:Child txc:id="c1">value &amp; more</txc:Child>
               </txc:Root>"#,
        );
        assert_eq!(
            vec![
                XmlEvent::Start {
                    name: "Root".into(),
                    attributes: vec![("txc".into(), "http://www.transxchange.org.uk/".into())],
                },
                XmlEvent::Start {
                    name: "Child".into(),
                    attributes: vec![("id".into(), "c1".into())],
                },
                XmlEvent::Text("value & more".into()),
                XmlEvent::End {
                    name: "Child".into()
                },
                XmlEvent::End { name: "Root".into() },
            ],
            events
        );
    }

    #[test]
    fn self_closing_elements_become_start_end_pairs() {
        let events = drain(r#"<Root><Leaf code="x"/></Root>"#);
        assert_eq!(4, events.len());
        assert!(matches!(&events[1], XmlEvent::Start { name, .. } if name == "Leaf"));
        assert!(matches!(&events[2], XmlEvent::End { name } if name == "Leaf"));
    }

    #[test]
    fn empty_input_is_an_empty_event_stream() {
        let mut reader = XmlReader::from_bytes(b"");
        assert_eq!(None, reader.next_event().unwrap());
    }

    #[test]
    fn path_tracks_open_elements() {
        let mut reader = XmlReader::from_bytes(b"<A><B><C/></B></A>");
        reader.next_event().unwrap(); // <A>
        reader.next_event().unwrap(); // <B>
        reader.next_event().unwrap(); // <C>
        assert_eq!(&["A", "B", "C"], reader.path());
        reader.next_event().unwrap(); // </C>
        assert_eq!(&["A", "B"], reader.path());
    }

    #[test]
    fn mismatched_end_tag_reports_byte_offset() {
        let mut reader = XmlReader::from_bytes(b"<A><B></A>");
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        match reader.next_event() {
            Err(TxcError::Parse { byte_offset, .. }) => assert!(byte_offset.is_some()),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_file_not_found() {
        match XmlReader::from_path("/nonexistent/path") {
            Err(TxcError::FileNotFound { path }) => {
                assert_eq!("/nonexistent/path", path.to_string_lossy());
            }
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }
}
