use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use rustc_hash::FxHashMap;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

// ------------------------------------------------------------------------------------------------
// --- CsvDocument
// ------------------------------------------------------------------------------------------------

/// A fully parsed CSV table with a header row. Fields are resolved by header
/// name, unknown headers are kept (callers simply never ask for them) and a
/// leading UTF-8 BOM is stripped before the header is read.
#[derive(Debug)]
pub struct CsvDocument {
    headers: Vec<String>,
    header_index: FxHashMap<String, usize>,
    rows: Vec<CsvRecord>,
}

#[derive(Debug)]
struct CsvRecord {
    line: u64,
    record: StringRecord,
}

impl CsvDocument {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, csv::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, csv::Error> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let header_index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            rows.push(CsvRecord { line, record });
        }

        Ok(Self {
            headers,
            header_index,
            rows,
        })
    }

    // Getters/Setters

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // Functions

    pub fn has_column(&self, name: &str) -> bool {
        self.header_index.contains_key(name)
    }

    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.rows.iter().map(|row| CsvRow {
            header_index: &self.header_index,
            record: &row.record,
            line: row.line,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// --- CsvRow
// ------------------------------------------------------------------------------------------------

/// One data row of a [`CsvDocument`], with header-keyed field access.
#[derive(Clone, Copy)]
pub struct CsvRow<'a> {
    header_index: &'a FxHashMap<String, usize>,
    record: &'a StringRecord,
    line: u64,
}

impl<'a> CsvRow<'a> {
    /// 1-based line number of the row in its source file.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Field by header name. `None` when the column does not exist or the
    /// row is too short to carry it; an empty field comes back as `Some("")`.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = *self.header_index.get(column)?;
        self.record.get(index)
    }

    /// Field by header name, with an empty value treated as absent.
    pub fn get_non_empty(&self, column: &str) -> Option<&'a str> {
        self.get(column).filter(|value| !value.is_empty())
    }
}

/// Number of data rows of a CSV source without parsing it: newline count
/// minus one for the header. Used by the lazy feed to answer counts for
/// tables it has not materialized yet.
pub fn count_data_rows<R: Read>(mut reader: R) -> std::io::Result<usize> {
    let mut buffer = [0u8; 8192];
    let mut newlines = 0usize;
    let mut last_byte = None;
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        newlines += buffer[..n].iter().filter(|&&b| b == b'\n').count();
        last_byte = Some(buffer[n - 1]);
    }
    let lines = match last_byte {
        None => 0,
        Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    };
    Ok(lines.saturating_sub(1))
}

// ------------------------------------------------------------------------------------------------
// --- JsonDocument
// ------------------------------------------------------------------------------------------------

/// A parsed JSON value, from a path, a string or any reader (including ZIP
/// archive members).
#[derive(Debug)]
pub struct JsonDocument {
    value: serde_json::Value,
}

impl JsonDocument {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, serde_json::Error> {
        let file = File::open(path).map_err(serde_json::Error::io)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        Ok(Self {
            value: serde_json::from_reader(reader)?,
        })
    }

    pub fn from_str(content: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            value: serde_json::from_str(content)?,
        })
    }

    // Getters/Setters

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    // Functions

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.value.get(key)
    }
}
