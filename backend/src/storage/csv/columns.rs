//! Header-addressed access to CSV records, so files written by older
//! versions or edited by hand still load when columns are reordered or
//! missing.

use anyhow::Result;
use csv::{ReaderBuilder, StringRecord, Writer};
use log::warn;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub(crate) struct Columns {
    headers: StringRecord,
}

impl Columns {
    pub fn new(headers: StringRecord) -> Self {
        Self { headers }
    }

    /// Cell under `name`, or an empty string when the column is absent.
    pub fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .and_then(|i| record.get(i))
            .unwrap_or("")
    }

    pub fn optional(&self, record: &StringRecord, name: &str) -> Option<String> {
        let cell = self.get(record, name).trim();
        if cell.is_empty() {
            None
        } else {
            Some(cell.to_string())
        }
    }
}

/// Read every row of a CSV file. A missing file reads as no rows. Rows may
/// be shorter or longer than the header; a row that cannot be decoded at
/// all is skipped.
pub(crate) fn read_rows<T, F>(path: &Path, mut parse: F) -> Result<Vec<T>>
where
    F: FnMut(&Columns, &StringRecord) -> Option<T>,
{
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));
    let columns = Columns::new(csv_reader.headers()?.clone());

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };
        if let Some(row) = parse(&columns, &record) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Render a header and rows to CSV bytes.
pub(crate) fn to_csv_bytes<I, R>(header: &[&str], rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut csv_writer = Writer::from_writer(Vec::new());
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(csv_writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?)
}
