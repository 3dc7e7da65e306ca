use std::collections::BTreeSet;

use crate::{
    record::ResponseRecord,
    store::error::{StoreError, codec_error, schema_mismatch},
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The accumulated log: a header fixed by the first record, then rows in
/// append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_schema(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|name| name == column)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Appends `record` as the last row. An empty table takes its schema from
    /// the record; otherwise columns the record lacks are left blank and
    /// columns the table lacks are rejected.
    pub fn append(&mut self, record: &ResponseRecord) -> Result<(), StoreError> {
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = record.columns().find(|column| !seen.insert(*column)) {
            return Err(schema_mismatch(format!(
                "record repeats column '{duplicate}'"
            )));
        }

        if !self.has_schema() {
            self.columns = record.columns().map(str::to_string).collect();
        } else if let Some(unknown) = record
            .columns()
            .find(|column| !self.columns.iter().any(|existing| existing == *column))
        {
            return Err(schema_mismatch(format!(
                "record column '{unknown}' is not part of the log schema [{}]",
                self.columns.join(", ")
            )));
        }

        let row = self
            .columns
            .iter()
            .map(|column| record.get(column).unwrap_or_default().to_string())
            .collect();
        self.rows.push(row);
        Ok(())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);
        let columns = reader
            .headers()
            .map_err(|err| codec_error(format!("failed to read log header: {err}")))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|err| {
                codec_error(format!("failed to read log row {}: {err}", index + 1))
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { columns, rows })
    }

    /// CSV with a UTF-8 BOM so spreadsheet tools detect the encoding of
    /// Korean text. A table without schema encodes to no bytes.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        if !self.has_schema() {
            return Ok(Vec::new());
        }

        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
        writer
            .write_record(&self.columns)
            .map_err(|err| codec_error(format!("failed to write log header: {err}")))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| codec_error(format!("failed to write log row: {err}")))?;
        }
        writer
            .into_inner()
            .map_err(|err| codec_error(format!("failed to flush log table: {err}")))
    }
}
