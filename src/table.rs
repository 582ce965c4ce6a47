//! A delimited-text table for batch formatting.
//!
//! The input is a header row plus one record per line, RFC 4180 comma
//! separated. One identifier column is passed through untouched; every
//! other column is treated as a phone column and gains a companion
//! `Formatted <column>` column. Row order is preserved throughout.

use std::error::Error;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use csv::{ReaderBuilder, Writer};

use crate::codes::CodeTable;
use crate::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug)]
pub enum ParseTableError {
    /// The input had no header row.
    Empty,
    /// The reader rejected a record (ragged rows included).
    Csv(csv::Error),
}

impl Display for ParseTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseTableError::Empty => f.write_str("could not parse table: no header row"),
            ParseTableError::Csv(err) => write!(f, "could not parse table: {err}"),
        }
    }
}

impl Error for ParseTableError {}

impl From<csv::Error> for ParseTableError {
    fn from(v: csv::Error) -> Self {
        Self::Csv(v)
    }
}

impl FromStr for Table {
    type Err = ParseTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = ReaderBuilder::new().from_reader(s.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if headers.is_empty() {
            return Err(ParseTableError::Empty);
        }
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        Ok(Self { headers, rows })
    }
}

/// A formatted value that failed the canonical-shape re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry<'a> {
    /// Zero-based record index, header excluded.
    pub row: usize,
    pub column: &'a str,
    pub original: &'a str,
    pub formatted: &'a str,
}

impl Table {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let buffer = crate::load_file(path)
            .with_context(|| format!("could not read table from {}", path.display()))?;
        buffer
            .parse::<Self>()
            .with_context(|| format!("failed to parse table from {}", path.display()))
    }

    /// Appends a `Formatted <column>` column for every non-identifier
    /// column, filled per cell by [`normalize::normalize`].
    ///
    /// Original phone cells are whitespace-trimmed in place so that a
    /// pass-through is literally equal to its source cell. Empty cells stay
    /// empty; non-empty cells never come back empty.
    pub fn format_phone_columns(&mut self, codes: &CodeTable, id_column: &str) {
        let phone_columns = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, header)| header.as_str() != id_column)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        for index in phone_columns {
            let companion = format!("Formatted {}", self.headers[index]);
            self.headers.push(companion);
            for row in &mut self.rows {
                row[index] = row[index].trim().to_owned();
                let formatted = if row[index].is_empty() {
                    String::new()
                } else {
                    normalize::normalize(&row[index], codes)
                };
                row.push(formatted);
            }
        }
    }

    /// Re-validates every `Formatted <column>` cell against the canonical
    /// shape and reports the discrepancies. Empty cells are skipped.
    pub fn audit(&self) -> Vec<AuditEntry<'_>> {
        let mut entries = Vec::new();
        for (index, header) in self.headers.iter().enumerate() {
            let Some(source) = header.strip_prefix("Formatted ") else {
                continue;
            };
            let source_index = self.headers.iter().position(|h| h.as_str() == source);
            for (row_index, row) in self.rows.iter().enumerate() {
                let formatted = row[index].as_str();
                if formatted.is_empty() || normalize::is_canonical(formatted) {
                    continue;
                }
                entries.push(AuditEntry {
                    row: row_index,
                    column: header,
                    original: source_index.map(|i| row[i].as_str()).unwrap_or(""),
                    formatted,
                });
            }
        }
        entries
    }

    pub fn to_delimited(&self) -> anyhow::Result<String> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("could not flush table: {err}"))?;
        String::from_utf8(buffer).map_err(Into::into)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let mut fp = std::fs::File::create(path)
            .with_context(|| format!("could not create {}", path.display()))?;
        fp.write_all(self.to_delimited()?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes() -> CodeTable {
        CodeTable::from_raw_codes(["3", "45"])
    }

    #[test]
    fn test_parse_and_write_round_trip() {
        let input = "Person ID,Home Phone\n1,090-1234-5678\n2,\"Smith, J\"\n";
        let table = input.parse::<Table>().unwrap();
        assert_eq!(table.headers, vec!["Person ID", "Home Phone"]);
        assert_eq!(table.rows[1][1], "Smith, J");
        assert_eq!(table.to_delimited().unwrap(), input);
    }

    #[test]
    fn test_quoted_field_with_comma_and_newline() {
        let input = "Person ID,Home Phone\n1,\"090-1234-5678\n ext 2\"\n2,\"a,b\"\n";
        let table = input.parse::<Table>().unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "090-1234-5678\n ext 2");
        assert_eq!(table.rows[1][1], "a,b");
        assert_eq!(table.to_delimited().unwrap(), input);
    }

    #[test]
    fn test_ragged_record_is_an_error() {
        let input = "Person ID,Home Phone\n1,090-1234-5678,extra\n";
        let err = input.parse::<Table>().unwrap_err();
        assert!(matches!(err, ParseTableError::Csv(_)), "got {err:?}");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = "".parse::<Table>().unwrap_err();
        assert!(matches!(err, ParseTableError::Empty), "got {err:?}");
    }

    #[test]
    fn test_format_appends_companion_columns() {
        let input = "Person ID,Home Phone,Business Phone\n\
                     7,090-1234-5678,+81 3 1234 5678\n\
                     8,not a number,\n";
        let mut table = input.parse::<Table>().unwrap();
        table.format_phone_columns(&codes(), "Person ID");
        assert_eq!(
            table.headers,
            vec![
                "Person ID",
                "Home Phone",
                "Business Phone",
                "Formatted Home Phone",
                "Formatted Business Phone",
            ]
        );
        // Row order and identifiers untouched
        assert_eq!(table.rows[0][0], "7");
        assert_eq!(table.rows[1][0], "8");
        assert_eq!(table.rows[0][3], "+81 90-1234-5678");
        assert_eq!(table.rows[0][4], "+81 3-1234-5678");
        // Pass-through keeps the value, empty stays empty
        assert_eq!(table.rows[1][3], "not a number");
        assert_eq!(table.rows[1][4], "");
    }

    #[test]
    fn test_audit_reports_pass_throughs() {
        let input = "Person ID,Home Phone\n1,090-1234-5678\n2,not a number\n";
        let mut table = input.parse::<Table>().unwrap();
        table.format_phone_columns(&codes(), "Person ID");
        let entries = table.audit();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].row, 1);
        assert_eq!(entries[0].column, "Formatted Home Phone");
        assert_eq!(entries[0].original, "not a number");
        assert_eq!(entries[0].formatted, "not a number");
    }
}
