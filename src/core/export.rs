// LogSift - GPL-3.0-or-later
// This file is part of LogSift.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// LogSift is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogSift is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogSift.  If not, see <https://www.gnu.org/licenses/>.

//! Table export as CSV or pretty-printed JSON, columns in the fixed
//! display order.

use crate::core::table::LogTable;
use crate::parser::record::COLUMN_ORDER;
use chrono::Local;
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Timestamped default file name, e.g. `log_analysis_20230101_120000.csv`.
#[must_use]
pub fn default_export_name(format: ExportFormat) -> String {
    format!(
        "log_analysis_{}.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Render the table as RFC-4180-style CSV with a header row.
#[must_use]
pub fn to_csv(table: &LogTable) -> String {
    let mut out = String::new();
    out.push_str(&COLUMN_ORDER.join(","));
    out.push('\n');

    for rec in table.records() {
        let timestamp = rec.timestamp.map(|ts| ts.to_rfc3339()).unwrap_or_default();
        let line_number = rec.line_number.to_string();
        let message_length = rec.message_length.to_string();
        let word_count = rec.word_count.to_string();
        let fields: [&str; 10] = [
            &timestamp,
            &rec.severity,
            &rec.source,
            &rec.message,
            &line_number,
            if rec.has_timestamp { "true" } else { "false" },
            &message_length,
            &word_count,
            rec.pattern_used,
            &rec.raw_line,
        ];
        let row: Vec<Cow<'_, str>> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Render the table as a pretty-printed JSON array of record objects.
pub fn to_json(table: &LogTable) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(table.records())?)
}

/// Write the table to `path` in the requested format.
pub fn write_export(table: &LogTable, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    let content = match format {
        ExportFormat::Csv => to_csv(table),
        ExportFormat::Json => to_json(table)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_content;

    #[test]
    fn test_csv_header_matches_column_order() {
        let csv = to_csv(&parse_content(""));
        assert_eq!(
            csv,
            "timestamp,severity,source,message,line_number,has_timestamp,message_length,word_count,pattern_used,raw_line\n"
        );
    }

    #[test]
    fn test_csv_quotes_embedded_delimiters() {
        let table = parse_content("ERROR said \"no, thanks\" and left");
        let csv = to_csv(&table);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("\"said \"\"no, thanks\"\" and left\""));
    }

    #[test]
    fn test_csv_has_one_row_per_record() {
        let table = parse_content("first\nsecond\nthird");
        let csv = to_csv(&table);
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_json_round_trips_fields() {
        let table = parse_content("2023-01-01 12:00:00 [ERROR] db: down");
        let json = to_json(&table).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["severity"], "ERROR");
        assert_eq!(rows[0]["source"], "db");
        assert_eq!(rows[0]["line_number"], 1);
        assert!(rows[0]["timestamp"].is_string());
    }

    #[test]
    fn test_default_name_carries_extension() {
        assert!(default_export_name(ExportFormat::Csv).starts_with("log_analysis_"));
        assert!(default_export_name(ExportFormat::Csv).ends_with(".csv"));
        assert!(default_export_name(ExportFormat::Json).ends_with(".json"));
    }
}
