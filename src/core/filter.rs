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

//! Record-level display filters. Criteria compose with AND; an unset
//! criterion matches everything.

use crate::core::table::LogTable;
use crate::parser::record::LogRecord;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Keep only these normalized severities
    pub severities: Option<Vec<String>>,
    /// Keep records dated on or after this day
    pub start_date: Option<NaiveDate>,
    /// Keep records dated on or before this day (inclusive)
    pub end_date: Option<NaiveDate>,
    /// Keep records whose message contains this text, case-insensitively
    pub message_contains: Option<String>,
}

impl LogFilter {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.severities.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.message_contains.is_none()
    }

    #[must_use]
    pub fn matches(&self, record: &LogRecord) -> bool {
        let needle = self.message_contains.as_ref().map(|s| s.to_lowercase());
        self.matches_with(record, needle.as_deref())
    }

    /// Ascending positions of all matching records.
    #[must_use]
    pub fn matching_indices(&self, table: &LogTable) -> Vec<usize> {
        let needle = self.message_contains.as_ref().map(|s| s.to_lowercase());
        table
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| self.matches_with(r, needle.as_deref()))
            .map(|(i, _)| i)
            .collect()
    }

    fn matches_with(&self, record: &LogRecord, needle: Option<&str>) -> bool {
        if let Some(severities) = &self.severities {
            if !severities.iter().any(|s| s == &record.severity) {
                return false;
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            // Date criteria only ever match records that carry a timestamp.
            let Some(ts) = record.timestamp else {
                return false;
            };
            let date = ts.date_naive();
            if let Some(start) = self.start_date {
                if date < start {
                    return false;
                }
            }
            if let Some(end) = self.end_date {
                if date > end {
                    return false;
                }
            }
        }

        if let Some(needle) = needle {
            if !record.message.to_lowercase().contains(needle) {
                return false;
            }
        }

        true
    }
}
