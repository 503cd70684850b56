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

//! The ordered record table handed from the parser to every downstream
//! consumer. Records keep their original line order; detection results
//! are 0-based positions into this table.

use crate::parser::record::LogRecord;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogTable {
    records: Vec<LogRecord>,
}

impl LogTable {
    #[must_use]
    pub const fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Materialize a new table holding clones of the rows at `indices`,
    /// in the order given. Out-of-range positions are skipped.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let records = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        Self { records }
    }

    /// Count records whose severity is one of `severities`.
    #[must_use]
    pub fn severity_count(&self, severities: &[&str]) -> usize {
        self.records
            .iter()
            .filter(|r| severities.contains(&r.severity.as_str()))
            .count()
    }
}
