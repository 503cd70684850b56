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

//! Heuristic log parsing and ensemble anomaly detection.

pub mod anomaly;
pub mod core;
pub mod insights;
pub mod parser;
pub mod store;

pub use self::anomaly::{create_default_scorer, Detection, EnsembleScorer, ScoringMethod};
pub use self::core::{LogFilter, LogTable};
pub use self::insights::{anomaly_summary, AnomalySummary};
pub use self::parser::{parse_content, parsing_stats, ParseStats};
