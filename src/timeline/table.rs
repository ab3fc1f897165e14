//! Rectangular grids for spreadsheet ingestion

use chrono::SecondsFormat;
use serde::Serialize;
use std::fmt;

use super::aggregator::{participant_key, Timeline};
use crate::models::Run;

pub const PLAYER_HEADER: &str = "Player";
pub const LISTING_HEADERS: [&str; 6] = [
    "Date (of submission)",
    "Time (of submission)",
    "Player",
    "Time (minutes)",
    "Link",
    "Datetime",
];
const NOT_AVAILABLE: &str = "N/A";

/// One grid cell. `Absent` is kept distinct from zero and from empty text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Absent,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Absent)
    }
}

/// Renders the spreadsheet value; `Absent` renders as nothing.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Absent => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn header(&self) -> Option<&[Cell]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header
    pub fn body(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .map(|c| c.to_string().replace(['\t', '\n', '\r'], " "))
                .collect();
            out.push_str(&line.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|c| csv_field(&c.to_string())).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// `["Player", date0, date1, ...]` followed by one row per participant.
pub fn timeline_table(timeline: &Timeline) -> Table {
    let mut header = Vec::with_capacity(timeline.dates.len() + 1);
    header.push(Cell::text(PLAYER_HEADER));
    header.extend(
        timeline
            .dates
            .iter()
            .map(|d| Cell::Text(d.format("%Y-%m-%d").to_string())),
    );

    let mut rows = Vec::with_capacity(timeline.rows.len() + 1);
    rows.push(header);
    for row in &timeline.rows {
        let mut line = Vec::with_capacity(row.cells.len() + 1);
        line.push(Cell::text(row.participant.as_str()));
        line.extend(row.cells.iter().map(|c| Cell::from(*c)));
        rows.push(line);
    }

    Table { rows }
}

/// One row per run with submission date/time, players, minutes and link.
/// No runs gives an empty grid, without a header row.
pub fn run_listing_table<'a, I>(runs: I) -> Table
where
    I: IntoIterator<Item = &'a Run>,
{
    let body: Vec<Vec<Cell>> = runs.into_iter().map(listing_row).collect();
    if body.is_empty() {
        return Table::default();
    }

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(body.len() + 1);
    rows.push(LISTING_HEADERS.iter().map(|h| Cell::text(*h)).collect());
    rows.extend(body);
    Table { rows }
}

fn listing_row(run: &Run) -> Vec<Cell> {
    let (date, time, datetime) = match run.submitted {
        Some(ts) => (
            ts.format("%Y-%m-%d").to_string(),
            ts.format("%H:%M:%S").to_string(),
            ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        None => (
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    };

    vec![
        Cell::Text(date),
        Cell::Text(time),
        participant_key(run).map(Cell::Text).unwrap_or(Cell::Absent),
        Cell::from(run.primary_seconds().map(|s| s / 60.0)),
        run.weblink.clone().map(Cell::Text).unwrap_or(Cell::Absent),
        Cell::Text(datetime),
    ]
}
