//! Personal-best timeline aggregation
//!
//! Runs are folded in four stages, each producing a new value:
//!
//! 1. [`index_runs`]: date axis (first-occurrence order) and the raw time each
//!    participant recorded per date. Later runs on the same date overwrite.
//! 2. [`RecordIndex::forward_fill`]: one row per participant aligned to the
//!    axis, carrying the last known time forward into empty dates.
//! 3. [`Timeline::truncate_top`]: per date, clear every cell ranked N or worse.
//! 4. [`Timeline::prune_empty`]: drop rows with nothing left to show.
//!
//! The input order matters: it is assumed to be ascending by submission.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::ValidationError;
use crate::models::Run;

/// Minutes truncated (not rounded) to two decimals.
pub fn minutes_floor(seconds: f64) -> f64 {
    (seconds * 100.0 / 60.0).floor() / 100.0
}

/// Display names joined with `", "`; the aggregation grain.
pub fn participant_key(run: &Run) -> Result<String, ValidationError> {
    run.player_names()
        .map(|names| names.join(", "))
        .ok_or_else(|| ValidationError::MissingPlayers {
            run_id: run.id.clone(),
        })
}

fn run_minutes(run: &Run) -> Result<f64, ValidationError> {
    let seconds = run
        .primary_seconds()
        .ok_or_else(|| ValidationError::MissingDuration {
            run_id: run.id.clone(),
        })?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ValidationError::InvalidDuration {
            run_id: run.id.clone(),
            seconds,
        });
    }
    Ok(minutes_floor(seconds))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecords {
    pub participant: String,
    pub by_date: HashMap<NaiveDate, f64>,
}

/// Stage 1 output: raw recorded times, not yet aligned
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordIndex {
    pub dates: Vec<NaiveDate>,
    /// Participants in order of first appearance
    pub participants: Vec<ParticipantRecords>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub participant: String,
    /// One cell per entry of the date axis
    pub cells: Vec<Option<f64>>,
}

impl TimelineRow {
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// Participant x date matrix sharing one date axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<TimelineRow>,
}

/// Build the date axis and raw per-date times. Runs without a date are skipped.
pub fn index_runs<'a, I>(runs: I) -> Result<RecordIndex, ValidationError>
where
    I: IntoIterator<Item = &'a Run>,
{
    let mut index = RecordIndex::default();
    let mut seen_dates: HashSet<NaiveDate> = HashSet::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for run in runs {
        let Some(date) = run.date else {
            continue;
        };
        let key = participant_key(run)?;
        let minutes = run_minutes(run)?;

        if seen_dates.insert(date) {
            index.dates.push(date);
        }

        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                index.participants.push(ParticipantRecords {
                    participant: key.clone(),
                    by_date: HashMap::new(),
                });
                slots.insert(key, index.participants.len() - 1);
                index.participants.len() - 1
            }
        };
        index.participants[slot].by_date.insert(date, minutes);
    }

    Ok(index)
}

/// Carry each known value forward into following empty cells. Never backward.
pub fn fill_row(cells: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled: Vec<Option<f64>> = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        let value = match cell {
            Some(v) => Some(*v),
            None if i > 0 => filled[i - 1],
            None => None,
        };
        filled.push(value);
    }
    filled
}

impl RecordIndex {
    pub fn forward_fill(self) -> Timeline {
        let rows = self
            .participants
            .into_iter()
            .map(|p| {
                let recorded: Vec<Option<f64>> = self
                    .dates
                    .iter()
                    .map(|d| p.by_date.get(d).copied())
                    .collect();
                TimelineRow {
                    participant: p.participant,
                    cells: fill_row(&recorded),
                }
            })
            .collect();

        Timeline {
            dates: self.dates,
            rows,
        }
    }
}

/// Ascending by time, empty cells last, ties broken by participant key.
fn rank_order(a: &TimelineRow, b: &TimelineRow, col: usize) -> Ordering {
    let by_value = match (a.cells[col], b.cells[col]) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_value.then_with(|| a.participant.cmp(&b.participant))
}

impl Timeline {
    /// Keep only the `n` best cells in every date column; `n == 0` is a no-op.
    pub fn truncate_top(mut self, n: usize) -> Timeline {
        if n == 0 {
            return self;
        }

        for col in 0..self.dates.len() {
            let mut order: Vec<usize> = (0..self.rows.len()).collect();
            order.sort_by(|&a, &b| rank_order(&self.rows[a], &self.rows[b], col));
            for &idx in order.iter().skip(n) {
                self.rows[idx].cells[col] = None;
            }
        }

        self
    }

    pub fn prune_empty(mut self) -> Timeline {
        self.rows.retain(|row| !row.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Full aggregation: index, fill, optional top-N truncation, prune.
pub fn aggregate<'a, I>(runs: I, top: Option<usize>) -> Result<Timeline, ValidationError>
where
    I: IntoIterator<Item = &'a Run>,
{
    let filled = index_runs(runs)?.forward_fill();
    let truncated = match top {
        Some(n) => filled.truncate_top(n),
        None => filled,
    };
    Ok(truncated.prune_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Player, Players, RunTimes};

    pub(crate) fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn run(id: &str, date: Option<&str>, seconds: f64, players: &[&str]) -> Run {
        Run {
            id: id.to_string(),
            weblink: Some(format!("https://www.speedrun.com/run/{}", id)),
            date: date.map(day),
            submitted: None,
            times: Some(RunTimes {
                primary_t: Some(seconds),
            }),
            players: Players::Embedded {
                data: players
                    .iter()
                    .map(|name| Player::Guest {
                        name: name.to_string(),
                    })
                    .collect(),
            },
            values: HashMap::new(),
        }
    }

    fn row<'a>(timeline: &'a Timeline, who: &str) -> Option<&'a [Option<f64>]> {
        timeline
            .rows
            .iter()
            .find(|r| r.participant == who)
            .map(|r| r.cells.as_slice())
    }

    #[test]
    fn minutes_are_truncated() {
        assert_eq!(minutes_floor(90.0), 1.5);
        assert_eq!(minutes_floor(60.0), 1.0);
        assert_eq!(minutes_floor(80.0), 1.33);
        assert_eq!(minutes_floor(1379.9), 22.99);
    }

    #[test]
    fn top_one_scenario() {
        let runs = vec![
            run("1", Some("2024-01-01"), 90.0, &["A"]),
            run("2", Some("2024-01-01"), 60.0, &["B"]),
            run("3", Some("2024-01-02"), 80.0, &["B"]),
        ];

        let timeline = aggregate(&runs, Some(1)).unwrap();

        assert_eq!(timeline.dates, vec![day("2024-01-01"), day("2024-01-02")]);
        assert_eq!(timeline.rows.len(), 1);
        assert_eq!(row(&timeline, "B"), Some(&[Some(1.0), Some(1.33)][..]));
        assert!(row(&timeline, "A").is_none());
    }

    #[test]
    fn undated_runs_are_skipped() {
        let runs = vec![
            run("1", None, 30.0, &["A"]),
            run("2", Some("2024-03-01"), 120.0, &["B"]),
        ];

        let timeline = aggregate(&runs, None).unwrap();
        assert_eq!(timeline.dates, vec![day("2024-03-01")]);
        assert!(row(&timeline, "A").is_none());
        assert_eq!(row(&timeline, "B"), Some(&[Some(2.0)][..]));
    }

    #[test]
    fn date_axis_keeps_first_occurrence_order() {
        let runs = vec![
            run("1", Some("2024-02-01"), 60.0, &["A"]),
            run("2", Some("2024-01-01"), 60.0, &["B"]),
            run("3", Some("2024-02-01"), 60.0, &["C"]),
        ];
        let index = index_runs(&runs).unwrap();
        assert_eq!(index.dates, vec![day("2024-02-01"), day("2024-01-01")]);
    }

    #[test]
    fn last_run_on_a_date_wins() {
        let runs = vec![
            run("1", Some("2024-01-01"), 60.0, &["A"]),
            run("2", Some("2024-01-01"), 120.0, &["A"]),
        ];
        let timeline = aggregate(&runs, None).unwrap();
        assert_eq!(row(&timeline, "A"), Some(&[Some(2.0)][..]));
    }

    #[test]
    fn forward_fill_never_fills_backward() {
        let runs = vec![
            run("1", Some("2024-01-01"), 60.0, &["A"]),
            run("2", Some("2024-01-02"), 120.0, &["B"]),
            run("3", Some("2024-01-03"), 30.0, &["A"]),
            run("4", Some("2024-01-04"), 90.0, &["C"]),
        ];
        let timeline = aggregate(&runs, None).unwrap();

        assert_eq!(
            row(&timeline, "A"),
            Some(&[Some(1.0), Some(1.0), Some(0.5), Some(0.5)][..])
        );
        assert_eq!(
            row(&timeline, "B"),
            Some(&[None, Some(2.0), Some(2.0), Some(2.0)][..])
        );
        assert_eq!(row(&timeline, "C"), Some(&[None, None, None, Some(1.5)][..]));
    }

    #[test]
    fn fill_is_idempotent_on_full_rows() {
        let full = vec![Some(3.0), Some(2.5), Some(2.5), Some(1.0)];
        assert_eq!(fill_row(&full), full);

        let sparse = vec![None, Some(2.0), None, None, Some(1.0), None];
        let once = fill_row(&sparse);
        assert_eq!(fill_row(&once), once);
    }

    #[test]
    fn zero_seconds_is_a_value_not_a_gap() {
        let runs = vec![
            run("1", Some("2024-01-01"), 0.0, &["A"]),
            run("2", Some("2024-01-02"), 60.0, &["B"]),
        ];
        let timeline = aggregate(&runs, None).unwrap();
        assert_eq!(row(&timeline, "A"), Some(&[Some(0.0), Some(0.0)][..]));
    }

    #[test]
    fn ties_break_on_participant_key() {
        let runs = vec![
            run("1", Some("2024-01-01"), 60.0, &["zed"]),
            run("2", Some("2024-01-01"), 60.0, &["amy"]),
        ];
        let timeline = aggregate(&runs, Some(1)).unwrap();
        assert_eq!(timeline.rows.len(), 1);
        assert_eq!(timeline.rows[0].participant, "amy");
    }

    #[test]
    fn larger_top_only_adds_cells() {
        let runs = vec![
            run("1", Some("2024-01-01"), 300.0, &["A"]),
            run("2", Some("2024-01-01"), 240.0, &["B"]),
            run("3", Some("2024-01-02"), 200.0, &["C"]),
            run("4", Some("2024-01-03"), 180.0, &["A"]),
            run("5", Some("2024-01-03"), 250.0, &["D"]),
            run("6", Some("2024-01-04"), 100.0, &["E"]),
        ];
        let filled = index_runs(&runs).unwrap().forward_fill();

        let mut previous: Option<Timeline> = None;
        for n in 1..=6 {
            let current = filled.clone().truncate_top(n);
            for col in 0..current.dates.len() {
                let visible = current
                    .rows
                    .iter()
                    .filter(|r| r.cells[col].is_some())
                    .count();
                assert!(visible <= n);
                if let Some(prev) = &previous {
                    for (p, c) in prev.rows.iter().zip(current.rows.iter()) {
                        if p.cells[col].is_some() {
                            assert_eq!(p.cells[col], c.cells[col]);
                        }
                    }
                }
            }
            previous = Some(current);
        }
    }

    #[test]
    fn pruned_rows_are_never_empty() {
        let runs = vec![
            run("1", Some("2024-01-01"), 60.0, &["A"]),
            run("2", Some("2024-01-01"), 90.0, &["B"]),
            run("3", Some("2024-01-02"), 120.0, &["C"]),
            run("4", Some("2024-01-03"), 30.0, &["D"]),
        ];
        let timeline = aggregate(&runs, Some(1)).unwrap();

        assert!(timeline.rows.iter().all(|r| !r.is_empty()));
        let names: Vec<&str> = timeline.rows.iter().map(|r| r.participant.as_str()).collect();
        assert_eq!(names, vec!["A", "D"]);
    }

    #[test]
    fn top_zero_disables_truncation() {
        let runs = vec![
            run("1", Some("2024-01-01"), 60.0, &["A"]),
            run("2", Some("2024-01-01"), 90.0, &["B"]),
        ];
        assert_eq!(aggregate(&runs, Some(0)), aggregate(&runs, None));
    }

    #[test]
    fn co_op_runs_share_one_key() {
        let runs = vec![
            run("1", Some("2024-01-01"), 60.0, &["A", "B"]),
            run("2", Some("2024-01-02"), 50.0, &["A", "B"]),
            run("3", Some("2024-01-02"), 40.0, &["B", "A"]),
        ];
        let timeline = aggregate(&runs, None).unwrap();
        assert_eq!(
            row(&timeline, "A, B"),
            Some(&[Some(1.0), Some(0.83)][..])
        );
        assert!(row(&timeline, "B, A").is_some());
    }

    #[test]
    fn missing_duration_is_rejected() {
        let mut bad = run("x", Some("2024-01-01"), 60.0, &["A"]);
        bad.times = None;
        assert_eq!(
            aggregate(&[bad], None),
            Err(ValidationError::MissingDuration {
                run_id: "x".to_string()
            })
        );
    }

    #[test]
    fn non_finite_duration_is_rejected() {
        let bad = run("x", Some("2024-01-01"), f64::NAN, &["A"]);
        assert!(matches!(
            aggregate(&[bad], None),
            Err(ValidationError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn missing_players_are_rejected() {
        let mut bad = run("x", Some("2024-01-01"), 60.0, &["A"]);
        bad.players = Players::default();
        assert_eq!(
            aggregate(&[bad], None),
            Err(ValidationError::MissingPlayers {
                run_id: "x".to_string()
            })
        );
    }

    #[test]
    fn no_runs_no_rows() {
        let runs: Vec<Run> = Vec::new();
        let timeline = aggregate(&runs, Some(10)).unwrap();
        assert!(timeline.is_empty());
        assert!(timeline.dates.is_empty());
    }
}
