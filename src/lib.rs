//! Leaderboard Timeline Library
//!
//! Pulls every verified run of a speedrun.com leaderboard, filters it down to
//! one sub-category and turns it into a personal-best progression table
//! (participant x date) ready for a spreadsheet.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod sink;
pub mod timeline;

pub use config::Config;
pub use error::{ApiError, PipelineError, ValidationError};
pub use models::{LeaderboardSelection, Run, VariableConstraint};
pub use pipeline::{listing_report, timeline_report, Report};
