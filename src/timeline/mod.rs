//! Filter → aggregate → tabulate

pub mod aggregator;
pub mod filter;
pub mod table;

pub use aggregator::{aggregate, Timeline, TimelineRow};
pub use filter::filter_runs;
pub use table::{run_listing_table, timeline_table, Cell, Table};
