pub mod batch;
pub mod config;
pub mod free_card;
pub mod report;
pub mod search;

pub use batch::{chunk_ranges, run_batch};
pub use config::{ConfigError, SimulationConfig};
pub use free_card::{is_usable, resolve, Resolution, ResolveError};
pub use report::{CardStats, ConditionStats, FreeCardStats, MergeError, Report, ReportBuilder};
pub use search::{run_trial, search, BranchRecord, SearchResult, SimulationError, TrialOutcome};
