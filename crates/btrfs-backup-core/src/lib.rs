pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod planner;
pub mod progress;
pub mod scanner;
pub mod snapshot;

pub use config::AppConfig;
pub use engine::{BackupEngine, PairListing, Presence, RunSummary};
pub use error::{Error, Result};
pub use progress::{ProgressReporter, SilentReporter};
