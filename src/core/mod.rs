pub mod config;
pub mod error;
pub mod types;

pub use config::SchedulerConfig;
pub use error::{Result, TurnError};
