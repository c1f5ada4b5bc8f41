pub mod cache;
pub mod cli;
pub mod config;
pub mod generator;
pub mod graph;
pub mod i18n;
pub mod llm;
pub mod retrieval;
pub mod telemetry;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::workflow::{RunRequest, RunSummary, launch};
