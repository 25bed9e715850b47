pub mod approval;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod export;
pub mod flight;
pub mod listing;
pub mod run;
pub mod services;
pub mod session;
pub mod tags;

#[cfg(test)]
mod mock;

// Re-export error types for convenience
pub use error::{Error, Result};
