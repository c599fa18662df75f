//! # Ignition
//!
//! Error reporting integration for long-lived application workers.
//!
//! ## Features
//!
//! - Bounded recorders for queries, log messages, queue jobs and dumps
//! - Solution providers that suggest fixes for well known errors, with
//!   "did you mean" suggestions for mistyped routes, views and rules
//! - A Flare client that enriches reports through a middleware pipeline
//!   and delivers them over HTTP
//! - Explicit per-worker lifecycle with resets at unit-of-work boundaries
//! - A `tracing` layer that records and reports the host's log events

pub mod captured;
pub mod config;
pub mod error;
pub mod flare;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
pub mod recorders;
pub mod report;
pub mod sanitization;
pub mod similarity;
pub mod solutions;
pub mod transport;

// Re-export commonly used types
pub use captured::{capture_stacktrace, CapturedError, StackFrame};
pub use config::IgnitionConfig;
pub use error::{IgnitionError, Result};
pub use flare::{Flare, SentReports};
pub use lifecycle::{Ignition, IgnitionBuilder, WorkerEvent};
pub use logging::{init_logging, CaptureLayer, LoggingConfig};
pub use recorders::{Recorder, Recorders};
pub use report::Report;
pub use similarity::{NameSimilarityRanker, DEFAULT_SIMILARITY_THRESHOLD};
pub use solutions::{KnownNames, NameCatalog, NameRegistry, Solution, SolutionProvider, SolutionProviderRepository};
pub use transport::{HttpTransport, ReportTransport};

/// Loads configuration, installs logging with log capture and boots Ignition
///
/// Hosts that manage their own subscriber should use [`Ignition::from_config`]
/// and add [`Ignition::capture_layer`] themselves.
pub fn init(config: IgnitionConfig) -> Result<Ignition> {
    let ignition = Ignition::from_config(config)?;
    init_logging(&ignition.config().logging, Some(ignition.capture_layer()))?;
    ignition.boot();
    Ok(ignition)
}
