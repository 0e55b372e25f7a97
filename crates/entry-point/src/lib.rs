//! Entry point (dispatcher) of delegated, access-controlled accounts.
//!
//! Validates user operations with a chain of composable checks and executes them in batches
//! against the in-memory ledger, isolating failures per operation.

pub mod config;
mod entry_point;
pub mod error;
pub mod gas;
mod metrics;
pub mod validate;

pub use config::EntryPointConfig;
pub use entry_point::{EntryPoint, UserOperationOutcome};
pub use error::{ConfigError, EntryPointError, ExecutionError, FailureKind, ValidationError};
pub use gas::{GasSchedule, Overhead};
pub use crate::metrics::describe_entry_point_metrics;
pub use validate::{ValidationCheck, ValidationMode};
