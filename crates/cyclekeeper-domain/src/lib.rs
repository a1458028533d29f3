//! Cyclekeeper Domain Layer
//!
//! Core vocabulary shared by the housekeeping engine and the command-line tool.
//! Nothing in here touches the filesystem or spawns processes.
//!
//! ## Key Concepts
//!
//! - **Cycle time**: a 10-digit `YYYYMMDDHH` stamp naming one run of a cycling
//!   data-production pipeline (e.g. a forecast run)
//! - **Operation**: what to do with an old enough entry (copy, move or delete)
//! - **Environment**: variable bindings defined by a rule file and handed to
//!   every action handler process
//!
//! ## Architecture
//!
//! - Pure logic, no I/O
//! - `chrono` for calendar arithmetic, `thiserror` for the error type
//! - Infrastructure (directory scans, process spawning) lives in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cycle_time;
pub mod environment;
pub mod operation;

// Re-exports for convenience
pub use cycle_time::{CycleTime, CycleTimeError};
pub use environment::{Environment, Fragment};
pub use operation::Operation;
