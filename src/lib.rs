//! Datastore benchmark campaign driver.
//!
//! `dsbench` sweeps a matrix of benchmark parameters against a remote
//! RESTCONF benchmark service, averages the timings it reports over repeated
//! runs and writes the results to a CSV report.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod params;
pub mod report;
pub mod sweep;
pub mod ui;

pub use error::{BenchError, Result};
