//! Background Tasks Module
//!
//! Periodic jobs started by the server and aborted at shutdown.
//!
//! # Tasks
//! - Cache sweep: drops expired entries and flushes queued batch requests
//! - Report: logs a condensed performance report

mod cleanup;
mod report;

pub use cleanup::spawn_cleanup_task;
pub use report::spawn_report_task;
