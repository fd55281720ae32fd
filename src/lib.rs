//! Watches a list of HTTP endpoints.
//!
//! Each check probes every registered URL once, classifies the outcome, appends it to a
//! SQLite log and raises a local alert for anything that is not a plain `200 OK`.
//! The [`scheduler::Scheduler`] repeats checks in the background with start/stop control.

pub mod config;
pub mod engine;
pub mod http_probe;
pub mod notification;
pub mod registry;
pub mod scheduler;
pub mod store;

pub use engine::{CycleReport, EngineError, MonitorEngine};
pub use http_probe::prelude::*;
pub use registry::EndpointRegistry;
pub use scheduler::{Scheduler, SchedulerState};
