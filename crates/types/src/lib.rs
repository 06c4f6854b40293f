//! Domain types shared across the vigil monitoring core.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod event;
mod incident;
mod service;
mod status_log;

pub use event::MonitorEvent;
pub use incident::{Incident, IncidentSeverity, IncidentStatus};
pub use service::{Service, ServiceStatus};
pub use status_log::{ProbeStatus, StatusLogEntry};
