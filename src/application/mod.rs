//! Application layer: services and background jobs built on the domain.
//!
//! - [`services::link_service::LinkService`] - Short link creation and lookup
//! - [`link_monitor::LinkMonitor`] - Periodic reachability checks of every link
//! - [`prober`] - HTTP reachability probe used by the monitor

pub mod link_monitor;
pub mod prober;
pub mod services;
