//! Domain layer: entities, storage contracts and the concurrent core.
//!
//! # Modules
//!
//! - [`entities`] - Link and click data structures
//! - [`repositories`] - Storage trait definitions
//! - [`click_record`] - Redirect event awaiting persistence
//! - [`click_queue`] - Bounded drop-on-full ingestion queue
//! - [`click_worker`] - Worker pool persisting queued clicks
//! - [`rate_limiter`] - Per-key sliding-window admission control
//! - [`liveness`] - Last-known reachability table used by the link monitor
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler builds a [`click_record::ClickRecord`]
//! 2. [`click_queue::ClickQueue::enqueue`] buffers it or drops it when full
//! 3. A [`click_worker::ClickWorkerPool`] worker takes it off the queue
//! 4. The click is persisted via [`repositories::ClickRepository`]

pub mod click_queue;
pub mod click_record;
pub mod click_worker;
pub mod entities;
pub mod liveness;
pub mod rate_limiter;
pub mod repositories;
