//! Core domain entities.
//!
//! - [`Link`] - A shortened URL mapping with its liveness flag
//! - [`Click`] - A persisted redirect event
//!
//! Creation inputs use separate structs ([`NewLink`]); clicks are created from
//! [`crate::domain::click_record::ClickRecord`].

pub mod click;
pub mod link;

pub use click::Click;
pub use link::{Link, NewLink};
