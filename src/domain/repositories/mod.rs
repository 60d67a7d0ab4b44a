//! Repository trait definitions for the domain layer.
//!
//! These traits are the only storage interface the click pipeline, the
//! liveness monitor and the link service depend on. Implementations live in
//! `crate::infrastructure::persistence`; mocks are generated with `mockall`
//! for unit tests.
//!
//! - [`LinkRepository`] - create, find by code, list all, update
//! - [`ClickRepository`] - create, count by link

pub mod click_repository;
pub mod link_repository;

pub use click_repository::ClickRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
