//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - PostgreSQL link storage
//! - [`PgClickRepository`] - PostgreSQL click storage and counting
//! - [`InMemoryStore`] - Process-local fallback implementing both traits

pub mod memory;
pub mod pg_click_repository;
pub mod pg_link_repository;

pub use memory::InMemoryStore;
pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
