//! Small helpers shared by the service and HTTP layers.
//!
//! - [`code_generator`] - Random short code generation
//! - [`client_ip`] - Client address resolution from a request

pub mod client_ip;
pub mod code_generator;
