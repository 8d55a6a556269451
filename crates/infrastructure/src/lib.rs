//! Tern infrastructure: transports, decorator executors, record cache and
//! the chain builder that wires them together.
pub mod dns;
