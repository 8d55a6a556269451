//! Tern application layer: executor ports and the resolver use case.
pub mod ports;
pub mod use_cases;
