//! Tern domain layer: DNS data model, wire codec and configuration.
pub mod config;
pub mod dns_message;
pub mod dns_protocol;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod hosts;
pub mod wire;

pub use config::{CliOverrides, Config, ConfigError, ResolverStrategy};
pub use dns_message::{Header, Message, Opcode, ResponseCode};
pub use dns_protocol::DnsProtocol;
pub use dns_query::DnsQuery;
pub use dns_record::{Record, RecordClass, RecordData, RecordType};
pub use errors::DomainError;
pub use hosts::HostsTable;
