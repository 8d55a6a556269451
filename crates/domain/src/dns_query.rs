use crate::dns_record::{RecordClass, RecordType};
use std::fmt;
use std::sync::Arc;

/// A question: (name, type, class).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsQuery {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub class: RecordClass,
}

impl DnsQuery {
    pub fn new(name: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            class: RecordClass::IN,
        }
    }

    pub fn with_class(mut self, class: RecordClass) -> Self {
        self.class = class;
        self
    }

    /// Identity comparison used for caching and dedup: names compare
    /// case-insensitively.
    pub fn same_identity(&self, other: &DnsQuery) -> bool {
        self.record_type == other.record_type
            && self.class == other.class
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for DnsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class == RecordClass::IN {
            write!(f, "{} ({})", self.name, self.record_type)
        } else {
            write!(f, "{} ({} {})", self.name, self.class, self.record_type)
        }
    }
}
