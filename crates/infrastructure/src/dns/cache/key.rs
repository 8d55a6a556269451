use compact_str::CompactString;
use std::fmt;
use tern_domain::{DnsQuery, Record, RecordClass, RecordType};

/// Record identity: (name, type, class) with the name lower-cased and
/// stripped of a trailing dot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub class: RecordClass,
}

impl CacheKey {
    #[inline]
    pub fn new(name: &str, record_type: RecordType, class: RecordClass) -> Self {
        let name = name.strip_suffix('.').unwrap_or(name);
        Self {
            name: CompactString::from(name.to_ascii_lowercase()),
            record_type,
            class,
        }
    }

    #[inline]
    pub fn from_query(query: &DnsQuery) -> Self {
        Self::new(&query.name, query.record_type, query.class)
    }

    #[inline]
    pub fn from_record(record: &Record) -> Self {
        Self::new(&record.name, record.record_type, record.class)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.record_type)
    }
}
