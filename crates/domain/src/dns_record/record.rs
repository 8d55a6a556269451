use super::{RecordClass, RecordData, RecordType};

/// A resource record as found in the answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub name: String,
    pub record_type: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        class: RecordClass,
        ttl: u32,
        data: RecordData,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            class,
            ttl,
            data,
        }
    }

    /// Builds an `IN` record whose type follows from the shape of `data`.
    /// Raw data falls back to `RecordType::Unknown(0)`.
    pub fn in_class(name: impl Into<String>, ttl: u32, data: RecordData) -> Self {
        let record_type = data.natural_type().unwrap_or(RecordType::Unknown(0));
        Self::new(name, record_type, RecordClass::IN, ttl, data)
    }

    /// MX and SRV preference, if any.
    pub fn priority(&self) -> Option<u16> {
        self.data.priority()
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_expired(&self, elapsed_secs: u64) -> bool {
        elapsed_secs >= self.ttl as u64
    }

    pub fn remaining_ttl(&self, elapsed_secs: u64) -> u32 {
        (self.ttl as u64).saturating_sub(elapsed_secs) as u32
    }
}
