use smallvec::SmallVec;
use tern_domain::Record;

/// Records sharing one identity, with a single expiry for the group.
///
/// Every insert sets `expires = now + ttl`; the last write wins even when
/// it moves the expiry earlier.
#[derive(Debug, Clone, Default)]
pub struct RecordBag {
    records: SmallVec<[Record; 4]>,
    expires: u64,
}

impl RecordBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` observed at `now`. A record with the same data replaces
    /// the earlier copy.
    pub fn add(&mut self, record: Record, now: u64) {
        self.expires = now.saturating_add(record.ttl as u64);
        match self.records.iter_mut().find(|r| r.data == record.data) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn expires(&self) -> u64 {
        self.expires
    }

    /// Stale once the current time is past `expires`.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copies of the records with their TTL counted down to `now`.
    pub fn records_at(&self, now: u64) -> Vec<Record> {
        let remaining = self.expires.saturating_sub(now).min(u32::MAX as u64) as u32;
        self.records
            .iter()
            .map(|r| {
                let mut record = r.clone();
                record.ttl = remaining;
                record
            })
            .collect()
    }
}
