use super::key::CacheKey;
use super::record_bag::RecordBag;
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tern_domain::{DnsQuery, Message, Record};
use tracing::debug;

/// The answer set a query produced: the identities of its records in
/// answer order, valid until the smallest TTL among them runs out.
#[derive(Debug, Clone)]
struct AnswerSet {
    keys: Vec<CacheKey>,
    expires: u64,
}

/// TTL-aware record store keyed by (name, type, class).
///
/// Bags are stored under each record's own identity. A query whose answer
/// went through aliases additionally remembers which bags made up the
/// answer, so a later hit skips re-walking the chain.
pub struct RecordCache {
    bags: DashMap<CacheKey, RecordBag, FxBuildHasher>,
    answers: DashMap<CacheKey, AnswerSet, FxBuildHasher>,
    max_entries: usize,
}

impl RecordCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            bags: DashMap::with_capacity_and_hasher(max_entries.min(4096), FxBuildHasher),
            answers: DashMap::with_hasher(FxBuildHasher),
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the cached answer for `query` with TTLs counted down to `now`,
    /// or `None` when nothing fresh is stored.
    pub fn lookup(&self, query: &DnsQuery, now: u64) -> Option<Vec<Record>> {
        let key = CacheKey::from_query(query);

        // the shard guard must be gone before `remove` takes the write lock
        let cached = self
            .answers
            .get(&key)
            .map(|set| (set.expires, set.keys.clone()));

        let keys = match cached {
            Some((expires, keys)) if now <= expires => keys,
            Some(_) => {
                self.answers.remove(&key);
                vec![key]
            }
            None => vec![key],
        };

        let mut records = Vec::new();
        for key in &keys {
            let bag = self.bags.get(key)?;
            if bag.is_expired(now) {
                drop(bag);
                self.bags.remove(key);
                return None;
            }
            records.extend(bag.records_at(now));
        }

        if records.is_empty() {
            return None;
        }
        Some(records)
    }

    /// Stores the answer section of a successful response observed at
    /// `now`. Error responses and zero-TTL records are not kept.
    ///
    /// Returns the number of records stored.
    pub fn store_message(&self, now: u64, message: &Message) -> usize {
        if !message.rcode().is_ok() {
            return 0;
        }
        let Some(question) = message.question() else {
            return 0;
        };

        let mut keys: Vec<CacheKey> = Vec::new();
        let mut stored = 0;
        let mut complete = true;

        for record in &message.answers {
            if record.ttl == 0 {
                complete = false;
                continue;
            }
            let key = CacheKey::from_record(record);
            {
                let mut bag = self.bags.entry(key.clone()).or_default();
                if bag.is_expired(now) {
                    *bag = RecordBag::new();
                }
                bag.add(record.clone(), now);
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
            stored += 1;
        }

        let query_key = CacheKey::from_query(question);
        let only_self = keys.len() == 1 && keys[0] == query_key;
        if complete && !keys.is_empty() && !only_self {
            if let Some(min_ttl) = message.min_answer_ttl() {
                self.answers.insert(
                    query_key,
                    AnswerSet {
                        keys,
                        expires: now.saturating_add(min_ttl as u64),
                    },
                );
            }
        }

        self.enforce_capacity();
        stored
    }

    /// Drops every bag and answer set that is stale at `now`. Returns the
    /// number of bags removed.
    pub fn expire(&self, now: u64) -> usize {
        let before = self.bags.len();
        self.bags.retain(|_, bag| !bag.is_expired(now));
        self.answers.retain(|_, set| now <= set.expires);
        let removed = before.saturating_sub(self.bags.len());
        if removed > 0 {
            debug!(removed, remaining = self.bags.len(), "Expired cached records");
        }
        removed
    }

    /// Number of record bags held.
    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    pub fn clear(&self) {
        self.bags.clear();
        self.answers.clear();
    }

    /// Number of query → answer-set associations held.
    pub fn answer_sets(&self) -> usize {
        self.answers.len()
    }

    /// Evicts a batch once a map outgrows `max_entries`, so the scan cost is
    /// spread over the inserts that follow.
    fn enforce_capacity(&self) {
        let batch = (self.max_entries / EVICTION_BATCH_DIVISOR).max(1);

        let len = self.bags.len();
        if len > self.max_entries {
            let count = (len - self.max_entries).max(batch);
            let evicted: FxHashSet<CacheKey> =
                oldest_sampled(&self.bags, count, RecordBag::expires)
                    .into_iter()
                    .collect();
            for key in &evicted {
                self.bags.remove(key);
            }
            self.answers
                .retain(|_, set| !set.keys.iter().any(|key| evicted.contains(key)));
            debug!(evicted = evicted.len(), "Cache over capacity");
        }

        let len = self.answers.len();
        if len > self.max_entries {
            let count = (len - self.max_entries).max(batch);
            for key in oldest_sampled(&self.answers, count, |set| set.expires) {
                self.answers.remove(&key);
            }
        }
    }
}

/// Divides `max_entries` into the eviction batch size.
const EVICTION_BATCH_DIVISOR: usize = 10;

/// Entries scanned per eviction slot.
const EVICTION_SAMPLE_SIZE: usize = 8;

/// Picks up to `count` keys with the earliest expiry among a bounded sample
/// of `map`. The iterator is released before the caller removes anything.
fn oldest_sampled<V>(
    map: &DashMap<CacheKey, V, FxBuildHasher>,
    count: usize,
    expires: impl Fn(&V) -> u64,
) -> Vec<CacheKey> {
    let mut sampled: Vec<(u64, CacheKey)> = map
        .iter()
        .take(count.saturating_mul(EVICTION_SAMPLE_SIZE))
        .map(|entry| (expires(entry.value()), entry.key().clone()))
        .collect();
    sampled.sort_unstable_by_key(|(expires, _)| *expires);
    sampled.into_iter().take(count).map(|(_, key)| key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_domain::{RecordData, RecordType, ResponseCode};

    fn a(name: &str, ip: &str, ttl: u32) -> Record {
        Record::in_class(name, ttl, RecordData::A(ip.parse().unwrap()))
    }

    fn response(query: &DnsQuery, answers: Vec<Record>) -> Message {
        Message::response_for(query.clone(), answers)
    }

    #[test]
    fn test_hit_until_expiry() {
        let cache = RecordCache::new(100);
        let query = DnsQuery::new("example.com", RecordType::A);
        cache.store_message(1000, &response(&query, vec![a("example.com", "1.2.3.4", 60)]));

        let hit = cache.lookup(&query, 1030).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].ttl, 30);

        assert!(cache.lookup(&query, 1060).is_some());
        assert!(cache.lookup(&query, 1061).is_none());
    }

    #[test]
    fn test_lookup_ignores_name_case() {
        let cache = RecordCache::new(100);
        let query = DnsQuery::new("example.com", RecordType::A);
        cache.store_message(0, &response(&query, vec![a("example.com", "1.2.3.4", 60)]));

        assert!(cache.lookup(&DnsQuery::new("EXAMPLE.com", RecordType::A), 1).is_some());
        assert!(cache.lookup(&DnsQuery::new("example.com", RecordType::AAAA), 1).is_none());
    }

    #[test]
    fn test_alias_chain_is_served_from_answer_set() {
        let cache = RecordCache::new(100);
        let query = DnsQuery::new("www.example.com", RecordType::A);
        let answers = vec![
            Record::in_class("www.example.com", 300, RecordData::Cname("example.com".into())),
            a("example.com", "1.2.3.4", 60),
        ];
        assert_eq!(cache.store_message(0, &response(&query, answers)), 2);
        assert_eq!(cache.len(), 2);

        let hit = cache.lookup(&query, 10).unwrap();
        assert_eq!(hit.len(), 2);
        assert_eq!(hit[0].record_type, RecordType::CNAME);

        // The target's own identity is cached too.
        assert!(cache.lookup(&DnsQuery::new("example.com", RecordType::A), 10).is_some());
        assert_eq!(cache.answer_sets(), 1);

        assert!(cache.lookup(&query, 61).is_none());
        assert_eq!(cache.answer_sets(), 0);
        // the shard is usable again after the stale set was dropped
        assert!(cache.lookup(&query, 62).is_none());
    }

    #[test]
    fn test_stale_answer_set_lookup_returns_from_other_thread() {
        let cache = std::sync::Arc::new(RecordCache::new(100));
        let query = DnsQuery::new("www.example.com", RecordType::A);
        cache.store_message(
            0,
            &response(
                &query,
                vec![
                    Record::in_class("www.example.com", 300, RecordData::Cname("example.com".into())),
                    a("example.com", "1.2.3.4", 60),
                ],
            ),
        );

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = cache.clone();
        std::thread::spawn(move || {
            let _ = tx.send(worker.lookup(&query, 61).is_none());
        });

        let missed = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("lookup did not return");
        assert!(missed);
    }

    #[test]
    fn test_capacity_bounds_answer_sets() {
        let cache = RecordCache::new(2);
        let mut last = None;
        for i in 0..50u64 {
            let alias = format!("alias{}.example", i);
            let target = format!("target{}.example", i);
            let query = DnsQuery::new(alias.as_str(), RecordType::A);
            cache.store_message(
                i,
                &response(
                    &query,
                    vec![
                        Record::in_class(alias.as_str(), 300, RecordData::Cname(target.clone())),
                        a(&target, "10.0.0.1", 300),
                    ],
                ),
            );
            assert!(cache.len() <= 2);
            assert!(cache.answer_sets() <= 2);
            last = Some(query);
        }

        let last = last.unwrap();
        assert_eq!(cache.lookup(&last, 49).map(|records| records.len()), Some(2));
    }

    #[test]
    fn test_evicted_bag_drops_answer_sets_using_it() {
        let cache = RecordCache::new(2);
        let www = DnsQuery::new("www.example.com", RecordType::A);
        cache.store_message(
            0,
            &response(
                &www,
                vec![
                    Record::in_class("www.example.com", 30, RecordData::Cname("example.com".into())),
                    a("example.com", "1.2.3.4", 30),
                ],
            ),
        );
        assert_eq!(cache.answer_sets(), 1);

        let other = DnsQuery::new("other.example", RecordType::A);
        cache.store_message(0, &response(&other, vec![a("other.example", "5.6.7.8", 600)]));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.answer_sets(), 0);
        assert!(cache.lookup(&other, 1).is_some());
    }

    #[test]
    fn test_errors_and_zero_ttl_are_not_stored() {
        let cache = RecordCache::new(100);
        let query = DnsQuery::new("example.com", RecordType::A);

        let mut nx = response(&query, vec![a("example.com", "1.2.3.4", 60)]);
        nx.header.rcode = ResponseCode::NxDomain;
        assert_eq!(cache.store_message(0, &nx), 0);

        assert_eq!(
            cache.store_message(0, &response(&query, vec![a("example.com", "1.2.3.4", 0)])),
            0
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expire_purges_stale_bags() {
        let cache = RecordCache::new(100);
        let short = DnsQuery::new("short.example", RecordType::A);
        let long = DnsQuery::new("long.example", RecordType::A);
        cache.store_message(0, &response(&short, vec![a("short.example", "1.1.1.1", 10)]));
        cache.store_message(0, &response(&long, vec![a("long.example", "2.2.2.2", 100)]));

        assert_eq!(cache.expire(50), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&long, 50).is_some());
    }

    #[test]
    fn test_capacity_evicts_oldest_expiry() {
        let cache = RecordCache::new(2);
        for (i, ttl) in [30u32, 10, 20].into_iter().enumerate() {
            let name = format!("h{}.example", i);
            let query = DnsQuery::new(name.as_str(), RecordType::A);
            cache.store_message(0, &response(&query, vec![a(&name, "1.1.1.1", ttl)]));
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(&DnsQuery::new("h1.example", RecordType::A), 0).is_none());
        assert!(cache.lookup(&DnsQuery::new("h0.example", RecordType::A), 0).is_some());
    }
}
