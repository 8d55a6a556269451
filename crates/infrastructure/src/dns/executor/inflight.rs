use crate::dns::cache::CacheKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tern_domain::{DomainError, Message};
use tracing::debug;

pub type QueryFuture = BoxFuture<'static, Result<Message, DomainError>>;

type Entries = DashMap<CacheKey, (u64, WeakShared<QueryFuture>), FxBuildHasher>;

/// At most one outstanding fetch per query identity.
///
/// Callers asking for a key that is already being fetched await the same
/// shared future. The registry only holds a weak handle: the fetch lives as
/// long as at least one caller is still waiting, and is dropped (cancelling
/// the network work under it) when the last one goes away. The entry is
/// removed as soon as the fetch settles or is dropped, so a later caller
/// always starts a fresh fetch.
#[derive(Default)]
pub struct InflightRegistry {
    entries: Arc<Entries>,
    generation: AtomicU64,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches currently outstanding.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Awaits the fetch for `key`, starting it with `fetch` unless one is
    /// already running.
    pub async fn run<F>(&self, key: CacheKey, fetch: F) -> Result<Message, DomainError>
    where
        F: FnOnce() -> QueryFuture,
    {
        let shared = self.join_or_start(key, fetch);
        shared.await
    }

    fn join_or_start<F>(&self, key: CacheKey, fetch: F) -> Shared<QueryFuture>
    where
        F: FnOnce() -> QueryFuture,
    {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if let Some(shared) = occupied.get().1.upgrade() {
                    debug!(key = %key, "Joining in-flight query");
                    return shared;
                }
                let (id, shared) = self.start(key, fetch);
                if let Some(weak) = shared.downgrade() {
                    occupied.insert((id, weak));
                }
                shared
            }
            Entry::Vacant(vacant) => {
                let (id, shared) = self.start(key, fetch);
                if let Some(weak) = shared.downgrade() {
                    vacant.insert((id, weak));
                }
                shared
            }
        }
    }

    fn start<F>(&self, key: CacheKey, fetch: F) -> (u64, Shared<QueryFuture>)
    where
        F: FnOnce() -> QueryFuture,
    {
        let id = self.generation.fetch_add(1, Ordering::Relaxed);
        let guard = RemoveOnDrop {
            entries: Arc::clone(&self.entries),
            key,
            id,
        };
        let request = fetch();
        let shared = async move {
            let _guard = guard;
            request.await
        }
        .boxed()
        .shared();
        (id, shared)
    }
}

/// Clears the registry entry of one fetch generation once that fetch
/// settles or is dropped.
struct RemoveOnDrop {
    entries: Arc<Entries>,
    key: CacheKey,
    id: u64,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        self.entries
            .remove_if(&self.key, |_, (generation, _)| *generation == self.id);
    }
}
