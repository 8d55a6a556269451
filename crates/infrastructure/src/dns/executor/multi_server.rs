use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Races a query across several executors with staggered starts.
///
/// Each call starts at the next executor in round-robin order. Another
/// executor joins the race every `stagger` while nothing has settled, or
/// immediately when an attempt fails. The first success wins and the
/// remaining attempts are dropped; if every attempt fails the last error
/// is returned.
pub struct MultiServerExecutor {
    executors: Vec<Arc<dyn DnsExecutor>>,
    stagger: Duration,
    next: AtomicUsize,
}

impl MultiServerExecutor {
    pub const DEFAULT_STAGGER: Duration = Duration::from_millis(50);

    pub fn new(executors: Vec<Arc<dyn DnsExecutor>>, stagger: Duration) -> Result<Self, DomainError> {
        if executors.is_empty() {
            return Err(DomainError::ConfigError(
                "multi-server executor needs at least one executor".to_string(),
            ));
        }
        Ok(Self {
            executors,
            stagger,
            next: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

#[async_trait]
impl DnsExecutor for MultiServerExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let total = self.executors.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % total;
        let executors = &self.executors;
        let attempt = move |n: usize| executors[(start + n) % total].query(query);

        let mut pending = FuturesUnordered::new();
        pending.push(attempt(0));
        let mut launched = 1;
        let mut last_error = None;

        let stagger = tokio::time::sleep(self.stagger);
        tokio::pin!(stagger);

        loop {
            tokio::select! {
                Some(result) = pending.next() => match result {
                    Ok(message) => {
                        if !pending.is_empty() {
                            debug!(query = %query, abandoned = pending.len(), "Race won");
                        }
                        return Ok(message);
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "Race attempt failed");
                        last_error = Some(e);
                        if launched < total {
                            pending.push(attempt(launched));
                            launched += 1;
                            stagger.as_mut().reset(Instant::now() + self.stagger);
                        } else if pending.is_empty() {
                            break;
                        }
                    }
                },
                _ = &mut stagger, if launched < total => {
                    debug!(query = %query, attempt = launched + 1, "Staggered attempt");
                    pending.push(attempt(launched));
                    launched += 1;
                    stagger.as_mut().reset(Instant::now() + self.stagger);
                }
                else => break,
            }
        }

        Err(last_error.unwrap_or_else(|| DomainError::ConfigError(
            "multi-server executor has no executors".to_string(),
        )))
    }
}
