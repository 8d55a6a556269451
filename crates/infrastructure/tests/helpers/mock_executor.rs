#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message, Record, RecordData};
use tern_infrastructure::dns::Clock;
use tokio::time::Instant;

/// What a [`ScriptedExecutor`] does with every query.
#[derive(Clone)]
pub enum Behavior {
    Answer(Vec<Record>),
    Fail(DomainError),
    Hang,
}

/// Executor with a fixed behaviour, an optional delay, call counting, and a
/// count of queries dropped before they finished.
pub struct ScriptedExecutor {
    behavior: Mutex<Behavior>,
    delay: Duration,
    calls: AtomicUsize,
    dropped: Arc<AtomicUsize>,
    started_at: Mutex<Vec<Instant>>,
}

impl ScriptedExecutor {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Self::delayed(behavior, Duration::ZERO)
    }

    pub fn delayed(behavior: Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            delay,
            calls: AtomicUsize::new(0),
            dropped: Arc::new(AtomicUsize::new(0)),
            started_at: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(records: Vec<Record>) -> Arc<Self> {
        Self::new(Behavior::Answer(records))
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn started_at(&self) -> Vec<Instant> {
        self.started_at.lock().unwrap().clone()
    }
}

struct DropGuard {
    counter: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl DnsExecutor for ScriptedExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started_at.lock().unwrap().push(Instant::now());
        let mut guard = DropGuard {
            counter: Arc::clone(&self.dropped),
            armed: true,
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.behavior.lock().unwrap().clone();
        let result = match behavior {
            Behavior::Answer(records) => Ok(Message::response_for(query.clone(), records)),
            Behavior::Fail(error) => Err(error),
            Behavior::Hang => std::future::pending().await,
        };
        guard.armed = false;
        result
    }
}

/// Clock whose time only moves when told to.
#[derive(Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn at(secs: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(secs)))
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn a(name: &str, ip: &str, ttl: u32) -> Record {
    Record::in_class(name, ttl, RecordData::A(ip.parse().unwrap()))
}

pub fn timeout_error(query: &str) -> DomainError {
    DomainError::Timeout {
        query: query.to_string(),
        timeout_ms: 100,
    }
}

pub fn connection_error(server: &str) -> DomainError {
    DomainError::ConnectionFailed {
        server: server.to_string(),
        reason: "refused".to_string(),
    }
}
