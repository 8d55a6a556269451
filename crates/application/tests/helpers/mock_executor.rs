#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message, Record, RecordData, RecordType, ResponseCode};

/// Answers queries from a fixed table keyed by lower-cased name and type.
#[derive(Default)]
pub struct MockExecutor {
    responses: Mutex<HashMap<(String, RecordType), Result<Message, DomainError>>>,
    calls: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, name: &str, record_type: RecordType, answers: Vec<Record>) {
        let query = DnsQuery::new(name, record_type);
        self.responses.lock().unwrap().insert(
            (name.to_ascii_lowercase(), record_type),
            Ok(Message::response_for(query, answers)),
        );
    }

    pub fn respond_rcode(&self, name: &str, record_type: RecordType, rcode: ResponseCode) {
        let mut message = Message::response_for(DnsQuery::new(name, record_type), Vec::new());
        message.header.rcode = rcode;
        self.responses
            .lock()
            .unwrap()
            .insert((name.to_ascii_lowercase(), record_type), Ok(message));
    }

    pub fn fail(&self, name: &str, record_type: RecordType, error: DomainError) {
        self.responses
            .lock()
            .unwrap()
            .insert((name.to_ascii_lowercase(), record_type), Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsExecutor for MockExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(&(query.name.to_ascii_lowercase(), query.record_type))
            .cloned()
            .unwrap_or_else(|| Ok(Message::response_for(query.clone(), Vec::new())))
    }
}

/// Never answers; counts how many pending queries were dropped.
#[derive(Default)]
pub struct HangingExecutor {
    pub started: AtomicUsize,
    pub dropped: Arc<AtomicUsize>,
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsExecutor for HangingExecutor {
    async fn query(&self, _query: &DnsQuery) -> Result<Message, DomainError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _guard = DropCounter(self.dropped.clone());
        std::future::pending::<()>().await;
        unreachable!()
    }
}

pub fn a(name: &str, ip: &str) -> Record {
    Record::in_class(name, 300, RecordData::A(ip.parse().unwrap()))
}

pub fn cname(name: &str, target: &str) -> Record {
    Record::in_class(name, 300, RecordData::Cname(target.to_string()))
}
