//! Recording backend.
//!
//! Captures every backend interaction in order so callers can assert on what
//! the middleware and annotation helpers did. Cloning shares the same log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{
    Application, Backend, Segment, Transaction, TransactionHandle, WebRequest, WebResponse,
};
use crate::error::ApmError;

/// A single recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ApplicationCreated { app_name: String, credential: String, enabled: bool },
    TransactionStarted { txn: u64, name: String },
    WebRequest { txn: u64, request: WebRequest },
    WebResponse { txn: u64, response: WebResponse },
    Attribute { txn: u64, key: String, value: String },
    Error { txn: u64, message: String },
    SegmentStarted { txn: u64, name: String },
    SegmentEnded { txn: u64, name: String },
    TransactionEnded { txn: u64 },
}

/// Everything recorded for one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: u64,
    pub name: String,
    pub request: Option<WebRequest>,
    pub response: Option<WebResponse>,
    pub attributes: Vec<(String, String)>,
    pub errors: Vec<String>,
    pub segments_started: Vec<String>,
    pub segments_ended: Vec<String>,
    pub end_count: usize,
    /// Whether response metadata was attached before the first `end()`.
    pub response_before_end: bool,
}

#[derive(Default)]
struct Log {
    events: Mutex<Vec<Event>>,
    next_txn: AtomicU64,
}

impl Log {
    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: Event) {
        self.lock().push(event);
    }
}

/// Backend that records calls instead of exporting them.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    log: Arc<Log>,
    failure: Option<String>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose application construction always fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            log: Arc::default(),
            failure: Some(reason.into()),
        }
    }

    /// Snapshot of all recorded events, in call order.
    pub fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Per-transaction view of the recorded events.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = Vec::new();

        for event in self.log.lock().iter() {
            if let Event::TransactionStarted { txn, name } = event {
                records.push(TransactionRecord {
                    id: *txn,
                    name: name.clone(),
                    ..TransactionRecord::default()
                });
                continue;
            }

            let Some(record) = event_txn(event).and_then(|id| records.iter_mut().find(|r| r.id == id))
            else {
                continue;
            };

            match event {
                Event::WebRequest { request, .. } => record.request = Some(request.clone()),
                Event::WebResponse { response, .. } => {
                    record.response = Some(*response);
                    if record.end_count == 0 {
                        record.response_before_end = true;
                    }
                }
                Event::Attribute { key, value, .. } => {
                    record.attributes.push((key.clone(), value.clone()))
                }
                Event::Error { message, .. } => record.errors.push(message.clone()),
                Event::SegmentStarted { name, .. } => record.segments_started.push(name.clone()),
                Event::SegmentEnded { name, .. } => record.segments_ended.push(name.clone()),
                Event::TransactionEnded { .. } => record.end_count += 1,
                Event::ApplicationCreated { .. } | Event::TransactionStarted { .. } => {}
            }
        }

        records
    }

    /// The only recorded transaction, if exactly one exists.
    pub fn single_transaction(&self) -> Option<TransactionRecord> {
        let mut records = self.transactions();
        if records.len() == 1 {
            records.pop()
        } else {
            None
        }
    }
}

fn event_txn(event: &Event) -> Option<u64> {
    match event {
        Event::ApplicationCreated { .. } => None,
        Event::TransactionStarted { txn, .. }
        | Event::WebRequest { txn, .. }
        | Event::WebResponse { txn, .. }
        | Event::Attribute { txn, .. }
        | Event::Error { txn, .. }
        | Event::SegmentStarted { txn, .. }
        | Event::SegmentEnded { txn, .. }
        | Event::TransactionEnded { txn } => Some(*txn),
    }
}

impl Backend for InMemoryBackend {
    fn new_application(
        &self,
        app_name: &str,
        credential: &str,
        enabled: bool,
    ) -> Result<Arc<dyn Application>, ApmError> {
        if let Some(reason) = &self.failure {
            return Err(ApmError::Backend(reason.clone()));
        }

        self.log.push(Event::ApplicationCreated {
            app_name: app_name.to_string(),
            credential: credential.to_string(),
            enabled,
        });

        Ok(Arc::new(MemoryApplication {
            log: self.log.clone(),
        }))
    }
}

struct MemoryApplication {
    log: Arc<Log>,
}

impl Application for MemoryApplication {
    fn start_transaction(&self, name: &str) -> TransactionHandle {
        let id = self.log.next_txn.fetch_add(1, Ordering::Relaxed) + 1;
        self.log.push(Event::TransactionStarted {
            txn: id,
            name: name.to_string(),
        });
        Arc::new(MemoryTransaction {
            id,
            log: self.log.clone(),
        })
    }
}

struct MemoryTransaction {
    id: u64,
    log: Arc<Log>,
}

impl Transaction for MemoryTransaction {
    fn set_web_request(&self, request: WebRequest) {
        self.log.push(Event::WebRequest { txn: self.id, request });
    }

    fn set_web_response(&self, response: WebResponse) {
        self.log.push(Event::WebResponse { txn: self.id, response });
    }

    fn notice_error(&self, message: &str) {
        self.log.push(Event::Error {
            txn: self.id,
            message: message.to_string(),
        });
    }

    fn add_attribute(&self, key: &str, value: &str) {
        self.log.push(Event::Attribute {
            txn: self.id,
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn start_segment(&self, name: &str) -> Box<dyn Segment> {
        self.log.push(Event::SegmentStarted {
            txn: self.id,
            name: name.to_string(),
        });
        Box::new(MemorySegment {
            txn: self.id,
            name: name.to_string(),
            log: self.log.clone(),
        })
    }

    fn end(&self) {
        self.log.push(Event::TransactionEnded { txn: self.id });
    }
}

struct MemorySegment {
    txn: u64,
    name: String,
    log: Arc<Log>,
}

impl Segment for MemorySegment {
    fn end(self: Box<Self>) {
        let MemorySegment { txn, name, log } = *self;
        log.push(Event::SegmentEnded { txn, name });
    }
}
