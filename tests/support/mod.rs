//! Shared fixtures for the integration tests: scripted store fakes,
//! comparator stand-ins, and document builders.
#![allow(dead_code)]

use docstore_authz::{
    AttributeList, Document, PairComparator, QueryReply, QuerySpec, Result, StoreConnection,
    StoreConnector,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Turn a `json!` object literal into a result document.
pub fn doc(value: Value) -> Document {
    value.as_object().expect("object literal").clone()
}

/// One scripted response for the next query issued on any connection.
pub enum Step {
    NoReply,
    CursorFailed,
    Docs(Vec<Document>),
}

/// Connector whose connections answer queries from a shared script, in
/// order. An exhausted script answers with zero documents. Every issued
/// query's collection name is recorded for assertions.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    steps: Arc<Mutex<VecDeque<Step>>>,
    issued: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            issued: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn issued_collections(&self) -> Vec<String> {
        self.issued.lock().clone()
    }
}

impl StoreConnector for ScriptedConnector {
    fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        Ok(Box::new(ScriptedConnection {
            steps: Arc::clone(&self.steps),
            issued: Arc::clone(&self.issued),
        }))
    }
}

struct ScriptedConnection {
    steps: Arc<Mutex<VecDeque<Step>>>,
    issued: Arc<Mutex<Vec<String>>>,
}

impl StoreConnection for ScriptedConnection {
    fn set_auto_reconnect(&mut self, _enabled: bool) {}

    fn query(&mut self, spec: &QuerySpec) -> QueryReply<'_> {
        self.issued.lock().push(spec.collection.clone());
        match self.steps.lock().pop_front() {
            Some(Step::NoReply) => QueryReply::NoReply,
            Some(Step::CursorFailed) => QueryReply::CursorFailed,
            Some(Step::Docs(docs)) => QueryReply::Cursor(Box::new(docs.into_iter())),
            None => QueryReply::Cursor(Box::new(std::iter::empty())),
        }
    }
}

/// Comparator that matches every check record.
pub struct AcceptAll;

impl PairComparator for AcceptAll {
    fn compare(&self, _: &AttributeList, _: &AttributeList, _: &mut AttributeList) -> bool {
        true
    }
}

/// Comparator that never matches.
pub struct RejectAll;

impl PairComparator for RejectAll {
    fn compare(&self, _: &AttributeList, _: &AttributeList, _: &mut AttributeList) -> bool {
        false
    }
}

/// Comparator that rejects the first `n` comparisons and matches afterwards.
pub struct RejectFirst {
    remaining: AtomicUsize,
}

impl RejectFirst {
    pub fn new(n: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(n),
        }
    }
}

impl PairComparator for RejectFirst {
    fn compare(&self, _: &AttributeList, _: &AttributeList, _: &mut AttributeList) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
    }
}
