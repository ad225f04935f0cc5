//! Document-store backed authorization for network login requests.
//!
//! Resolves authorization decisions by querying per-user and per-group policy
//! records from a document store and translating them into ordered attribute
//! lists used to accept, reject, or annotate a session.
//!
//! Three pieces do the heavy lifting:
//!
//! - [`ConnectionPool`] bounds and recycles store connections under
//!   concurrent access;
//! - [`decode::decode_policy_array`] turns heterogeneous, nested query
//!   results into canonical `(name, operator, value)` attributes;
//! - [`AuthzEngine`] sequences user-check, user-reply, and group-membership
//!   resolution with a fallthrough continuation rule.
//!
//! The comparison of request attributes against check attributes is supplied
//! by the caller through [`PairComparator`]; the store wire protocol is
//! behind [`StoreConnector`] / [`StoreConnection`], with an in-memory backend
//! included.
//!
//! ```
//! use docstore_authz::{
//!     AttributeList, AuthzEngine, AuthzOutcome, AuthzRequest, ConnectionPool,
//!     MemoryConnector, MemoryStore, ModuleConfig, PairComparator,
//! };
//! use std::sync::Arc;
//!
//! struct AcceptAll;
//! impl PairComparator for AcceptAll {
//!     fn compare(&self, _: &AttributeList, _: &AttributeList, _: &mut AttributeList) -> bool {
//!         true
//!     }
//! }
//!
//! let config = ModuleConfig::default();
//! config.validate().unwrap();
//! let connector = MemoryConnector::new(Arc::new(MemoryStore::new()));
//! let pool = Arc::new(ConnectionPool::new(&connector, config.num_connections).unwrap());
//! let engine = AuthzEngine::new(&config, pool, Arc::new(AcceptAll));
//!
//! let mut request = AuthzRequest::new("alice");
//! assert_eq!(engine.authorize(&mut request), AuthzOutcome::NotFound);
//! ```

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod pool;
pub mod query;
pub mod store;
pub mod types;

pub use config::{ModuleConfig, MAX_POOL_SIZE};
pub use engine::{fallthrough, AuthzEngine, AuthzRequest, PairComparator, FALL_THROUGH_ATTR};
pub use error::{AuthzError, Result};
pub use lookup::{PolicyLookup, GROUP_ATTR};
pub use pool::{ConnectionPool, PooledConnection};
pub use query::QueryExecutor;
pub use store::{
    eq_filter, Document, DocumentStream, MemoryConnector, MemoryStore, Projection, QueryReply,
    QuerySpec, StoreConnection, StoreConnector,
};
pub use types::{AttributeList, AuthzOutcome, Operator, PolicyAttribute};
