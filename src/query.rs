//! Query execution against the pooled store
//!
//! One executor run covers the whole borrow/query/decode/release cycle for a
//! single lookup. The borrowed connection is released exactly once on every
//! path out of the loop.

use crate::decode::decode_policy_array;
use crate::error::{AuthzError, Result};
use crate::pool::ConnectionPool;
use crate::store::{QueryReply, QuerySpec};
use crate::types::AttributeList;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub struct QueryExecutor {
    pool: Arc<ConnectionPool>,
}

impl QueryExecutor {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Run one query and decode every selected array field of every matching
    /// document into `out`.
    ///
    /// Returns the number of successfully decoded documents. Zero means no
    /// matching record, which is a normal negative result; operational
    /// failures (pool exhausted, cursor creation, connection release) come
    /// back as errors and must fail the request.
    pub fn run(
        &self,
        spec: &QuerySpec,
        default_attr: Option<&str>,
        out: &mut AttributeList,
    ) -> Result<usize> {
        let Some(mut lease) = self.pool.borrow() else {
            error!(
                capacity = self.pool.capacity(),
                "maximum connections exceeded; rejecting user"
            );
            return Err(AuthzError::PoolExhausted);
        };

        let mut count = 0usize;
        let mut cursor_failed = false;
        match lease.query(spec) {
            // A query that failed to execute reads as zero matching
            // documents, favoring "not found" over noisy failure.
            QueryReply::NoReply => {}
            QueryReply::CursorFailed => {
                error!(collection = %spec.collection, "error creating result cursor");
                cursor_failed = true;
            }
            QueryReply::Cursor(stream) => {
                let mut decode_failed = false;
                for doc in stream {
                    for (field, selected) in spec.projection.iter() {
                        if !selected {
                            continue;
                        }
                        let Some(Value::Array(items)) = doc.get(field) else {
                            continue;
                        };
                        if decode_policy_array(items, default_attr, out).is_err() {
                            decode_failed = true;
                            break;
                        }
                        count += 1;
                    }
                    if decode_failed {
                        break;
                    }
                }
            }
        }

        // Release on every path; a connection that cannot be returned can
        // mean the pool is in an inconsistent state, so that failure wins
        // even over a successful query.
        self.pool.release(lease).map_err(|err| {
            error!("the connection was not returned to the pool; rejecting user");
            err
        })?;

        if cursor_failed {
            return Err(AuthzError::CursorCreate);
        }
        debug!(collection = %spec.collection, count, "query complete");
        Ok(count)
    }
}
