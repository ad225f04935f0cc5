//! Fixed-size store connection pool
//!
//! The pool owns N sessions dialed at construction and recycles them across
//! concurrent authorization requests. A single mutex serializes every pick
//! and return, so no two callers can observe the same slot as available. The
//! pool never grows or shrinks, and it is always passed in by the caller
//! rather than held in process-global state.

use crate::config::MAX_POOL_SIZE;
use crate::error::{AuthzError, Result};
use crate::store::{StoreConnection, StoreConnector};
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Distinguishes pools so a lease cannot be returned to a pool it did not
/// come from.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// A leased store session. Exactly one caller owns it between
/// [`ConnectionPool::borrow`] and [`ConnectionPool::release`].
pub struct PooledConnection {
    conn: Option<Box<dyn StoreConnection>>,
    slot: usize,
    pool_id: u64,
}

impl PooledConnection {
    /// Index of the pool slot this lease came from.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Deref for PooledConnection {
    type Target = dyn StoreConnection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_deref().expect("connection present until release")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_deref_mut()
            .expect("connection present until release")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        // The pool is the sole authority on liveness: a lease that is
        // dropped instead of released leaves its slot permanently empty.
        if self.conn.is_some() {
            warn!(
                slot = self.slot,
                "pooled connection dropped without release; its slot is leaked"
            );
        }
    }
}

/// Bounded pool of reusable store sessions.
pub struct ConnectionPool {
    slots: Mutex<Vec<Option<Box<dyn StoreConnection>>>>,
    capacity: usize,
    id: u64,
}

impl ConnectionPool {
    /// Dial `numconns` sessions and run the self-test pass.
    ///
    /// Construction fails on an out-of-range size, on any dial failure, or on
    /// any pick/return failure during the self-test; a partially initialized
    /// pool is never exposed.
    pub fn new(connector: &dyn StoreConnector, numconns: usize) -> Result<Self> {
        if numconns == 0 || numconns > MAX_POOL_SIZE {
            return Err(AuthzError::InvalidConfig(format!(
                "pool size must be within 1..={} (got {})",
                MAX_POOL_SIZE, numconns
            )));
        }

        let mut slots = Vec::with_capacity(numconns);
        for _ in 0..numconns {
            let conn = connector
                .connect()
                .map_err(|err| AuthzError::PoolInit(err.to_string()))?;
            slots.push(Some(conn));
        }

        let pool = Self {
            slots: Mutex::new(slots),
            capacity: numconns,
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
        };
        pool.configure_connections()?;
        debug!(capacity = numconns, "connection pool ready");
        Ok(pool)
    }

    /// Self-test pass: borrow every slot once, enable auto-reconnect, and
    /// hand them all back.
    fn configure_connections(&self) -> Result<()> {
        let mut leased = Vec::with_capacity(self.capacity);
        for _ in 0..self.capacity {
            let mut lease = self
                .borrow()
                .ok_or_else(|| AuthzError::PoolInit("self-test pick failed".to_string()))?;
            lease.set_auto_reconnect(true);
            leased.push(lease);
        }
        for lease in leased {
            self.release(lease)
                .map_err(|_| AuthzError::PoolInit("self-test return failed".to_string()))?;
        }
        Ok(())
    }

    /// Number of slots the pool was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pick an available session, or `None` when every slot is leased.
    pub fn borrow(&self) -> Option<PooledConnection> {
        let mut slots = self.slots.lock();
        for (idx, slot) in slots.iter_mut().enumerate() {
            if let Some(conn) = slot.take() {
                return Some(PooledConnection {
                    conn: Some(conn),
                    slot: idx,
                    pool_id: self.id,
                });
            }
        }
        None
    }

    /// Return a leased session to the available set.
    ///
    /// Failure means the lease did not come from this pool, or the slot
    /// table no longer matches what was handed out; the in-flight request
    /// must be failed rather than continue on a pool whose bookkeeping
    /// cannot be trusted.
    pub fn release(&self, mut lease: PooledConnection) -> Result<()> {
        if lease.pool_id != self.id {
            return Err(AuthzError::ConnectionRelease);
        }
        let mut slots = self.slots.lock();
        match slots.get_mut(lease.slot) {
            Some(entry) if entry.is_none() => {
                *entry = lease.conn.take();
                Ok(())
            }
            _ => Err(AuthzError::ConnectionRelease),
        }
    }

    /// Test hook: force a connection into a slot, bypassing lease
    /// bookkeeping, so release-failure paths can be exercised.
    #[cfg(test)]
    pub(crate) fn occupy_slot(&self, slot: usize, conn: Box<dyn StoreConnection>) {
        self.slots.lock()[slot] = Some(conn);
    }
}
