//! Connection pool behavior under concurrent borrow/release traffic.

mod support;

use docstore_authz::{AuthzError, ConnectionPool, MemoryConnector, MemoryStore};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn connector() -> MemoryConnector {
    MemoryConnector::new(Arc::new(MemoryStore::new()))
}

#[test]
fn exclusivity_under_concurrent_traffic() {
    support::init_tracing();
    const CAPACITY: usize = 4;
    const WORKERS: usize = 16;
    const ROUNDS: usize = 200;

    let pool = Arc::new(ConnectionPool::new(&connector(), CAPACITY).unwrap());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let held_slots: Arc<Mutex<HashSet<usize>>> = Arc::new(Mutex::new(HashSet::new()));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            let held_slots = Arc::clone(&held_slots);
            thread::spawn(move || {
                let mut completed = 0;
                while completed < ROUNDS {
                    let Some(lease) = pool.borrow() else {
                        thread::yield_now();
                        continue;
                    };
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    assert!(
                        held_slots.lock().insert(lease.slot()),
                        "slot leased to two callers at once"
                    );
                    thread::yield_now();
                    held_slots.lock().remove(&lease.slot());
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    pool.release(lease).unwrap();
                    completed += 1;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(max_in_flight.load(Ordering::SeqCst) <= CAPACITY);

    // Every lease came back: the pool drains to exactly CAPACITY again.
    let mut leases = Vec::new();
    for _ in 0..CAPACITY {
        leases.push(pool.borrow().expect("slot should be available"));
    }
    assert!(pool.borrow().is_none());
    for lease in leases {
        pool.release(lease).unwrap();
    }
}

#[test]
fn exhausted_pool_reports_none_until_release() {
    let pool = ConnectionPool::new(&connector(), 1).unwrap();
    let lease = pool.borrow().unwrap();
    assert!(pool.borrow().is_none());
    pool.release(lease).unwrap();
    assert!(pool.borrow().is_some());
}

#[test]
fn self_test_leaves_every_slot_available() {
    // Construction borrows and returns all N slots; afterwards the full
    // capacity must be available again.
    let pool = ConnectionPool::new(&connector(), 8).unwrap();
    let leases: Vec<_> = (0..8).map(|_| pool.borrow().unwrap()).collect();
    let slots: HashSet<usize> = leases.iter().map(|l| l.slot()).collect();
    assert_eq!(slots.len(), 8);
    for lease in leases {
        pool.release(lease).unwrap();
    }
}

#[test]
fn construction_failure_is_pool_init() {
    struct Unreachable;
    impl docstore_authz::StoreConnector for Unreachable {
        fn connect(&self) -> docstore_authz::Result<Box<dyn docstore_authz::StoreConnection>> {
            Err(AuthzError::Store("no route to host".to_string()))
        }
    }
    assert!(matches!(
        ConnectionPool::new(&Unreachable, 3),
        Err(AuthzError::PoolInit(_))
    ));
}
