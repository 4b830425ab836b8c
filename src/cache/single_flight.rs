//! Request coalescing.
//!
//! Concurrent callers asking for the same key share one underlying future.
//! The first caller starts it; later callers await a clone of the same
//! [`Shared`] handle. The entry is cleared once the future resolves, or once
//! every caller waiting on it has been dropped, so the next request starts
//! fresh.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt, Shared};

type InFlight<T> = Shared<BoxFuture<'static, T>>;

struct Flight<T>
where
    T: Clone,
{
    shared: InFlight<T>,
    waiters: usize,
}

type FlightMap<K, T> = Mutex<HashMap<K, Flight<T>>>;

/// Deduplicates concurrent work by key.
pub struct SingleFlight<K, T>
where
    T: Clone,
{
    in_flight: FlightMap<K, T>,
}

impl<K, T> Default for SingleFlight<K, T>
where
    T: Clone,
{
    fn default() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with work currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .expect("single-flight lock poisoned")
            .len()
    }

    /// Runs `work` for `key`, or joins the run already in progress.
    ///
    /// `work` is only called when no run for `key` is in flight. Every
    /// caller receives a clone of the same output. If all callers are
    /// dropped before the run finishes, the run is abandoned.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self.in_flight.lock().expect("single-flight lock poisoned");
            match in_flight.get_mut(&key) {
                Some(existing) => {
                    tracing::debug!("joining in-flight request");
                    existing.waiters += 1;
                    existing.shared.clone()
                }
                None => {
                    let shared = work().boxed().shared();
                    in_flight.insert(
                        key.clone(),
                        Flight {
                            shared: shared.clone(),
                            waiters: 1,
                        },
                    );
                    shared
                }
            }
        };

        let mut waiter = Waiter {
            in_flight: &self.in_flight,
            key,
            shared: shared.clone(),
            finished: false,
        };
        let output = shared.await;
        waiter.finished = true;
        output
    }
}

/// Releases one caller's hold on a flight, including on cancellation.
struct Waiter<'a, K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    in_flight: &'a FlightMap<K, T>,
    key: K,
    shared: InFlight<T>,
    finished: bool,
}

impl<K, T> Drop for Waiter<'_, K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    fn drop(&mut self) {
        // never panic in drop, even on a poisoned lock
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(flight) = in_flight.get_mut(&self.key) else {
            return;
        };
        if !flight.shared.ptr_eq(&self.shared) {
            return;
        }
        flight.waiters = flight.waiters.saturating_sub(1);
        if self.finished || flight.waiters == 0 {
            if !self.finished {
                tracing::debug!("all callers dropped; abandoning in-flight request");
            }
            in_flight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_run() {
        let flights: SingleFlight<&str, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                42
            }
        };

        let (a, b, c) = tokio::join!(
            flights.run("k", make(Arc::clone(&calls))),
            flights.run("k", make(Arc::clone(&calls))),
            flights.run("k", make(Arc::clone(&calls))),
        );

        assert_eq!((a, b, c), (42, 42, 42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_run_separately() {
        let flights: SingleFlight<u8, u8> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&calls);
        let c2 = Arc::clone(&calls);
        let (a, b) = tokio::join!(
            flights.run(1, move || async move {
                c1.fetch_add(1, Ordering::SeqCst);
                1
            }),
            flights.run(2, move || async move {
                c2.fetch_add(1, Ordering::SeqCst);
                2
            }),
        );

        assert_eq!((a, b), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sequential_calls_rerun() {
        let flights: SingleFlight<&str, usize> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            flights
                .run("k", move || async move { calls.fetch_add(1, Ordering::SeqCst) })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_callers_clear_their_key() {
        let flights: SingleFlight<u32, u32> = SingleFlight::new();

        for key in 0..4 {
            let pending = flights.run(key, || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                0
            });
            let outcome = tokio::time::timeout(Duration::from_millis(10), pending).await;
            assert!(outcome.is_err());
        }

        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_one_cancelled_caller_keeps_the_run_for_others() {
        let flights: SingleFlight<&str, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                7
            }
        };

        let impatient = tokio::time::timeout(
            Duration::from_millis(10),
            flights.run("k", make(Arc::clone(&calls))),
        );
        let patient = flights.run("k", make(Arc::clone(&calls)));
        let (first, second) = tokio::join!(impatient, patient);

        assert!(first.is_err());
        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }
}
