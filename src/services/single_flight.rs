use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use tracing::debug;

/// Collapses concurrent work for the same key into one execution.
///
/// The first caller for a key starts the future; callers arriving while it
/// runs await the same shared result. The entry is released as soon as the
/// work finishes, whether it succeeded or failed, so the next call starts
/// fresh.
pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    inflight: DashMap<String, Shared<BoxFuture<'static, T>>>,
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make()` for `key`, or join the run already in flight.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                debug!("Joining in-flight fetch for {}", key);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let flight = make().boxed().shared();
                entry.insert(flight.clone());
                flight
            }
        };

        let output = flight.clone().await;
        self.inflight.remove_if(key, |_, f| f.ptr_eq(&flight));
        output
    }

    /// Number of keys with work in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}
