// src/storage/cache.rs
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

struct CachedEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Outcome of one fill, handed to every caller that joined it.
type FillOutcome<V, E> = Option<Result<V, Arc<E>>>;

#[derive(Debug)]
pub enum FillError<E> {
    /// The fill ran and its fetch failed.
    Failed(Arc<E>),
    /// The fill task ended without reporting back.
    Abandoned,
}

impl<E: fmt::Display> fmt::Display for FillError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "{}", e),
            Self::Abandoned => write!(f, "Cache fill ended without a result"),
        }
    }
}

/// Keyed TTL cache for upstream responses.
///
/// A miss starts one fill on its own task. Callers that miss while a fill for the
/// same key is running join it and get its outcome, success or failure. The fill
/// keeps running if its callers go away and still stores its result. Only
/// successful fills are stored.
pub struct ResponseCache<V, E> {
    entries: Arc<DashMap<String, CachedEntry<V>>>,
    fills: Arc<DashMap<String, watch::Receiver<FillOutcome<V, E>>>>,
    ttl: Duration,
}

impl<V, E> ResponseCache<V, E>
    where V: Clone + Send + Sync + 'static, E: Send + Sync + 'static
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            fills: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: &str, value: V) {
        store(&self.entries, self.ttl, key, value);
    }

    pub fn purge_expired(&self) {
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Must be called from within a tokio runtime.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, FillError<E>>
        where F: FnOnce() -> Fut, Fut: Future<Output = Result<V, E>> + Send + 'static
    {
        if let Some(value) = self.get(key) {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        let (mut outcome_rx, outcome_tx) = match self.fills.entry(key.to_string()) {
            Entry::Occupied(fill) => {
                debug!("Joining running cache fill for {}", key);
                (fill.get().clone(), None)
            }
            Entry::Vacant(slot) => {
                // A fill may have stored its value between the first check and here.
                if let Some(value) = self.get(key) {
                    return Ok(value);
                }

                debug!("Cache miss for {}", key);
                let (outcome_tx, outcome_rx) = watch::channel(None);
                slot.insert(outcome_rx.clone());
                (outcome_rx, Some(outcome_tx))
            }
        };

        if let Some(outcome_tx) = outcome_tx {
            self.spawn_fill(key.to_string(), fetch(), outcome_tx);
        }

        let outcome = match outcome_rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };

        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => Err(FillError::Failed(e)),
            None => Err(FillError::Abandoned),
        }
    }

    fn spawn_fill<Fut>(&self, key: String, fetch: Fut, outcome_tx: watch::Sender<FillOutcome<V, E>>)
        where Fut: Future<Output = Result<V, E>> + Send + 'static
    {
        let entries = self.entries.clone();
        let fills = self.fills.clone();
        let ttl = self.ttl;

        tokio::spawn(async move {
            let outcome = match fetch.await {
                Ok(value) => {
                    store(&entries, ttl, &key, value.clone());
                    Ok(value)
                }
                Err(e) => Err(Arc::new(e)),
            };

            // The entry is stored before the slot goes, so no caller misses both.
            fills.remove(&key);
            if outcome_tx.send(Some(outcome)).is_err() {
                debug!("Cache fill for {} finished with no callers left", key);
            }
        });
    }
}

fn store<V>(entries: &DashMap<String, CachedEntry<V>>, ttl: Duration, key: &str, value: V) {
    entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    entries.insert(key.to_string(), CachedEntry {
        value,
        stored_at: Instant::now(),
    });
}
