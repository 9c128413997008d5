//! Trailing-edge debouncer
//!
//! A worker task owns the pending queue. Every request restarts the quiet
//! window; once the window passes without a request the queue is swapped out
//! and handed to the notify callback. Requests that arrive while the
//! callback runs wait in the channel and start the next batch.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// A queue that folds incoming events into one pending batch
pub trait Coalesce: Default + Send + 'static {
    type Event: Send + 'static;

    fn push(&mut self, event: Self::Event);

    fn is_empty(&self) -> bool;
}

/// Latest payload per id, ids kept in first-arrival order
#[derive(Debug, Clone)]
pub struct KeyedQueue<K, P> {
    order: Vec<K>,
    payloads: HashMap<K, P>,
}

impl<K, P> Default for KeyedQueue<K, P> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            payloads: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, P> KeyedQueue<K, P> {
    pub fn insert(&mut self, id: K, payload: P) {
        if self.payloads.insert(id.clone(), payload).is_none() {
            self.order.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &K) -> Option<&P> {
        self.payloads.get(id)
    }

    /// Drain into `(id, payload)` pairs in first-arrival order
    pub fn into_entries(mut self) -> Vec<(K, P)> {
        self.order
            .into_iter()
            .filter_map(|id| self.payloads.remove(&id).map(|p| (id, p)))
            .collect()
    }
}

impl<K, P> Coalesce for KeyedQueue<K, P>
where
    K: Hash + Eq + Clone + Send + 'static,
    P: Send + 'static,
{
    type Event = (K, P);

    fn push(&mut self, (id, payload): (K, P)) {
        self.insert(id, payload);
    }

    fn is_empty(&self) -> bool {
        KeyedQueue::is_empty(self)
    }
}

enum Command<E> {
    Push(E),
    Clear,
}

/// Handle to a running debounce worker
///
/// Dropping the handle stops the worker without flushing.
pub struct Debouncer<Q: Coalesce> {
    tx: mpsc::UnboundedSender<Command<Q::Event>>,
    worker: JoinHandle<()>,
}

impl<Q: Coalesce> Debouncer<Q> {
    /// Spawn the worker; must be called within a tokio runtime
    pub fn spawn<F, Fut, E>(window: Duration, notify: F) -> Self
    where
        F: FnMut(Q) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(window, rx, notify));
        Self { tx, worker }
    }

    /// Queue an event and restart the quiet window
    pub fn request(&self, event: Q::Event) {
        if self.tx.send(Command::Push(event)).is_err() {
            tracing::warn!("Debouncer worker stopped; dropping request");
        }
    }

    /// Discard everything pending without notifying
    pub fn clear(&self) {
        let _ = self.tx.send(Command::Clear);
    }
}

impl<Q: Coalesce> Drop for Debouncer<Q> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<Q, F, Fut, E>(
    window: Duration,
    mut rx: mpsc::UnboundedReceiver<Command<Q::Event>>,
    mut notify: F,
) where
    Q: Coalesce,
    F: FnMut(Q) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut queue = Q::default();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Push(event)) => {
                    queue.push(event);
                    deadline = Some(Instant::now() + window);
                }
                Some(Command::Clear) => {
                    queue = Q::default();
                    deadline = None;
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                let batch = std::mem::take(&mut queue);
                if batch.is_empty() {
                    continue;
                }
                if let Err(e) = notify(batch).await {
                    tracing::error!("Debounced notify failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Batches = Arc<Mutex<Vec<Vec<(u32, String)>>>>;

    fn recording(window: Duration) -> (Debouncer<KeyedQueue<u32, String>>, Batches) {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&batches);
        let debouncer = Debouncer::spawn(window, move |queue: KeyedQueue<u32, String>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(queue.into_entries());
                Ok::<(), String>(())
            }
        });
        (debouncer, batches)
    }

    #[test]
    fn test_keyed_queue_latest_wins_first_order() {
        let mut queue = KeyedQueue::default();
        queue.insert(2, "a");
        queue.insert(1, "b");
        queue.insert(2, "c");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.get(&2), Some(&"c"));
        assert_eq!(queue.into_entries(), vec![(2, "c"), (1, "b")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_flushes_once_with_last_payload() {
        let (debouncer, batches) = recording(Duration::from_millis(500));

        for i in 0..10 {
            debouncer.request((1, format!("payload-{}", i)));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![(1, "payload-9".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_restarts_on_each_request() {
        let (debouncer, batches) = recording(Duration::from_millis(500));

        debouncer.request((1, "a".to_string()));
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.request((2, "b".to_string()));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(batches.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_pending() {
        let (debouncer, batches) = recording(Duration::from_millis(500));
        debouncer.request((1, "a".to_string()));
        debouncer.clear();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(batches.lock().unwrap().is_empty());

        debouncer.request((3, "c".to_string()));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(batches.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_during_slow_callback_form_next_batch() {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&batches);
        let debouncer = Debouncer::spawn(
            Duration::from_millis(100),
            move |queue: KeyedQueue<u32, String>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(queue.into_entries());
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<(), String>(())
                }
            },
        );

        debouncer.request((1, "a".to_string()));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(batches.lock().unwrap().len(), 1);

        // Callback for the first batch is still sleeping
        debouncer.request((2, "b".to_string()));
        debouncer.request((1, "c".to_string()));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let batches = batches.lock().unwrap();
        assert_eq!(
            *batches,
            vec![
                vec![(1, "a".to_string())],
                vec![(2, "b".to_string()), (1, "c".to_string())],
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_callback_keeps_worker_alive() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let debouncer = Debouncer::spawn(
            Duration::from_millis(100),
            move |_queue: KeyedQueue<u32, ()>| {
                let counter = Arc::clone(&counter);
                async move {
                    *counter.lock().unwrap() += 1;
                    Err::<(), _>("remote unavailable")
                }
            },
        );

        debouncer.request((1, ()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.request((2, ()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
