use std::collections::hash_map::{self, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::channel::oneshot;
use futures::future::{self, Either};
use tracing::{debug, trace, warn};

use crate::cancel::CancelSignal;
use crate::config::{LoaderConfig, Trigger};
use crate::{runtime, BatchFn, LoadError};

type Reply<V, E> = Result<V, LoadError<E>>;
type Waiter<V, E> = oneshot::Sender<Reply<V, E>>;

enum Entry<V, E> {
    Loaded(V),
    Pending(Vec<Waiter<V, E>>),
}

struct State<K, V, E> {
    entries: HashMap<K, Entry<V, E>>,
    // keys of the open window, first-seen order
    queue: Vec<K>,
    window: u64,
}

impl<K, V, E> State<K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn new() -> Self {
        State {
            entries: HashMap::new(),
            queue: Vec::new(),
            window: 0,
        }
    }

    fn enqueue(&mut self, key: K) -> Ticket<V, E> {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(mut occupied) => {
                if let Entry::Loaded(value) = occupied.get() {
                    trace!(key = ?occupied.key(), "cache hit");
                    return Ticket::Ready(Ok(value.clone()));
                }
                let (tx, rx) = oneshot::channel();
                if let Entry::Pending(waiters) = occupied.get_mut() {
                    waiters.push(tx);
                }
                Ticket::Wait(rx)
            }
            hash_map::Entry::Vacant(vacant) => {
                let (tx, rx) = oneshot::channel();
                self.queue.push(vacant.key().clone());
                vacant.insert(Entry::Pending(vec![tx]));
                Ticket::Wait(rx)
            }
        }
    }

    fn take_batch(&mut self) -> Vec<K> {
        self.window = self.window.wrapping_add(1);
        mem::take(&mut self.queue)
    }

    fn settle(&mut self, key: K, value: V) -> Vec<Waiter<V, E>> {
        match self.entries.insert(key, Entry::Loaded(value)) {
            Some(Entry::Pending(waiters)) => waiters,
            _ => Vec::new(),
        }
    }

    /// Forgets a key that is still pending and hands back its waiters.
    fn release(&mut self, key: &K) -> Vec<Waiter<V, E>> {
        if !matches!(self.entries.get(key), Some(Entry::Pending(_))) {
            return Vec::new();
        }
        match self.entries.remove(key) {
            Some(Entry::Pending(waiters)) => waiters,
            _ => Vec::new(),
        }
    }
}

enum Ticket<V, E> {
    Ready(Reply<V, E>),
    Wait(oneshot::Receiver<Reply<V, E>>),
}

impl<V, E> Ticket<V, E> {
    fn is_waiting(&self) -> bool {
        matches!(self, Ticket::Wait(_))
    }

    async fn resolve(self) -> Reply<V, E> {
        match self {
            Ticket::Ready(reply) => reply,
            Ticket::Wait(rx) => rx.await.unwrap_or_else(|_| Err(LoadError::Cancelled)),
        }
    }
}

/// Work a caller has to drive after registering its keys.
struct Plan<'a, K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    // windows closed while enqueueing, guarded from the moment they are taken
    full: Vec<InFlight<'a, K, V, E>>,
    lead: Option<u64>,
}

// Releases dispatched keys if the future running their fetch is dropped.
struct InFlight<'a, K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    state: &'a Mutex<State<K, V, E>>,
    keys: Vec<K>,
    armed: bool,
}

impl<'a, K, V, E> InFlight<'a, K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn disarm(mut self) -> Vec<K> {
        self.armed = false;
        mem::take(&mut self.keys)
    }
}

impl<'a, K, V, E> Drop for InFlight<'a, K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn drop(&mut self) {
        if !self.armed || self.keys.is_empty() {
            return;
        }
        warn!(keys = self.keys.len(), "batch dropped before it resolved");
        let mut state = lock(self.state);
        for key in &self.keys {
            // dropping the senders fails the waiters with `Cancelled`
            drop(state.release(key));
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A request-scoped loader that coalesces concurrent `load` calls into
/// batched calls of its [`BatchFn`] and caches every successful result.
pub struct Loader<K, V, F>
where
    F: BatchFn<K, V>,
{
    state: Arc<Mutex<State<K, V, F::Error>>>,
    load_fn: Arc<F>,
    config: LoaderConfig,
    cancel: Option<CancelSignal>,
    name: &'static str,
}

// Manual implementation is used to omit applying unnecessary Clone bounds.
impl<K, V, F> Clone for Loader<K, V, F>
where
    F: BatchFn<K, V>,
{
    fn clone(&self) -> Self {
        Loader {
            state: self.state.clone(),
            load_fn: self.load_fn.clone(),
            config: self.config.clone(),
            cancel: self.cancel.clone(),
            name: self.name,
        }
    }
}

impl<K, V, F> Loader<K, V, F>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
    F: BatchFn<K, V>,
    F::Error: Clone + Debug,
{
    pub fn new(load_fn: F) -> Self {
        Loader::with_config(load_fn, LoaderConfig::default())
    }

    pub fn with_config(load_fn: F, config: LoaderConfig) -> Self {
        Loader {
            state: Arc::new(Mutex::new(State::new())),
            load_fn: Arc::new(load_fn),
            config,
            cancel: None,
            name: std::any::type_name::<F>(),
        }
    }

    /// Ties in-flight batches to the cancellation of the owning request.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Name used in log events, defaults to the batch function's type name.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_yield_count(mut self, yield_count: usize) -> Self {
        self.config.trigger = Trigger::Yield(yield_count);
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.config.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn batch_fn(&self) -> &F {
        &self.load_fn
    }

    /// Loads one key, joining the open batch window unless it is cached
    /// or already in flight.
    pub async fn load(&self, key: K) -> Result<V, LoadError<F::Error>> {
        let (ticket, plan) = {
            let mut state = self.state();
            if self.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            let mut plan = Plan {
                full: Vec::new(),
                lead: None,
            };
            let ticket = self.enqueue(&mut state, key, &mut plan);
            if ticket.is_waiting() {
                plan.lead = self.leader_window(&state);
            }
            (ticket, plan)
        };
        self.drive(plan).await;
        ticket.resolve().await
    }

    /// Loads every key through the same window. Results follow the order
    /// of `keys`, repeated keys included.
    pub async fn load_many(&self, keys: Vec<K>) -> Vec<Result<V, LoadError<F::Error>>> {
        let (tickets, plan) = {
            let mut state = self.state();
            if self.is_cancelled() {
                return keys.iter().map(|_| Err(LoadError::Cancelled)).collect();
            }
            let mut plan = Plan {
                full: Vec::new(),
                lead: None,
            };
            let tickets = keys
                .into_iter()
                .map(|key| self.enqueue(&mut state, key, &mut plan))
                .collect::<Vec<_>>();
            if tickets.iter().any(Ticket::is_waiting) {
                plan.lead = self.leader_window(&state);
            }
            (tickets, plan)
        };
        self.drive(plan).await;
        future::join_all(tickets.into_iter().map(Ticket::resolve)).await
    }

    /// Like [`load_many`](Self::load_many), failing with the first error
    /// in key order.
    pub async fn try_load_many(&self, keys: Vec<K>) -> Result<Vec<V>, LoadError<F::Error>> {
        self.load_many(keys).await.into_iter().collect()
    }

    /// Closes the open window now and runs its fetch.
    pub async fn dispatch(&self) {
        let batch = self.in_flight(self.state().take_batch());
        self.fetch(batch).await;
    }

    /// Seeds the cache. Keys that are cached or in flight are left alone.
    pub fn prime(&self, key: K, value: V) {
        self.state()
            .entries
            .entry(key)
            .or_insert(Entry::Loaded(value));
    }

    /// Drops a cached value so the next `load` fetches it again.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state();
        if !matches!(state.entries.get(key), Some(Entry::Loaded(_))) {
            return None;
        }
        match state.entries.remove(key) {
            Some(Entry::Loaded(value)) => Some(value),
            _ => None,
        }
    }

    /// Drops every cached value. Keys in flight still resolve.
    pub fn clear(&self) {
        self.state()
            .entries
            .retain(|_, entry| matches!(entry, Entry::Pending(_)));
    }

    pub fn cached_len(&self) -> usize {
        self.state()
            .entries
            .values()
            .filter(|entry| matches!(entry, Entry::Loaded(_)))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, State<K, V, F::Error>> {
        lock(&self.state)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelSignal::is_cancelled)
    }

    fn enqueue<'a>(
        &'a self,
        state: &mut State<K, V, F::Error>,
        key: K,
        plan: &mut Plan<'a, K, V, F::Error>,
    ) -> Ticket<V, F::Error> {
        let ticket = state.enqueue(key);
        if state.queue.len() >= self.config.max_batch_size {
            plan.full.push(self.in_flight(state.take_batch()));
        }
        ticket
    }

    fn in_flight(&self, keys: Vec<K>) -> InFlight<'_, K, V, F::Error> {
        InFlight {
            state: &*self.state,
            keys,
            armed: true,
        }
    }

    // Every waiting caller offers to close the open window; the first one
    // to finish waiting takes it, the rest find the window already gone.
    fn leader_window(&self, state: &State<K, V, F::Error>) -> Option<u64> {
        if state.queue.is_empty() || self.config.trigger == Trigger::Manual {
            return None;
        }
        Some(state.window)
    }

    async fn drive(&self, plan: Plan<'_, K, V, F::Error>) {
        for batch in plan.full {
            self.fetch(batch).await;
        }
        if let Some(window) = plan.lead {
            self.wait_for_work().await;
            let batch = {
                let mut state = self.state();
                if state.window != window {
                    return;
                }
                self.in_flight(state.take_batch())
            };
            self.fetch(batch).await;
        }
    }

    async fn wait_for_work(&self) {
        match self.config.trigger {
            Trigger::Yield(count) => {
                // yield for other load to append request
                for _ in 0..count {
                    runtime::yield_now().await;
                }
            }
            Trigger::Delay(delay) => runtime::sleep(delay).await,
            Trigger::Manual => {}
        }
    }

    async fn fetch(&self, in_flight: InFlight<'_, K, V, F::Error>) {
        if in_flight.keys.is_empty() {
            return;
        }

        let outcome = if self.is_cancelled() {
            None
        } else {
            debug!(
                loader = self.name,
                keys = in_flight.keys.len(),
                "dispatching batch"
            );
            let load = self.load_fn.load(&in_flight.keys);
            match &self.cancel {
                Some(cancel) => match future::select(cancel.cancelled(), load).await {
                    Either::Left(_) => None,
                    Either::Right((result, _)) => Some(result),
                },
                None => Some(load.await),
            }
        };

        let keys = in_flight.disarm();
        let outcome = match outcome {
            None => Err(LoadError::Cancelled),
            Some(Err(err)) => Err(LoadError::BatchFn(err)),
            Some(Ok(values)) if values.len() != keys.len() => {
                Err(LoadError::UnequalKeyValueSize {
                    key_count: keys.len(),
                    value_count: values.len(),
                })
            }
            Some(Ok(values)) => Ok(values),
        };

        let mut state = self.state();
        match outcome {
            Ok(values) => {
                for (key, value) in keys.into_iter().zip(values) {
                    for waiter in state.settle(key, value.clone()) {
                        let _ = waiter.send(Ok(value.clone()));
                    }
                }
            }
            Err(err) => {
                warn!(loader = self.name, keys = keys.len(), error = ?err, "batch failed");
                for key in &keys {
                    for waiter in state.release(key) {
                        let _ = waiter.send(Err(err.clone()));
                    }
                }
            }
        }
    }
}
