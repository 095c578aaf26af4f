//! The [`LazyAsync`] value and its load state machine.
//!
//! States move `Idle -> Loading -> Ready | Failed`, and [`LazyAsync::reset`]
//! moves any non-idle state back to `Idle`. The current state lives in a
//! [`watch`] channel so that [`LazyAsync::resolve`] can wait for it to settle,
//! and value assignments are published on a [`broadcast`] channel for
//! display layers that re-render on change.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace, warn};

use crate::error::ResolveError;

/// Number of unread change notifications kept per subscriber.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

type Producer<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Load state of a [`LazyAsync`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    /// Nothing has been requested since creation or the last reset.
    Idle,
    /// A producer call is in flight.
    Loading,
    /// The producer returned a value.
    Ready,
    /// The producer returned an error.
    Failed,
}

enum Phase<T, E> {
    Idle,
    Loading,
    Ready(T),
    Failed(E),
}

impl<T, E> Phase<T, E> {
    fn kind(&self) -> CachePhase {
        match self {
            Self::Idle => CachePhase::Idle,
            Self::Loading => CachePhase::Loading,
            Self::Ready(_) => CachePhase::Ready,
            Self::Failed(_) => CachePhase::Failed,
        }
    }
}

struct Slot<T, E> {
    generation: u64,
    phase: Phase<T, E>,
}

struct Shared<T, E> {
    producer: Producer<T, E>,
    initial: T,
    slot: watch::Sender<Slot<T, E>>,
    changes: broadcast::Sender<T>,
}

/// A memoized async value that is computed on first read.
///
/// Cloning a `LazyAsync` yields another handle to the same cache.
///
/// At most one producer call is in flight at a time: repeated reads while a
/// load is running do not start another one. Loads run on spawned Tokio
/// tasks, so reads must happen inside a Tokio runtime.
///
/// # Panics
///
/// [`read`](Self::read), [`read_with_phase`](Self::read_with_phase) and
/// [`resolve`](Self::resolve) panic if they need to start a load outside a
/// Tokio runtime.
pub struct LazyAsync<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for LazyAsync<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for LazyAsync<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.shared.slot.borrow();
        f.debug_struct("LazyAsync")
            .field("generation", &slot.generation)
            .field("phase", &slot.phase.kind())
            .finish_non_exhaustive()
    }
}

impl<T, E> LazyAsync<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an idle cache around `producer`.
    ///
    /// `initial` is what readers see until the first load succeeds and again
    /// after every reset.
    pub fn new<F, Fut>(producer: F, initial: T) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let producer: Producer<T, E> = Arc::new(move || producer().boxed());
        let (slot, _) = watch::channel(Slot {
            generation: 0,
            phase: Phase::Idle,
        });
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                producer,
                initial,
                slot,
                changes,
            }),
        }
    }

    /// Returns the current value, starting a load if the cache is idle.
    ///
    /// Never waits for the producer: while a load is in flight this returns
    /// the initial value. Once a load has failed, every read returns that
    /// error until [`reset`](Self::reset).
    pub fn read(&self) -> Result<T, E> {
        self.read_with_phase().1
    }

    /// Like [`read`](Self::read), but also reports the phase the value was
    /// taken from, as one consistent snapshot.
    pub fn read_with_phase(&self) -> (CachePhase, Result<T, E>) {
        self.trigger();
        let slot = self.shared.slot.borrow();
        let value = match &slot.phase {
            Phase::Idle | Phase::Loading => Ok(self.shared.initial.clone()),
            Phase::Ready(value) => Ok(value.clone()),
            Phase::Failed(error) => Err(error.clone()),
        };
        (slot.phase.kind(), value)
    }

    /// Waits for the value of the current generation.
    ///
    /// Starts a load if the cache is idle, then waits until that load
    /// settles.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Failed`] if the producer returned an error
    /// - [`ResolveError::Stale`] if a reset superseded the awaited load
    /// - [`ResolveError::Abandoned`] if the load task stopped without a result
    pub async fn resolve(&self) -> Result<T, ResolveError<E>> {
        let mut updates = self.shared.slot.subscribe();
        let awaited = self.trigger();

        loop {
            {
                let slot = updates.borrow_and_update();
                if slot.generation != awaited {
                    return Err(ResolveError::Stale {
                        awaited,
                        current: slot.generation,
                    });
                }
                match &slot.phase {
                    Phase::Ready(value) => return Ok(value.clone()),
                    Phase::Failed(error) => return Err(ResolveError::Failed(error.clone())),
                    Phase::Idle => {
                        return Err(ResolveError::Abandoned {
                            generation: awaited,
                        });
                    }
                    Phase::Loading => {}
                }
            }

            if updates.changed().await.is_err() {
                return Err(ResolveError::Abandoned {
                    generation: awaited,
                });
            }
        }
    }

    /// Returns the cache to its initial value so the next read loads again.
    ///
    /// Does nothing when the cache is already idle. A load that is still in
    /// flight keeps running, but its result is discarded when it arrives.
    pub fn reset(&self) {
        let mut generation = None;
        self.shared.slot.send_if_modified(|slot| {
            if matches!(slot.phase, Phase::Idle) {
                return false;
            }
            slot.generation += 1;
            slot.phase = Phase::Idle;
            generation = Some(slot.generation);
            true
        });

        if let Some(generation) = generation {
            debug!(generation, "Lazy value reset");
            self.shared.publish(self.shared.initial.clone());
        }
    }

    /// Subscribes to value changes.
    ///
    /// One notification is sent for every successful load and every reset.
    /// Failed loads do not send one.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.shared.changes.subscribe()
    }

    /// Returns the current phase without starting a load.
    pub fn phase(&self) -> CachePhase {
        self.shared.slot.borrow().phase.kind()
    }

    /// Returns the current load generation. Starts at zero and increases by
    /// one on every effective reset.
    pub fn generation(&self) -> u64 {
        self.shared.slot.borrow().generation
    }

    /// Starts a load if idle and returns the generation current afterwards.
    fn trigger(&self) -> u64 {
        let mut generation = 0;
        let mut started = false;
        self.shared.slot.send_if_modified(|slot| {
            generation = slot.generation;
            if matches!(slot.phase, Phase::Idle) {
                slot.phase = Phase::Loading;
                started = true;
            }
            started
        });

        if started {
            self.spawn_load(generation);
        }
        generation
    }

    fn spawn_load(&self, generation: u64) {
        trace!(generation, "Starting lazy load");
        let load = (self.shared.producer)();
        let guard = LoadGuard {
            shared: Arc::clone(&self.shared),
            generation,
            settled: false,
        };

        tokio::spawn(async move {
            let result = load.await;
            guard.settle(result);
        });
    }
}

impl<T, E> Shared<T, E>
where
    T: Clone,
{
    fn complete(&self, generation: u64, result: Result<T, E>) {
        let mut published = None;
        let mut failed = false;
        let applied = self.slot.send_if_modified(|slot| {
            if slot.generation != generation || !matches!(slot.phase, Phase::Loading) {
                return false;
            }
            slot.phase = match result {
                Ok(value) => {
                    published = Some(value.clone());
                    Phase::Ready(value)
                }
                Err(error) => {
                    failed = true;
                    Phase::Failed(error)
                }
            };
            true
        });

        if !applied {
            debug!(
                generation,
                current = self.slot.borrow().generation,
                "Discarding stale lazy load result"
            );
            return;
        }

        if failed {
            debug!(generation, "Lazy load failed");
        }
        if let Some(value) = published {
            trace!(generation, "Lazy load completed");
            self.publish(value);
        }
    }

    fn abandon(&self, generation: u64) {
        let reverted = self.slot.send_if_modified(|slot| {
            if slot.generation == generation && matches!(slot.phase, Phase::Loading) {
                slot.phase = Phase::Idle;
                return true;
            }
            false
        });

        if reverted {
            warn!(generation, "Lazy load ended without a result, back to idle");
        }
    }

    fn publish(&self, value: T) {
        if self.changes.send(value).is_err() {
            trace!("No change subscribers");
        }
    }
}

/// Owns one in-flight load. Dropping it without settling (panic, runtime
/// shutdown) puts the cache back to idle so a later read can retry.
struct LoadGuard<T: Clone, E> {
    shared: Arc<Shared<T, E>>,
    generation: u64,
    settled: bool,
}

impl<T: Clone, E> LoadGuard<T, E> {
    fn settle(mut self, result: Result<T, E>) {
        self.settled = true;
        self.shared.complete(self.generation, result);
    }
}

impl<T: Clone, E> Drop for LoadGuard<T, E> {
    fn drop(&mut self) {
        if !self.settled {
            self.shared.abandon(self.generation);
        }
    }
}
