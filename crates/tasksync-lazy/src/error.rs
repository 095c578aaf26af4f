//! Error types for awaiting a lazy value.

use thiserror::Error;

/// Why [`LazyAsync::resolve`](crate::LazyAsync::resolve) did not yield a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError<E> {
    /// The producer finished with an error. The same error is returned to
    /// every reader until the cache is reset.
    #[error("lazy load failed: {0}")]
    Failed(E),

    /// The awaited load was superseded by a reset before it settled.
    #[error("load of generation {awaited} was superseded by a reset (now at generation {current})")]
    Stale {
        /// Generation whose load was being awaited.
        awaited: u64,
        /// Generation of the cache when the reset was observed.
        current: u64,
    },

    /// The load task stopped without producing a result (it panicked or the
    /// runtime dropped it).
    #[error("load of generation {generation} ended without a result")]
    Abandoned {
        /// Generation of the abandoned load.
        generation: u64,
    },
}

impl<E> ResolveError<E> {
    /// Returns the producer's error, if that is what this is.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Stale { .. } | Self::Abandoned { .. } => None,
        }
    }

    /// Returns true if a reset raced with the awaited load.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}
