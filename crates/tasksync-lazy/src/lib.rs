//! A lazily computed, resettable and observable async value.
//!
//! [`LazyAsync`] wraps an async producer. Nothing is computed until the value
//! is first read; the read returns the initial value straight away while the
//! producer runs on a spawned Tokio task. Once the producer settles, readers
//! see the produced value (or the captured failure) until [`LazyAsync::reset`]
//! puts the cache back to its initial state.
//!
//! Every load is tagged with a generation. A reset bumps the generation, so a
//! result that arrives late from a load started before the reset is dropped
//! instead of overwriting the fresh state.
//!
//! # Example
//!
//! ```
//! use tasksync_lazy::LazyAsync;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let answer: LazyAsync<u32, String> = LazyAsync::new(|| async { Ok(42) }, 0);
//!
//! // The first read starts the load and returns the initial value.
//! assert_eq!(answer.read(), Ok(0));
//!
//! assert_eq!(answer.resolve().await, Ok(42));
//! assert_eq!(answer.read(), Ok(42));
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;

pub use cache::{CachePhase, LazyAsync};
pub use error::ResolveError;
