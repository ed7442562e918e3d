//! Request-scoped batching loaders for the studyset API.
//!
//! Resolvers that need a record by key ask their request's [`Loaders`] for
//! the matching [`Loader`]. Keys requested by concurrently running resolvers
//! are merged into a single [`BatchFn`] call, each key is fetched at most once
//! per request, and every caller gets its own result back in order.
//!
//! ```no_run
//! use studyloader::{LoaderLayer, MemoryStore};
//! # async fn resolve(studyset_id: uuid::Uuid) {
//! let layer = LoaderLayer::new(MemoryStore::new_shared());
//!
//! // once per inbound request
//! let ctx = layer.attach(None);
//! let terms = ctx.loaders().studyset_terms().load(studyset_id).await;
//! # }
//! ```

mod batch_fn;
pub mod batchers;
pub mod cached;
mod cancel;
pub mod config;
pub mod context;
mod error;
pub mod model;
pub mod registry;
mod runtime;
pub mod store;

pub use batch_fn::BatchFn;
pub use cached::Loader;
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{LoaderConfig, Trigger};
pub use context::{LoaderLayer, RequestContext};
pub use error::{LoadError, StoreError, StoreResult};
pub use registry::{LoaderKind, Loaders};
pub use store::{MemoryStore, Store};

#[cfg(test)]
mod tests;
