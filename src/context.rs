//! Binding loaders to inbound requests.
//!
//! A [`LoaderLayer`] lives for the whole process. For every inbound request
//! it hands out a [`RequestContext`] with a fresh [`Loaders`] registry, and
//! handlers and resolvers receive that context as an argument. There is no
//! ambient lookup, so a resolver cannot run without its request's loaders.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug_span, Instrument as _};

use crate::cancel::{cancel_pair, CancelHandle};
use crate::config::LoaderConfig;
use crate::model::AuthedUser;
use crate::registry::Loaders;
use crate::store::Store;

#[derive(Clone)]
pub struct LoaderLayer {
    store: Arc<dyn Store>,
    config: LoaderConfig,
}

impl LoaderLayer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        LoaderLayer {
            store,
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the context of one inbound request. `principal` is whoever
    /// the authentication layer resolved for it, if anyone.
    pub fn attach(&self, principal: Option<AuthedUser>) -> RequestContext {
        let (cancel, signal) = cancel_pair();
        let loaders = Loaders::new(
            self.store.clone(),
            self.config.clone(),
            signal,
            principal.as_ref().map(|user| user.id),
        );
        RequestContext {
            inner: Arc::new(RequestInner {
                loaders,
                principal,
                cancel,
            }),
        }
    }

    /// Runs `handler` with a fresh context and cancels whatever the handler
    /// left in flight once it returns.
    pub async fn scope<H, Fut, T>(&self, principal: Option<AuthedUser>, handler: H) -> T
    where
        H: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = T>,
    {
        let span = debug_span!(
            "request",
            user_id = ?principal.as_ref().map(|user| user.id)
        );
        let ctx = self.attach(principal);
        let output = handler(ctx.clone()).instrument(span).await;
        ctx.cancel();
        output
    }
}

impl std::fmt::Debug for LoaderLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderLayer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Everything request-scoped a resolver needs. Cheap to clone; the request
/// counts as cancelled once [`cancel`](Self::cancel) is called or the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<RequestInner>,
}

#[derive(Debug)]
struct RequestInner {
    loaders: Loaders,
    principal: Option<AuthedUser>,
    cancel: CancelHandle,
}

impl RequestContext {
    pub fn loaders(&self) -> &Loaders {
        &self.inner.loaders
    }

    pub fn principal(&self) -> Option<&AuthedUser> {
        self.inner.principal.as_ref()
    }

    /// Fails every batch of this request that is still in flight, and every
    /// later load, with [`LoadError::Cancelled`](crate::LoadError::Cancelled).
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }
}
