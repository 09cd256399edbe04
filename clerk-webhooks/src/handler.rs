//! Caller-supplied event handlers.

use std::future::Future;
use std::sync::Arc;

use axum::response::Response;
use futures::future::{BoxFuture, FutureExt};

/// What every handler returns.
///
/// `Ok(None)` acknowledges with the default 200 and empty body, `Ok(Some(_))`
/// replaces the acknowledgment, and `Err(_)` is a handler failure.
pub type HandlerResult = anyhow::Result<Option<Response>>;

type HandlerFn<T> = dyn Fn(T) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Type-erased async handler for payloads of type `T`.
pub struct Handler<T> {
    inner: Arc<HandlerFn<T>>,
}

impl<T: Send + 'static> Handler<T> {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |payload| handler(payload).boxed()),
        }
    }

    /// Start one invocation with the given payload.
    pub fn call(&self, payload: T) -> BoxFuture<'static, HandlerResult> {
        (self.inner)(payload)
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
