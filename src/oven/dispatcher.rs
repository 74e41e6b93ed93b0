//! Dispatcher abstraction
//!
//! A dispatcher receives one serialised `{recipe, cake}` payload and answers with
//! the resulting cake JSON. It may bake locally or forward the payload to another
//! process; the oven only sees the string contract.

use crate::error::OvenError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Dispatch target for one or more domains
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Bake `payload` and return the updated cake as JSON
    async fn dispatch(&self, payload: String) -> anyhow::Result<String>;
}

/// Dispatcher built from an async closure
pub struct FnDispatcher<F>(F);

impl<F, Fut> FnDispatcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Dispatcher for FnDispatcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn dispatch(&self, payload: String) -> anyhow::Result<String> {
        (self.0)(payload).await
    }
}

/// Dispatcher built from a blocking closure. The closure runs inline on the
/// dispatching task; dispatch is sequential, so nothing else waits on it.
pub struct BlockingDispatcher<F>(F);

impl<F> BlockingDispatcher<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Dispatcher for BlockingDispatcher<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
{
    async fn dispatch(&self, payload: String) -> anyhow::Result<String> {
        (self.0)(&payload)
    }
}

/// Registration surface shared by every oven
pub trait DispatcherRegistry {
    /// Route `domain` to `dispatcher`. A domain can be registered once.
    fn add_dispatcher(
        &mut self,
        domain: &str,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<(), OvenError>;

    /// Set or clear the dispatcher used for domains without their own
    fn set_default_dispatcher(
        &mut self,
        dispatcher: Option<Arc<dyn Dispatcher>>,
    ) -> Result<(), OvenError>;
}
