//! Oven: the dispatch pipeline
//!
//! Segments a recipe by domain, resolves a dispatcher for every segment up front,
//! then folds over the segments in order. Each dispatch receives the current cake
//! and returns its replacement.

pub mod direct;
pub mod dispatcher;
pub mod payload;

pub use direct::DirectDispatchOven;
pub use dispatcher::{BlockingDispatcher, Dispatcher, DispatcherRegistry, FnDispatcher};
pub use payload::Payload;

use crate::cake::Cake;
use crate::error::OvenError;
use crate::recipe::{Recipe, Segment};
use futures::stream::{self, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Oven behaviour settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvenSettings {
    /// Log request and response bodies at trace level
    pub log_payloads: bool,
}

#[derive(Default)]
pub struct Oven {
    dispatchers: HashMap<String, Arc<dyn Dispatcher>>,
    default_dispatcher: Option<Arc<dyn Dispatcher>>,
    settings: OvenSettings,
}

impl Oven {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: OvenSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &OvenSettings {
        &self.settings
    }

    pub fn has_dispatcher(&self, domain: &str) -> bool {
        self.dispatchers.contains_key(domain)
    }

    /// Bake `recipe` starting from an empty cake
    #[instrument(skip_all, fields(segments = tracing::field::Empty))]
    pub async fn bake(&self, recipe: &Recipe) -> Result<Cake, OvenError> {
        let segments = recipe.segment();
        tracing::Span::current().record("segments", segments.len());

        let tasks = self.plan(segments)?;
        let cake = stream::iter(tasks.into_iter().enumerate().map(Ok::<_, OvenError>))
            .try_fold(Cake::new(), move |cake, (index, (segment, dispatcher))| async move {
                self.dispatch_segment(index, &segment, dispatcher, &cake).await
            })
            .await?;

        debug!(entries = cake.len(), "Recipe baked");
        Ok(cake)
    }

    /// Drive `bake` on a private current-thread runtime.
    ///
    /// Fails when called from inside an async runtime; use `bake` there.
    pub fn bake_blocking(&self, recipe: &Recipe) -> Result<Cake, OvenError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(OvenError::UnsupportedOperation(
                "bake_blocking cannot run inside an async runtime",
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.bake(recipe))
    }

    /// Pair every segment with its dispatcher before anything is sent
    fn plan(
        &self,
        segments: Vec<Segment>,
    ) -> Result<Vec<(Segment, Arc<dyn Dispatcher>)>, OvenError> {
        let mut tasks = Vec::with_capacity(segments.len());
        for segment in segments {
            let dispatcher = self
                .resolve(segment.domain())
                .ok_or_else(|| OvenError::NoDispatcherForDomain(segment.domain.clone()))?;
            tasks.push((segment, dispatcher));
        }
        Ok(tasks)
    }

    fn resolve(&self, domain: Option<&str>) -> Option<Arc<dyn Dispatcher>> {
        domain
            .and_then(|d| self.dispatchers.get(d))
            .or(self.default_dispatcher.as_ref())
            .cloned()
    }

    async fn dispatch_segment(
        &self,
        index: usize,
        segment: &Segment,
        dispatcher: Arc<dyn Dispatcher>,
        cake: &Cake,
    ) -> Result<Cake, OvenError> {
        let payload = Payload::new(&segment.recipe, cake).to_json()?;
        debug!(
            index,
            domain = segment.domain().unwrap_or("<none>"),
            bytes = payload.len(),
            "Dispatching segment"
        );
        if self.settings.log_payloads {
            trace!(index, payload = %payload, "Segment payload");
        }

        let reply = dispatcher
            .dispatch(payload)
            .await
            .map_err(|source| OvenError::Dispatch {
                domain: segment.domain.clone(),
                index,
                source,
            })?;
        if self.settings.log_payloads {
            trace!(index, reply = %reply, "Dispatcher reply");
        }

        Ok(serde_json::from_str(&reply)?)
    }
}

impl DispatcherRegistry for Oven {
    fn add_dispatcher(
        &mut self,
        domain: &str,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<(), OvenError> {
        if self.dispatchers.contains_key(domain) {
            return Err(OvenError::DuplicateDispatcher(domain.to_string()));
        }
        debug!(domain, "Registered dispatcher");
        self.dispatchers.insert(domain.to_string(), dispatcher);
        Ok(())
    }

    fn set_default_dispatcher(
        &mut self,
        dispatcher: Option<Arc<dyn Dispatcher>>,
    ) -> Result<(), OvenError> {
        self.default_dispatcher = dispatcher;
        Ok(())
    }
}
