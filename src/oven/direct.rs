//! Oven bound to a single local backend
//!
//! Every segment, whatever its domain, goes to the same `BackendOven`. Useful when
//! all hooks live in-process and in tests.

use super::{Dispatcher, DispatcherRegistry, Oven, OvenSettings};
use crate::backend::BackendOven;
use crate::cake::Cake;
use crate::error::OvenError;
use crate::recipe::Recipe;
use std::sync::Arc;

pub struct DirectDispatchOven {
    oven: Oven,
    backend: Arc<BackendOven>,
}

impl DirectDispatchOven {
    pub fn new(backend: BackendOven) -> Self {
        Self::with_settings(backend, OvenSettings::default())
    }

    pub fn with_settings(backend: BackendOven, settings: OvenSettings) -> Self {
        let backend = Arc::new(backend);
        let mut oven = Oven::with_settings(settings);
        oven.default_dispatcher = Some(Arc::clone(&backend) as Arc<dyn Dispatcher>);
        Self { oven, backend }
    }

    pub fn backend(&self) -> &BackendOven {
        &self.backend
    }

    pub async fn bake(&self, recipe: &Recipe) -> Result<Cake, OvenError> {
        self.oven.bake(recipe).await
    }

    pub fn bake_blocking(&self, recipe: &Recipe) -> Result<Cake, OvenError> {
        self.oven.bake_blocking(recipe)
    }
}

impl DispatcherRegistry for DirectDispatchOven {
    fn add_dispatcher(
        &mut self,
        _domain: &str,
        _dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<(), OvenError> {
        Err(OvenError::UnsupportedOperation(
            "cannot add dispatchers to a DirectDispatchOven",
        ))
    }

    fn set_default_dispatcher(
        &mut self,
        _dispatcher: Option<Arc<dyn Dispatcher>>,
    ) -> Result<(), OvenError> {
        Err(OvenError::UnsupportedOperation(
            "cannot overwrite default dispatcher in DirectDispatchOven",
        ))
    }
}
