//! Recipe: domain-segmented command trees
//!
//! Callers compose recipes of typed ingredients, each bound to a service domain. An
//! oven splits a recipe into contiguous single-domain segments and sends each one,
//! together with the context produced so far, to that domain's dispatcher. Backends
//! bake segments by running one hook per ingredient against a namespaced cake and
//! return the updated cake to the next segment.

pub mod backend;
pub mod cake;
pub mod config;
pub mod cookbook;
pub mod error;
pub mod ingredient;
pub mod logging;
pub mod oven;
pub mod recipe;

pub use backend::{hook_fn, BackendOven, IngredientHook};
pub use cake::{Cake, NamespaceGuard};
pub use cookbook::{Catalog, Cookbook, IngredientBuilder};
pub use error::{BakeError, CakeError, ConfigError, OvenError, SchemaError};
pub use ingredient::{BaseIngredient, Ingredient, KeyedIngredient};
pub use oven::{DirectDispatchOven, Dispatcher, DispatcherRegistry, Oven, OvenSettings};
pub use recipe::{Recipe, Scope, Segment};
