//! Ingredient hooks: the per-type callbacks a backend runs for each leaf.

use crate::cake::Cake;
use crate::error::BakeError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Callback for one ingredient type.
///
/// `Data` is deserialised from the ingredient's property object, so a keyed
/// ingredient's data also sees its `key`.
pub trait IngredientHook: Send + Sync {
    type Data: DeserializeOwned;

    fn ingredient_type(&self) -> &str;

    fn bake(&self, data: Self::Data, cake: &mut Cake) -> anyhow::Result<()>;
}

/// Object-safe form stored by the backend
pub(crate) trait ErasedHook: Send + Sync {
    fn bake_value(&self, data: Value, cake: &mut Cake) -> Result<(), BakeError>;
}

impl<H: IngredientHook> ErasedHook for H {
    fn bake_value(&self, data: Value, cake: &mut Cake) -> Result<(), BakeError> {
        let data: H::Data = serde_json::from_value(data).map_err(|e| {
            BakeError::MalformedIngredient(format!("{}: {}", self.ingredient_type(), e))
        })?;
        self.bake(data, cake).map_err(|source| BakeError::Hook {
            ingredient: self.ingredient_type().to_string(),
            source,
        })
    }
}

/// Hook built from a closure
pub struct FnHook<D, F> {
    ingredient_type: String,
    callback: F,
    _data: PhantomData<fn() -> D>,
}

impl<D, F> IngredientHook for FnHook<D, F>
where
    D: DeserializeOwned,
    F: Fn(D, &mut Cake) -> anyhow::Result<()> + Send + Sync,
{
    type Data = D;

    fn ingredient_type(&self) -> &str {
        &self.ingredient_type
    }

    fn bake(&self, data: D, cake: &mut Cake) -> anyhow::Result<()> {
        (self.callback)(data, cake)
    }
}

/// Wrap a closure as a hook for `ingredient_type`
pub fn hook_fn<D, F>(ingredient_type: impl Into<String>, callback: F) -> FnHook<D, F>
where
    D: DeserializeOwned,
    F: Fn(D, &mut Cake) -> anyhow::Result<()> + Send + Sync,
{
    FnHook {
        ingredient_type: ingredient_type.into(),
        callback,
        _data: PhantomData,
    }
}
