//! Backend Oven
//!
//! Local dispatch target. Receives a `{recipe, cake}` payload, walks the recipe tree
//! depth-first invoking the registered hook for each leaf, and returns the resulting
//! cake as JSON. Namespaces opened by recipe scopes are restored on every exit path.

pub mod hook;
pub mod snapshot;

pub use hook::{hook_fn, FnHook, IngredientHook};
pub use snapshot::{BackendPayload, IngredientSnapshot, RecipeSnapshot};

use crate::cake::Cake;
use crate::error::BakeError;
use crate::oven::Dispatcher;
use async_trait::async_trait;
use hook::ErasedHook;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Hook registry and tree walker
#[derive(Default)]
pub struct BackendOven {
    hooks: HashMap<String, Box<dyn ErasedHook>>,
}

impl BackendOven {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` for its ingredient type, replacing any earlier hook for that type
    pub fn register_hook<H>(&mut self, hook: H) -> &mut Self
    where
        H: IngredientHook + 'static,
    {
        let ingredient_type = hook.ingredient_type().to_string();
        if self
            .hooks
            .insert(ingredient_type.clone(), Box::new(hook))
            .is_some()
        {
            debug!(ingredient = %ingredient_type, "Replaced ingredient hook");
        }
        self
    }

    pub fn has_hook(&self, ingredient_type: &str) -> bool {
        self.hooks.contains_key(ingredient_type)
    }

    /// Bake a JSON payload and return the resulting cake as JSON
    pub fn bake(&self, payload: &str) -> Result<String, BakeError> {
        let payload: BackendPayload = serde_json::from_str(payload)?;
        let cake = self.bake_payload(payload)?;
        Ok(serde_json::to_string(&cake)?)
    }

    pub fn bake_payload(&self, payload: BackendPayload) -> Result<Cake, BakeError> {
        let mut cake = payload.cake;
        self.bake_ingredient(payload.recipe, &mut cake)?;
        Ok(cake)
    }

    fn bake_ingredient(
        &self,
        ingredient: IngredientSnapshot,
        cake: &mut Cake,
    ) -> Result<(), BakeError> {
        match ingredient {
            IngredientSnapshot::Recipe(recipe) => self.bake_recipe(recipe, cake),
            IngredientSnapshot::Ingredient {
                ingredient_type,
                data,
            } => self.bake_leaf(&ingredient_type, data, cake),
        }
    }

    fn bake_recipe(&self, recipe: RecipeSnapshot, cake: &mut Cake) -> Result<(), BakeError> {
        let RecipeSnapshot {
            ingredients,
            context,
            context_ingredient,
        } = recipe;

        match (context, context_ingredient) {
            (Some(_), Some(_)) => Err(BakeError::MalformedIngredient(
                "recipe has both context and contextIngredient".to_string(),
            )),
            (Some(context), None) => {
                cake.in_namespace(&context, |cake| self.bake_all(ingredients, cake))
            }
            (None, Some(context_ingredient)) => {
                let key = match context_ingredient.as_ref() {
                    IngredientSnapshot::Recipe(_) => {
                        return Err(BakeError::MalformedIngredient(
                            "contextIngredient cannot be a recipe".to_string(),
                        ))
                    }
                    leaf => leaf.key().map(str::to_string),
                };
                self.bake_ingredient(*context_ingredient, cake)?;
                match key {
                    Some(key) => cake.in_namespace(&key, |cake| self.bake_all(ingredients, cake)),
                    None => self.bake_all(ingredients, cake),
                }
            }
            (None, None) => self.bake_all(ingredients, cake),
        }
    }

    fn bake_all(
        &self,
        ingredients: Vec<IngredientSnapshot>,
        cake: &mut Cake,
    ) -> Result<(), BakeError> {
        for ingredient in ingredients {
            self.bake_ingredient(ingredient, cake)?;
        }
        Ok(())
    }

    fn bake_leaf(
        &self,
        ingredient_type: &str,
        data: Value,
        cake: &mut Cake,
    ) -> Result<(), BakeError> {
        let hook = self
            .hooks
            .get(ingredient_type)
            .ok_or_else(|| BakeError::UnknownIngredientType(ingredient_type.to_string()))?;
        trace!(ingredient = %ingredient_type, namespace = %cake.namespace(), "Running hook");
        hook.bake_value(data, cake)
    }
}

#[async_trait]
impl Dispatcher for BackendOven {
    async fn dispatch(&self, payload: String) -> anyhow::Result<String> {
        Ok(self.bake(&payload)?)
    }
}
