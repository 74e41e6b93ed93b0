//! Recipes
//!
//! An ordered tree of ingredients, optionally scoped by a context name or by a keyed
//! ingredient whose key names the scope. Scope-less child recipes are spliced into
//! their parent on construction, so every nested recipe in a tree carries a scope.

pub mod segment;

pub use segment::Segment;

use crate::ingredient::{BaseIngredient, Ingredient, KeyedIngredient};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Namespace opened around a recipe's children
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// Explicit namespace name
    Context(String),
    /// Keyed ingredient baked before the children; its key names the namespace
    Ingredient(KeyedIngredient),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recipe {
    ingredients: Vec<Ingredient>,
    scope: Option<Scope>,
}

impl Recipe {
    /// Wire type name
    pub const TYPE: &'static str = "Recipe";

    /// Recipe without a scope
    pub fn prepare<I>(ingredients: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Ingredient>,
    {
        Self::from_parts(ingredients.into_iter().map(Into::into), None)
    }

    /// Recipe whose children run inside namespace `context`
    pub fn context<I>(context: impl Into<String>, ingredients: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Ingredient>,
    {
        Self::from_parts(
            ingredients.into_iter().map(Into::into),
            Some(Scope::Context(context.into())),
        )
    }

    /// Recipe that bakes `ingredient` first, then its children inside the
    /// namespace named by the ingredient's key (or the enclosing one without a key)
    pub fn context_ingredient<I>(ingredient: KeyedIngredient, ingredients: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Ingredient>,
    {
        Self::from_parts(
            ingredients.into_iter().map(Into::into),
            Some(Scope::Ingredient(ingredient)),
        )
    }

    pub(crate) fn from_parts(
        ingredients: impl IntoIterator<Item = Ingredient>,
        scope: Option<Scope>,
    ) -> Self {
        let mut recipe = Self::stub(scope);
        for ingredient in ingredients {
            recipe.push(ingredient);
        }
        recipe
    }

    /// Empty recipe carrying `scope`
    pub(crate) fn stub(scope: Option<Scope>) -> Self {
        Self {
            ingredients: Vec::new(),
            scope,
        }
    }

    /// Append a child, splicing scope-less recipes in place
    pub(crate) fn push(&mut self, ingredient: Ingredient) {
        match ingredient {
            Ingredient::Recipe(child) if child.scope.is_none() => {
                self.ingredients.extend(child.ingredients)
            }
            other => self.ingredients.push(other),
        }
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn context_name(&self) -> Option<&str> {
        match &self.scope {
            Some(Scope::Context(name)) => Some(name),
            _ => None,
        }
    }

    pub fn scope_ingredient(&self) -> Option<&KeyedIngredient> {
        match &self.scope {
            Some(Scope::Ingredient(ingredient)) => Some(ingredient),
            _ => None,
        }
    }

    /// Namespace the children run in, relative to the enclosing one
    pub fn namespace(&self) -> Option<&str> {
        match &self.scope {
            Some(Scope::Context(name)) => Some(name),
            Some(Scope::Ingredient(ingredient)) => ingredient.key(),
            None => None,
        }
    }

    /// True when the recipe holds no children (a context ingredient alone is not empty)
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.scope_ingredient().is_none()
    }

    /// Depth-first leaf order. A context ingredient precedes its recipe's children.
    pub fn leaves(&self) -> Vec<&BaseIngredient> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a BaseIngredient>) {
        if let Some(ingredient) = self.scope_ingredient() {
            leaves.push(ingredient.as_base());
        }
        for child in &self.ingredients {
            match child {
                Ingredient::Recipe(recipe) => recipe.collect_leaves(leaves),
                Ingredient::Base(base) => leaves.push(base),
                Ingredient::Keyed(keyed) => leaves.push(keyed.as_base()),
            }
        }
    }

    /// Split into contiguous single-domain segments, preserving scope structure
    pub fn segment(&self) -> Vec<Segment> {
        segment::segment(self)
    }
}

#[derive(Serialize)]
struct RecipeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
    #[serde(rename = "contextIngredient", skip_serializing_if = "Option::is_none")]
    context_ingredient: Option<&'a KeyedIngredient>,
    ingredients: &'a [Ingredient],
}

impl Serialize for Recipe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = RecipeBody {
            context: self.context_name(),
            context_ingredient: self.scope_ingredient(),
            ingredients: &self.ingredients,
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(Self::TYPE, &body)?;
        map.end()
    }
}
