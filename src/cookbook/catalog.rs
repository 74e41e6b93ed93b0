//! Wire decoding against a set of cookbooks
//!
//! The inverse of recipe serialisation: every `{"Type": {...}}` object is looked up
//! in the cookbook that declares `Type`, which supplies the domain and keyedness the
//! wire form does not carry.

use super::{Cookbook, IngredientBuilder};
use crate::error::SchemaError;
use crate::ingredient::{BaseIngredient, Ingredient, KeyedIngredient, Properties, KEY_PROPERTY};
use crate::recipe::{Recipe, Scope};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Catalog {
    cookbooks: Vec<Cookbook>,
    owners: HashMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeWire {
    #[serde(default)]
    context: Option<String>,
    #[serde(default, rename = "contextIngredient")]
    context_ingredient: Option<Value>,
    #[serde(default)]
    ingredients: Vec<Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a cookbook's ingredient types. Fails if another cookbook already owns
    /// one of them, leaving the catalog unchanged.
    pub fn add_cookbook(&mut self, cookbook: Cookbook) -> Result<&mut Self, SchemaError> {
        if let Some(taken) = cookbook
            .ingredient_types()
            .find(|t| self.owners.contains_key(*t))
        {
            let owner = &self.cookbooks[self.owners[taken]];
            return Err(SchemaError::InvalidCookbook(format!(
                "ingredient type '{}' of domain '{}' is already declared by domain '{}'",
                taken,
                cookbook.domain(),
                owner.domain()
            )));
        }

        let position = self.cookbooks.len();
        for ingredient_type in cookbook.ingredient_types() {
            self.owners.insert(ingredient_type.to_string(), position);
        }
        debug!(domain = cookbook.domain(), "Added cookbook to catalog");
        self.cookbooks.push(cookbook);
        Ok(self)
    }

    pub fn cookbooks(&self) -> &[Cookbook] {
        &self.cookbooks
    }

    pub fn cookbook_for(&self, ingredient_type: &str) -> Option<&Cookbook> {
        self.owners
            .get(ingredient_type)
            .map(|&position| &self.cookbooks[position])
    }

    /// Start building an ingredient from whichever cookbook declares it
    pub fn ingredient(&self, ingredient_type: &str) -> Result<IngredientBuilder<'_>, SchemaError> {
        self.cookbook_for(ingredient_type)
            .ok_or_else(|| SchemaError::UnknownIngredientType(ingredient_type.to_string()))?
            .ingredient(ingredient_type)
    }

    pub fn recipe_from_json(&self, json: &str) -> Result<Recipe, SchemaError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        self.decode_recipe(&value)
    }

    /// Decode a top-level `{"Recipe": {...}}` object
    pub fn decode_recipe(&self, value: &Value) -> Result<Recipe, SchemaError> {
        match self.decode_ingredient(value)? {
            Ingredient::Recipe(recipe) => {
                debug!(leaves = recipe.leaves().len(), "Decoded recipe");
                Ok(recipe)
            }
            other => Err(SchemaError::Malformed(format!(
                "expected a Recipe, found {}",
                other.ingredient_type()
            ))),
        }
    }

    pub fn decode_ingredient(&self, value: &Value) -> Result<Ingredient, SchemaError> {
        let (ingredient_type, body) = single_entry(value)?;
        if ingredient_type == Recipe::TYPE {
            return self.decode_recipe_body(body).map(Ingredient::from);
        }

        let cookbook = self
            .cookbook_for(ingredient_type)
            .ok_or_else(|| SchemaError::UnknownIngredientType(ingredient_type.to_string()))?;
        let schema = cookbook
            .schema(ingredient_type)
            .ok_or_else(|| SchemaError::UnknownIngredientType(ingredient_type.to_string()))?;

        let mut properties: Properties = body
            .as_object()
            .cloned()
            .ok_or_else(|| {
                SchemaError::Malformed(format!("body of {} is not an object", ingredient_type))
            })?;

        let key = if schema.keyed {
            match properties.remove(KEY_PROPERTY) {
                None | Some(Value::Null) => None,
                Some(Value::String(key)) => Some(key),
                Some(other) => {
                    return Err(SchemaError::TypeMismatch {
                        ingredient: ingredient_type.to_string(),
                        property: KEY_PROPERTY.to_string(),
                        expected: "string".to_string(),
                        actual: super::types::describe(&other),
                    })
                }
            }
        } else {
            None
        };

        for (name, property_value) in &properties {
            schema.validate_property(name, property_value, cookbook.enums())?;
        }
        for property in schema.properties.iter().filter(|p| p.required) {
            if properties.contains_key(&property.name) {
                continue;
            }
            match &property.default {
                Some(default) => {
                    properties.insert(property.name.clone(), default.clone());
                }
                None => {
                    return Err(SchemaError::MissingRequired {
                        ingredient: ingredient_type.to_string(),
                        property: property.name.clone(),
                    })
                }
            }
        }

        let base = BaseIngredient::from_parts(
            ingredient_type.to_string(),
            Some(cookbook.domain().to_string()),
            properties,
        );
        Ok(if schema.keyed {
            KeyedIngredient::from_base(base, key).into()
        } else {
            base.into()
        })
    }

    fn decode_recipe_body(&self, body: &Value) -> Result<Recipe, SchemaError> {
        let wire = RecipeWire::deserialize(body)
            .map_err(|e| SchemaError::Malformed(format!("Recipe body: {}", e)))?;

        let scope = match (wire.context, wire.context_ingredient) {
            (Some(_), Some(_)) => {
                return Err(SchemaError::Malformed(
                    "Recipe cannot have both context and contextIngredient".to_string(),
                ))
            }
            (Some(context), None) => Some(Scope::Context(context)),
            (None, Some(ingredient)) => match self.decode_ingredient(&ingredient)? {
                Ingredient::Keyed(keyed) => Some(Scope::Ingredient(keyed)),
                Ingredient::Base(base) => {
                    return Err(SchemaError::NotKeyed(base.ingredient_type().to_string()))
                }
                Ingredient::Recipe(_) => {
                    return Err(SchemaError::Malformed(
                        "contextIngredient cannot be a Recipe".to_string(),
                    ))
                }
            },
            (None, None) => None,
        };

        let ingredients = wire
            .ingredients
            .iter()
            .map(|child| self.decode_ingredient(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Recipe::from_parts(ingredients, scope))
    }
}

fn single_entry(value: &Value) -> Result<(&str, &Value), SchemaError> {
    let object = value
        .as_object()
        .ok_or_else(|| SchemaError::Malformed("ingredient is not an object".to_string()))?;
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some((ingredient_type, body)), None) => Ok((ingredient_type.as_str(), body)),
        _ => Err(SchemaError::Malformed(format!(
            "ingredient object must have exactly one entry, found {}",
            object.len()
        ))),
    }
}
