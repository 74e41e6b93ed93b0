//! Wire snapshots received by the backend
//!
//! The backend does not need typed ingredients: a leaf is its type name plus the raw
//! property object, which the matching hook deserialises into its own data type.

use crate::cake::Cake;
use crate::ingredient::KEY_PROPERTY;
use crate::recipe::Recipe;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One node of a received recipe tree
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientSnapshot {
    Ingredient { ingredient_type: String, data: Value },
    Recipe(RecipeSnapshot),
}

impl IngredientSnapshot {
    pub fn ingredient_type(&self) -> &str {
        match self {
            IngredientSnapshot::Ingredient {
                ingredient_type, ..
            } => ingredient_type,
            IngredientSnapshot::Recipe(_) => Recipe::TYPE,
        }
    }

    /// Key of a keyed ingredient, if it was sent with one
    pub fn key(&self) -> Option<&str> {
        match self {
            IngredientSnapshot::Ingredient { data, .. } => {
                data.get(KEY_PROPERTY).and_then(Value::as_str)
            }
            IngredientSnapshot::Recipe(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for IngredientSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wrapper = Map::<String, Value>::deserialize(deserializer)?;
        if wrapper.len() != 1 {
            return Err(D::Error::custom(format!(
                "expected an object with exactly one ingredient type, found {} entries",
                wrapper.len()
            )));
        }
        let Some((ingredient_type, data)) = wrapper.into_iter().next() else {
            return Err(D::Error::custom("empty ingredient object"));
        };

        if ingredient_type == Recipe::TYPE {
            let recipe = serde_json::from_value(data).map_err(D::Error::custom)?;
            return Ok(IngredientSnapshot::Recipe(recipe));
        }
        if !data.is_object() {
            return Err(D::Error::custom(format!(
                "properties of {} must be an object",
                ingredient_type
            )));
        }
        Ok(IngredientSnapshot::Ingredient {
            ingredient_type,
            data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RecipeSnapshot {
    #[serde(default)]
    pub ingredients: Vec<IngredientSnapshot>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, rename = "contextIngredient")]
    pub context_ingredient: Option<Box<IngredientSnapshot>>,
}

/// Payload accepted by `BackendOven::bake`
#[derive(Debug, Clone, Deserialize)]
pub struct BackendPayload {
    pub recipe: IngredientSnapshot,
    #[serde(default)]
    pub cake: Cake,
}
