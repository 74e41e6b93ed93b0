//! Ingredients
//!
//! Typed, domain-tagged units of work. An ingredient carries an ordered property map
//! and serialises to the wire as a single-entry object keyed by its type:
//! `{"<Type>": {<prop>: <value>, ...}}`.

use crate::recipe::Recipe;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// Ordered property map. Insertion order is kept on the wire.
pub type Properties = serde_json::Map<String, Value>;

/// Property name a keyed ingredient uses for its key on the wire
pub const KEY_PROPERTY: &str = "key";

/// A plain ingredient
#[derive(Debug, Clone, PartialEq)]
pub struct BaseIngredient {
    ingredient_type: String,
    domain: Option<String>,
    properties: Properties,
}

impl BaseIngredient {
    /// Create an ingredient routed to `domain`
    pub fn new(ingredient_type: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            ingredient_type: ingredient_type.into(),
            domain: Some(domain.into()),
            properties: Properties::new(),
        }
    }

    /// Create an ingredient without a domain; only a default dispatcher can bake it
    pub fn without_domain(ingredient_type: impl Into<String>) -> Self {
        Self {
            ingredient_type: ingredient_type.into(),
            domain: None,
            properties: Properties::new(),
        }
    }

    pub(crate) fn from_parts(
        ingredient_type: String,
        domain: Option<String>,
        properties: Properties,
    ) -> Self {
        Self {
            ingredient_type,
            domain,
            properties,
        }
    }

    pub fn ingredient_type(&self) -> &str {
        &self.ingredient_type
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Builder-style setter. Overwriting keeps the property's original position.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Append to a repeatable property, creating the array on first use.
    /// A non-array value already stored under `name` becomes the first element.
    pub fn push_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let slot = self
            .properties
            .entry(name.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(values) => values.push(value.into()),
            other => {
                let first = other.take();
                *other = Value::Array(vec![first, value.into()]);
            }
        }
    }
}

impl Serialize for BaseIngredient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.ingredient_type, &self.properties)?;
        map.end()
    }
}

/// An ingredient that can name a cake namespace through its key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedIngredient {
    base: BaseIngredient,
    key: Option<String>,
}

impl KeyedIngredient {
    pub fn new(ingredient_type: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            base: BaseIngredient::new(ingredient_type, domain),
            key: None,
        }
    }

    pub(crate) fn from_base(base: BaseIngredient, key: Option<String>) -> Self {
        Self { base, key }
    }

    /// Set (or clear) the key, builder style
    pub fn keyed(mut self, key: impl Into<Option<String>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.base.set_property(name, value);
        self
    }

    pub fn as_base(&self) -> &BaseIngredient {
        &self.base
    }
}

impl Deref for KeyedIngredient {
    type Target = BaseIngredient;

    fn deref(&self) -> &BaseIngredient {
        &self.base
    }
}

impl DerefMut for KeyedIngredient {
    fn deref_mut(&mut self) -> &mut BaseIngredient {
        &mut self.base
    }
}

/// Wire body of a keyed ingredient. A set key replaces any `key` property.
struct KeyedBody<'a> {
    properties: &'a Properties,
    key: Option<&'a str>,
}

impl Serialize for KeyedBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.properties {
            if self.key.is_some() && name == KEY_PROPERTY {
                continue;
            }
            map.serialize_entry(name, value)?;
        }
        if let Some(key) = self.key {
            map.serialize_entry(KEY_PROPERTY, key)?;
        }
        map.end()
    }
}

impl Serialize for KeyedIngredient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = KeyedBody {
            properties: &self.base.properties,
            key: self.key.as_deref(),
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.base.ingredient_type, &body)?;
        map.end()
    }
}

/// Anything that can appear in a recipe's ingredient list
#[derive(Debug, Clone, PartialEq)]
pub enum Ingredient {
    Base(BaseIngredient),
    Keyed(KeyedIngredient),
    Recipe(Recipe),
}

impl Ingredient {
    pub fn ingredient_type(&self) -> &str {
        match self {
            Ingredient::Base(base) => base.ingredient_type(),
            Ingredient::Keyed(keyed) => keyed.ingredient_type(),
            Ingredient::Recipe(_) => Recipe::TYPE,
        }
    }

    /// Recipes have no domain of their own
    pub fn domain(&self) -> Option<&str> {
        match self {
            Ingredient::Base(base) => base.domain(),
            Ingredient::Keyed(keyed) => keyed.domain(),
            Ingredient::Recipe(_) => None,
        }
    }

    pub fn as_recipe(&self) -> Option<&Recipe> {
        match self {
            Ingredient::Recipe(recipe) => Some(recipe),
            _ => None,
        }
    }

    /// Leaf view: the base ingredient behind a plain or keyed ingredient
    pub fn as_leaf(&self) -> Option<&BaseIngredient> {
        match self {
            Ingredient::Base(base) => Some(base),
            Ingredient::Keyed(keyed) => Some(keyed.as_base()),
            Ingredient::Recipe(_) => None,
        }
    }

    /// Wire form, for embedding as a property value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Ingredient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ingredient::Base(base) => base.serialize(serializer),
            Ingredient::Keyed(keyed) => keyed.serialize(serializer),
            Ingredient::Recipe(recipe) => recipe.serialize(serializer),
        }
    }
}

impl From<BaseIngredient> for Ingredient {
    fn from(base: BaseIngredient) -> Self {
        Ingredient::Base(base)
    }
}

impl From<KeyedIngredient> for Ingredient {
    fn from(keyed: KeyedIngredient) -> Self {
        Ingredient::Keyed(keyed)
    }
}

impl From<Recipe> for Ingredient {
    fn from(recipe: Recipe) -> Self {
        Ingredient::Recipe(recipe)
    }
}
