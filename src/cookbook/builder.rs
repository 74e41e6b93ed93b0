//! Schema-checked ingredient construction

use super::{Cookbook, IngredientSchema, PropertyKind};
use crate::error::SchemaError;
use crate::ingredient::{BaseIngredient, Ingredient, KeyedIngredient, Properties};
use serde_json::{Map, Value};

use super::types::describe;

/// Builds one ingredient of a cookbook, checking every value as it is set.
///
/// Required properties with defaults start out set; keyed ingredients start with
/// the declared default key.
#[derive(Debug, Clone)]
pub struct IngredientBuilder<'a> {
    cookbook: &'a Cookbook,
    schema: &'a IngredientSchema,
    properties: Properties,
    key: Option<String>,
}

impl<'a> IngredientBuilder<'a> {
    pub(crate) fn new(cookbook: &'a Cookbook, schema: &'a IngredientSchema) -> Self {
        let mut properties = Properties::new();
        for property in schema.properties.iter().filter(|p| p.required) {
            if let Some(default) = &property.default {
                properties.insert(property.name.clone(), default.clone());
            }
        }
        Self {
            cookbook,
            schema,
            properties,
            key: schema.default_key.clone(),
        }
    }

    /// Set a scalar property, or append to a repeatable one
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self, SchemaError> {
        let value = value.into();
        let enums = self.cookbook.enums();
        match &self.property_kind(name)? {
            PropertyKind::Scalar(param_type) => {
                if !param_type.matches(&value, enums) {
                    return Err(self.mismatch(name, param_type.to_string(), &value));
                }
                self.properties.insert(name.to_string(), value);
            }
            PropertyKind::Repeatable(param_type) => {
                if !param_type.matches(&value, enums) {
                    return Err(self.mismatch(name, param_type.to_string(), &value));
                }
                self.append(name, value);
            }
            PropertyKind::Compound(_) | PropertyKind::RepeatableCompound(_) => {
                return Err(self.mismatch(name, "compound".to_string(), &value));
            }
        }
        Ok(self)
    }

    /// Set a flag property
    pub fn flag(mut self, name: &str) -> Result<Self, SchemaError> {
        match &self.property_kind(name)? {
            PropertyKind::Scalar(param_type) if param_type.is_flag() => {
                self.properties.insert(name.to_string(), Value::Bool(true));
                Ok(self)
            }
            _ => Err(SchemaError::TypeMismatch {
                ingredient: self.schema.name.clone(),
                property: name.to_string(),
                expected: "a flag property".to_string(),
                actual: "flag".to_string(),
            }),
        }
    }

    /// Set fields of a compound property. Non-repeatable compounds merge the
    /// fields into what was set before; repeatable ones append a new entry.
    pub fn compound<I, S>(mut self, name: &str, fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let fields: Map<String, Value> = fields
            .into_iter()
            .map(|(field, value)| (field.into(), value))
            .collect();
        let entry = Value::Object(fields);

        match &self.property_kind(name)? {
            PropertyKind::Compound(params) => {
                self.schema
                    .validate_compound(name, params, &entry, self.cookbook.enums())?;
                let merged = self
                    .properties
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let (Value::Object(existing), Value::Object(fields)) = (merged, entry) {
                    existing.extend(fields);
                }
            }
            PropertyKind::RepeatableCompound(params) => {
                self.schema
                    .validate_compound(name, params, &entry, self.cookbook.enums())?;
                self.append(name, entry);
            }
            PropertyKind::Scalar(param_type) | PropertyKind::Repeatable(param_type) => {
                return Err(self.mismatch(name, param_type.to_string(), &entry));
            }
        }
        Ok(self)
    }

    /// Override the key of a keyed ingredient
    pub fn keyed(mut self, key: impl Into<String>) -> Result<Self, SchemaError> {
        if !self.schema.keyed {
            return Err(SchemaError::NotKeyed(self.schema.name.clone()));
        }
        self.key = Some(key.into());
        Ok(self)
    }

    pub fn build(self) -> Result<Ingredient, SchemaError> {
        if self.schema.keyed {
            self.build_keyed().map(Ingredient::from)
        } else {
            self.build_base().map(Ingredient::from)
        }
    }

    /// Build a keyed ingredient, e.g. to scope a recipe
    pub fn build_keyed(self) -> Result<KeyedIngredient, SchemaError> {
        if !self.schema.keyed {
            return Err(SchemaError::NotKeyed(self.schema.name.clone()));
        }
        let key = self.key.clone();
        Ok(KeyedIngredient::from_base(self.build_base()?, key))
    }

    fn build_base(self) -> Result<BaseIngredient, SchemaError> {
        if let Some(missing) = self
            .schema
            .properties
            .iter()
            .find(|p| p.required && !self.properties.contains_key(&p.name))
        {
            return Err(SchemaError::MissingRequired {
                ingredient: self.schema.name.clone(),
                property: missing.name.clone(),
            });
        }
        Ok(BaseIngredient::from_parts(
            self.schema.name.clone(),
            Some(self.cookbook.domain().to_string()),
            self.properties,
        ))
    }

    fn property_kind(&self, name: &str) -> Result<PropertyKind, SchemaError> {
        self.schema
            .property(name)
            .map(|p| p.kind.clone())
            .ok_or_else(|| SchemaError::UnknownProperty {
                ingredient: self.schema.name.clone(),
                property: name.to_string(),
            })
    }

    fn append(&mut self, name: &str, value: Value) {
        let slot = self
            .properties
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = slot {
            values.push(value);
        }
    }

    fn mismatch(&self, name: &str, expected: String, actual: &Value) -> SchemaError {
        SchemaError::TypeMismatch {
            ingredient: self.schema.name.clone(),
            property: name.to_string(),
            expected,
            actual: describe(actual),
        }
    }
}
