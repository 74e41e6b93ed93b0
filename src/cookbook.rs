//! Cookbook
//!
//! The schema an external generator turns into typed builders and hooks. A cookbook
//! names one domain and declares its ingredients, their required and optional
//! properties, and the enums those properties may use. It is resolved and validated
//! once at load; builders and the wire decoder then check every value against it.
//!
//! Cookbooks are written as JSON or TOML:
//!
//! ```toml
//! domain = "users"
//!
//! [[enums]]
//! name = "Role"
//! values = ["ADMIN", "MEMBER"]
//!
//! [[ingredients]]
//! name = "CreateUser"
//! keyed = true
//! defaultKey = "user"
//! required = [{ name = "name", type = "string" }]
//! optionals = [
//!     { name = "role", type = "Role" },
//!     { name = "verified", type = "flag" },
//!     { name = "address", params = [{ name = "city", type = "string" }] },
//! ]
//! ```

pub mod builder;
pub mod catalog;
pub mod types;

pub use builder::IngredientBuilder;
pub use catalog::Catalog;
pub use types::{BaseType, EnumTable, ParamType, Primitive, ValueType};

use crate::error::SchemaError;
use crate::ingredient::KEY_PROPERTY;
use crate::recipe::Recipe;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;
use types::describe;

// Serialised form

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CookbookDef {
    pub domain: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IngredientDef {
    pub name: String,
    #[serde(default)]
    pub keyed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_key: Option<String>,
    #[serde(default)]
    pub required: Vec<RequiredDef>,
    #[serde(default)]
    pub optionals: Vec<OptionalDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequiredDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// `Some(Value::Null)` is an explicit null default
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalDef {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<ParamDef>>,
    #[serde(default)]
    pub repeatable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
}

fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// Resolved form

/// How a property's value is shaped and set
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// Single value; setting again overwrites
    Scalar(ParamType),
    /// Array of values; each set appends
    Repeatable(ParamType),
    /// Object of named params; each set merges fields
    Compound(Vec<ParamSchema>),
    /// Array of objects; each set appends one object
    RepeatableCompound(Vec<ParamSchema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    pub name: String,
    pub param_type: ParamType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientSchema {
    pub name: String,
    pub keyed: bool,
    pub default_key: Option<String>,
    pub properties: Vec<PropertySchema>,
}

impl IngredientSchema {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check a complete property value as it appears on the wire
    pub fn validate_property(
        &self,
        name: &str,
        value: &Value,
        enums: &EnumTable,
    ) -> Result<(), SchemaError> {
        let property = self
            .property(name)
            .ok_or_else(|| SchemaError::UnknownProperty {
                ingredient: self.name.clone(),
                property: name.to_string(),
            })?;

        let mismatch = |expected: String, actual: &Value| SchemaError::TypeMismatch {
            ingredient: self.name.clone(),
            property: name.to_string(),
            expected,
            actual: describe(actual),
        };

        match &property.kind {
            PropertyKind::Scalar(param_type) => {
                if !param_type.matches(value, enums) {
                    return Err(mismatch(param_type.to_string(), value));
                }
            }
            PropertyKind::Repeatable(param_type) => {
                let values = value
                    .as_array()
                    .ok_or_else(|| mismatch(format!("array of {}", param_type), value))?;
                if let Some(bad) = values.iter().find(|v| !param_type.matches(v, enums)) {
                    return Err(mismatch(param_type.to_string(), bad));
                }
            }
            PropertyKind::Compound(params) => {
                self.validate_compound(name, params, value, enums)?;
            }
            PropertyKind::RepeatableCompound(params) => {
                let values = value
                    .as_array()
                    .ok_or_else(|| mismatch("array of compound".to_string(), value))?;
                for entry in values {
                    self.validate_compound(name, params, entry, enums)?;
                }
            }
        }
        Ok(())
    }

    /// Compound values are objects holding any subset of the declared params
    pub(crate) fn validate_compound(
        &self,
        name: &str,
        params: &[ParamSchema],
        value: &Value,
        enums: &EnumTable,
    ) -> Result<(), SchemaError> {
        let fields = value.as_object().ok_or_else(|| SchemaError::TypeMismatch {
            ingredient: self.name.clone(),
            property: name.to_string(),
            expected: "compound".to_string(),
            actual: describe(value),
        })?;
        for (field, field_value) in fields {
            let param = params.iter().find(|p| &p.name == field).ok_or_else(|| {
                SchemaError::UnknownProperty {
                    ingredient: self.name.clone(),
                    property: format!("{}.{}", name, field),
                }
            })?;
            if !param.param_type.matches(field_value, enums) {
                return Err(SchemaError::TypeMismatch {
                    ingredient: self.name.clone(),
                    property: format!("{}.{}", name, field),
                    expected: param.param_type.to_string(),
                    actual: describe(field_value),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cookbook {
    domain: String,
    ingredients: Vec<IngredientSchema>,
    index: HashMap<String, usize>,
    enums: EnumTable,
}

impl Cookbook {
    /// Load a `.json` or `.toml` cookbook file
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let contents = std::fs::read_to_string(path)?;
        let cookbook = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("toml") => Self::from_toml_str(&contents),
            _ => Err(SchemaError::InvalidCookbook(format!(
                "unsupported cookbook format: {}",
                path.display()
            ))),
        }?;
        debug!(
            path = %path.display(),
            domain = %cookbook.domain,
            ingredients = cookbook.ingredients.len(),
            "Loaded cookbook"
        );
        Ok(cookbook)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, SchemaError> {
        let def: CookbookDef = serde_json::from_str(contents)
            .map_err(|e| SchemaError::InvalidCookbook(e.to_string()))?;
        Self::from_def(def)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SchemaError> {
        let def: CookbookDef =
            toml::from_str(contents).map_err(|e| SchemaError::InvalidCookbook(e.to_string()))?;
        Self::from_def(def)
    }

    /// Resolve and validate a parsed cookbook
    pub fn from_def(def: CookbookDef) -> Result<Self, SchemaError> {
        let invalid = |message: String| SchemaError::InvalidCookbook(message);

        if def.domain.trim().is_empty() {
            return Err(invalid("cookbook domain cannot be empty".to_string()));
        }

        let enums = resolve_enums(&def.enums)?;

        let mut ingredients = Vec::with_capacity(def.ingredients.len());
        let mut index = HashMap::new();
        for ingredient in &def.ingredients {
            if ingredient.name.is_empty() {
                return Err(invalid("ingredient name cannot be empty".to_string()));
            }
            if ingredient.name == Recipe::TYPE {
                return Err(invalid(format!(
                    "'{}' is reserved and cannot name an ingredient",
                    Recipe::TYPE
                )));
            }
            if index
                .insert(ingredient.name.clone(), ingredients.len())
                .is_some()
            {
                return Err(invalid(format!(
                    "found two or more ingredients named '{}'",
                    ingredient.name
                )));
            }
            ingredients.push(resolve_ingredient(ingredient, &enums)?);
        }

        Ok(Self {
            domain: def.domain,
            ingredients,
            index,
            enums,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn enums(&self) -> &EnumTable {
        &self.enums
    }

    pub fn schema(&self, ingredient_type: &str) -> Option<&IngredientSchema> {
        self.index
            .get(ingredient_type)
            .map(|&position| &self.ingredients[position])
    }

    pub fn ingredient_types(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.name.as_str())
    }

    /// Start building an ingredient of `ingredient_type`
    pub fn ingredient(&self, ingredient_type: &str) -> Result<IngredientBuilder<'_>, SchemaError> {
        let schema = self
            .schema(ingredient_type)
            .ok_or_else(|| SchemaError::UnknownIngredientType(ingredient_type.to_string()))?;
        Ok(IngredientBuilder::new(self, schema))
    }
}

fn resolve_enums(defs: &[EnumDef]) -> Result<EnumTable, SchemaError> {
    let mut enums = EnumTable::new();
    for def in defs {
        if def.values.is_empty() {
            return Err(SchemaError::InvalidCookbook(format!(
                "enum '{}' has no values",
                def.name
            )));
        }
        let distinct: HashSet<&String> = def.values.iter().collect();
        if distinct.len() != def.values.len() {
            return Err(SchemaError::InvalidCookbook(format!(
                "enum '{}' has duplicate values",
                def.name
            )));
        }
        if enums.insert(def.name.clone(), def.values.clone()).is_some() {
            return Err(SchemaError::InvalidCookbook(format!(
                "found duplicate enum name '{}'",
                def.name
            )));
        }
    }
    Ok(enums)
}

fn resolve_ingredient(
    def: &IngredientDef,
    enums: &EnumTable,
) -> Result<IngredientSchema, SchemaError> {
    let invalid = |message: String| {
        SchemaError::InvalidCookbook(format!("ingredient '{}': {}", def.name, message))
    };
    let parse = |type_name: &str| ParamType::parse(type_name, enums).map_err(invalid);

    let mut seen = HashSet::new();
    let field_names = def
        .required
        .iter()
        .map(|r| &r.name)
        .chain(def.optionals.iter().map(|o| &o.name));
    for name in field_names {
        if name.is_empty() {
            return Err(invalid("field names cannot be empty".to_string()));
        }
        if def.keyed && name == KEY_PROPERTY {
            return Err(invalid(format!(
                "keyed ingredients cannot declare a '{}' field",
                KEY_PROPERTY
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(format!("duplicate field name '{}'", name)));
        }
    }

    let mut properties = Vec::with_capacity(def.required.len() + def.optionals.len());

    for required in &def.required {
        let param_type = parse(&required.type_name)?;
        if param_type.is_flag() {
            return Err(invalid(format!(
                "required '{}' cannot be of type flag",
                required.name
            )));
        }
        if let Some(default) = &required.default {
            if !param_type.matches(default, enums) {
                return Err(invalid(format!(
                    "default for '{}' does not match type {}",
                    required.name, param_type
                )));
            }
        }
        properties.push(PropertySchema {
            name: required.name.clone(),
            required: true,
            default: required.default.clone(),
            kind: PropertyKind::Scalar(param_type),
        });
    }

    for optional in &def.optionals {
        let kind = match (&optional.type_name, &optional.params) {
            (Some(type_name), None) => {
                let param_type = parse(type_name)?;
                if optional.repeatable {
                    PropertyKind::Repeatable(param_type)
                } else {
                    PropertyKind::Scalar(param_type)
                }
            }
            (None, Some(params)) => {
                let params = resolve_params(&optional.name, params, &parse, &invalid)?;
                if optional.repeatable {
                    PropertyKind::RepeatableCompound(params)
                } else {
                    PropertyKind::Compound(params)
                }
            }
            _ => {
                return Err(invalid(format!(
                    "optional '{}' must declare exactly one of type or params",
                    optional.name
                )))
            }
        };
        properties.push(PropertySchema {
            name: optional.name.clone(),
            required: false,
            default: None,
            kind,
        });
    }

    Ok(IngredientSchema {
        name: def.name.clone(),
        keyed: def.keyed,
        default_key: def.default_key.clone(),
        properties,
    })
}

fn resolve_params(
    optional: &str,
    params: &[ParamDef],
    parse: &dyn Fn(&str) -> Result<ParamType, SchemaError>,
    invalid: &dyn Fn(String) -> SchemaError,
) -> Result<Vec<ParamSchema>, SchemaError> {
    if params.is_empty() {
        return Err(invalid(format!(
            "compound optional '{}' has no params",
            optional
        )));
    }
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(params.len());
    for (position, param) in params.iter().enumerate() {
        if !seen.insert(param.name.as_str()) {
            return Err(invalid(format!(
                "compound optional '{}' has duplicate param '{}'",
                optional, param.name
            )));
        }
        let param_type = parse(&param.type_name)?;
        if param_type.vararg && position + 1 != params.len() {
            return Err(invalid(format!(
                "vararg param '{}' must be last in compound optional '{}'",
                param.name, optional
            )));
        }
        resolved.push(ParamSchema {
            name: param.name.clone(),
            param_type,
        });
    }
    Ok(resolved)
}
