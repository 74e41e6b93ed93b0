//! Cookbook type grammar
//!
//! ```text
//! type  := base ("[]")* ("...")?
//! base  := "boolean" | "int" | "float" | "string" | "flag" | <enum name>
//! ```
//!
//! A trailing `...` marks a vararg; its value travels as an array of the base type.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Enum name to allowed values
pub type EnumTable = BTreeMap<String, Vec<String>>;

const ARRAY_SUFFIX: &str = "[]";
const VARARG_SUFFIX: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Int,
    Float,
    String,
}

impl Primitive {
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "boolean" => Some(Primitive::Boolean),
            "int" => Some(Primitive::Int),
            "float" => Some(Primitive::Float),
            "string" => Some(Primitive::String),
            _ => None,
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Primitive::Boolean => value.is_boolean(),
            Primitive::Int => value.is_i64() || value.is_u64(),
            Primitive::Float => value.is_number(),
            // Strings are nullable
            Primitive::String => value.is_string() || value.is_null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Primitive(Primitive),
    Flag,
    Enum(String),
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Primitive(p) => f.write_str(p.alias()),
            BaseType::Flag => f.write_str("flag"),
            BaseType::Enum(name) => f.write_str(name),
        }
    }
}

/// A base type nested in zero or more arrays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueType {
    pub base: BaseType,
    pub array_depth: usize,
}

impl ValueType {
    pub fn is_flag(&self) -> bool {
        self.base == BaseType::Flag && self.array_depth == 0
    }

    pub fn matches(&self, value: &Value, enums: &EnumTable) -> bool {
        matches_at_depth(&self.base, self.array_depth, value, enums)
    }
}

fn matches_at_depth(base: &BaseType, depth: usize, value: &Value, enums: &EnumTable) -> bool {
    if depth > 0 {
        return match value {
            Value::Array(values) => values
                .iter()
                .all(|v| matches_at_depth(base, depth - 1, v, enums)),
            _ => false,
        };
    }
    match base {
        BaseType::Primitive(p) => p.matches(value),
        BaseType::Flag => value.is_boolean(),
        BaseType::Enum(name) => match (value.as_str(), enums.get(name)) {
            (Some(v), Some(values)) => values.iter().any(|allowed| allowed == v),
            _ => false,
        },
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for _ in 0..self.array_depth {
            f.write_str(ARRAY_SUFFIX)?;
        }
        Ok(())
    }
}

/// A declared property or parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamType {
    pub value: ValueType,
    pub vararg: bool,
}

impl ParamType {
    /// Parse a type expression against the cookbook's enums
    pub fn parse(type_name: &str, enums: &EnumTable) -> Result<Self, String> {
        let (body, vararg) = match type_name.strip_suffix(VARARG_SUFFIX) {
            Some(body) => (body, true),
            None => (type_name, false),
        };

        let mut base_name = body;
        let mut array_depth = 0;
        while let Some(inner) = base_name.strip_suffix(ARRAY_SUFFIX) {
            base_name = inner;
            array_depth += 1;
        }

        let base = if let Some(primitive) = Primitive::from_alias(base_name) {
            BaseType::Primitive(primitive)
        } else if base_name == "flag" {
            BaseType::Flag
        } else if enums.contains_key(base_name) {
            BaseType::Enum(base_name.to_string())
        } else {
            return Err(format!("unknown type '{}'", type_name));
        };

        if base == BaseType::Flag && (vararg || array_depth > 0) {
            return Err(format!(
                "flag types cannot be varargs or arrays: '{}'",
                type_name
            ));
        }

        Ok(Self {
            value: ValueType { base, array_depth },
            vararg,
        })
    }

    pub fn is_flag(&self) -> bool {
        !self.vararg && self.value.is_flag()
    }

    /// Check a wire value; varargs travel as arrays of the declared type
    pub fn matches(&self, value: &Value, enums: &EnumTable) -> bool {
        if self.vararg {
            return match value {
                Value::Array(values) => values.iter().all(|v| self.value.matches(v, enums)),
                _ => false,
            };
        }
        self.value.matches(value, enums)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if self.vararg {
            f.write_str(VARARG_SUFFIX)?;
        }
        Ok(())
    }
}

/// Short JSON kind name for error messages
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) if n.is_f64() => "float".to_string(),
        Value::Number(_) => "int".to_string(),
        Value::String(s) => format!("string \"{}\"", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
