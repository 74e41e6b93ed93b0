//! Error types for recipe segmentation, the cake context store, and baking.

use thiserror::Error;

/// Context store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CakeError {
    #[error("Invalid cake key: {0}")]
    InvalidKey(String),

    #[error("Cake does not contain key '{0}'")]
    KeyNotFound(String),

    #[error("Cannot retrieve ambiguous key '{key}' (matches: {candidates:?})")]
    AmbiguousKey {
        key: String,
        candidates: Vec<String>,
    },

    #[error("No context: {0}")]
    NoContext(String),

    #[error("No key found for value {0}")]
    NoSuchValue(String),

    #[error("Multiple keys found for value {value}: {keys:?}")]
    AmbiguousValue { value: String, keys: Vec<String> },

    #[error("Cake value for '{key}' could not be converted: {message}")]
    Serialization { key: String, message: String },
}

/// Dispatch pipeline errors
#[derive(Debug, Error)]
pub enum OvenError {
    #[error("No dispatcher for domain {}", display_domain(.0.as_deref()))]
    NoDispatcherForDomain(Option<String>),

    #[error("Dispatcher already registered for domain '{0}'")]
    DuplicateDispatcher(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Dispatcher for domain {} failed on segment {index}: {source}", display_domain(.domain.as_deref()))]
    Dispatch {
        domain: Option<String>,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Could not start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Local dispatch target errors
#[derive(Debug, Error)]
pub enum BakeError {
    #[error("Could not find hook for ingredient {0}")]
    UnknownIngredientType(String),

    #[error("Malformed ingredient: {0}")]
    MalformedIngredient(String),

    #[error("Hook for ingredient {ingredient} failed: {source}")]
    Hook {
        ingredient: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Cake(#[from] CakeError),
}

/// Cookbook schema and wire decoding errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid cookbook: {0}")]
    InvalidCookbook(String),

    #[error("Unknown ingredient type {0}")]
    UnknownIngredientType(String),

    #[error("Ingredient {ingredient} has no property '{property}'")]
    UnknownProperty { ingredient: String, property: String },

    #[error("Property '{property}' of {ingredient} expects {expected}, got {actual}")]
    TypeMismatch {
        ingredient: String,
        property: String,
        expected: String,
        actual: String,
    },

    #[error("Ingredient {ingredient} is missing required property '{property}'")]
    MissingRequired { ingredient: String, property: String },

    #[error("Ingredient {0} is not keyed")]
    NotKeyed(String),

    #[error("Malformed recipe JSON: {0}")]
    Malformed(String),

    #[error("Cookbook I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

fn display_domain(domain: Option<&str>) -> String {
    match domain {
        Some(domain) => format!("'{}'", domain),
        None => "<none>".to_string(),
    }
}
