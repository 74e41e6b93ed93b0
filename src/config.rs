//! Configuration System
//!
//! Layered configuration for cookbooks, oven behaviour and logging. Values come from
//! defaults, the global config file, workspace files and environment variables, in
//! that order of precedence.
//!
//! ```toml
//! cookbooks = ["cookbooks/users.toml", "cookbooks/billing.json"]
//!
//! [oven]
//! log_payloads = true
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

use crate::cookbook::{Catalog, Cookbook};
use crate::error::SchemaError;
use crate::logging::{LogFormat, LogOutput, LoggingConfig};
use crate::oven::OvenSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeConfig {
    /// Cookbook files (`.json` or `.toml`) loaded into the catalog
    #[serde(default)]
    pub cookbooks: Vec<PathBuf>,

    #[serde(default)]
    pub oven: OvenSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Cookbook(PathBuf, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cookbook(path, msg) => {
                write!(f, "Cookbook '{}': {}", path.display(), msg)
            }
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RecipeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for path in &self.cookbooks {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Cookbook(
                    path.clone(),
                    "path cannot be empty".to_string(),
                ));
                continue;
            }
            if !seen.insert(path) {
                errors.push(ValidationError::Cookbook(
                    path.clone(),
                    "listed more than once".to_string(),
                ));
            }
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") | Some("toml") => {}
                _ => errors.push(ValidationError::Cookbook(
                    path.clone(),
                    "expected a .json or .toml file".to_string(),
                )),
            }
        }

        if let Err(e) = LogFormat::parse(&self.logging.format) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = LogOutput::parse(&self.logging.output) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = self.logging.filter_directives() {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Load every configured cookbook into one catalog
    pub fn load_catalog(&self) -> Result<Catalog, SchemaError> {
        let mut catalog = Catalog::new();
        for path in &self.cookbooks {
            catalog.add_cookbook(Cookbook::load(path)?)?;
        }
        Ok(catalog)
    }
}
