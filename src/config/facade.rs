//! Config loading entry points

use super::merge;
use super::sources::{environment, global_file, workspace_file};
use super::RecipeConfig;
use crate::error::ConfigError;
use config::{Config, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads `RecipeConfig` from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Layers, lowest precedence first: defaults, the global file, the workspace
    /// files, then `RECIPE__*` environment variables. Relative cookbook paths are
    /// resolved against `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<RecipeConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let mut config: RecipeConfig = builder.build()?.try_deserialize()?;
        config.cookbooks = config
            .cookbooks
            .into_iter()
            .map(|path| resolve(workspace_root, path))
            .collect();

        debug!(
            workspace_root = %workspace_root.display(),
            cookbooks = config.cookbooks.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load a single file over the defaults, with no other layers.
    /// Relative cookbook paths are resolved against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<RecipeConfig, ConfigError> {
        let config = merge::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        let mut config: RecipeConfig = config.try_deserialize()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.cookbooks = config
            .cookbooks
            .into_iter()
            .map(|cookbook| resolve(base, cookbook))
            .collect();
        Ok(config)
    }

    /// Path of the global config file, when a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Defaults only
    pub fn defaults() -> Result<RecipeConfig, ConfigError> {
        let config: Config = merge::builder_with_defaults()?.build()?;
        Ok(config.try_deserialize()?)
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
