//! Environment source: RECIPE__SECTION__FIELD

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const PREFIX: &str = "RECIPE";

/// Add environment overrides. `RECIPE__COOKBOOKS` takes a comma separated list.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cookbooks"),
    )
}
