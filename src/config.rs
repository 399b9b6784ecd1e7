// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use config::{Config, Environment, File, Map};
use tracing::debug;

mod editor;
pub mod error;

pub use self::editor::{
    EditorConfig, HitToleranceConfig, LoopWindowConfig, ZeroCrossingConfig, ZonesConfig,
};
pub use self::error::ConfigError;

/// Prefix for environment variable overrides, e.g. `SAMPLEMARK_SNAP_TO_ZERO=true`
/// or `SAMPLEMARK_ZERO_CROSSING__SEARCH_DISTANCE=1000`.
pub const ENV_PREFIX: &str = "SAMPLEMARK";

/// Loads the editor config from an optional YAML file, with environment
/// variables layered on top.
pub fn load(path: Option<&Path>) -> Result<EditorConfig, ConfigError> {
    load_with_env(path, None)
}

/// Loads the editor config, reading overrides from the given map instead of the
/// process environment when one is supplied.
fn load_with_env(
    path: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<EditorConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        debug!(path = ?path, "Loading editor config");
        builder = builder.add_source(File::from(path));
    }

    let config: EditorConfig = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}
