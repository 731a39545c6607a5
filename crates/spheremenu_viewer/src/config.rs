use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use eyre::Result;
use serde::{Deserialize, Serialize};
use spheremenu::MenuTuning;

const CONFIG_FILE_FORMAT: config::FileFormat = config::FileFormat::Yaml;
const DEFAULT_CONFIG_STR: &str = include_str!("default.yaml");
const CONFIG_FILE_NAME: &str = "config.yaml";
const ENV_PREFIX: &str = "SPHEREMENU";

lazy_static! {
    static ref PROJECT_DIRS: Option<ProjectDirs> = ProjectDirs::from("", "", "spheremenu");
}

/// Returns the path of the user configuration file, if the platform has a
/// configuration directory.
pub(crate) fn user_config_file() -> Option<PathBuf> {
    Some(PROJECT_DIRS.as_ref()?.config_dir().join(CONFIG_FILE_NAME))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct ViewerConfig {
    pub scale: f32,
    pub window: WindowConfig,
    pub double_click: DoubleClickConfig,
    pub photo_store: PhotoStoreConfig,
    pub tuning: MenuTuning,
}
impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            window: WindowConfig::default(),
            double_click: DoubleClickConfig::default(),
            photo_store: PhotoStoreConfig::default(),
            tuning: MenuTuning::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct WindowConfig {
    pub width: u32,
    pub height: u32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct DoubleClickConfig {
    pub max_interval_ms: u64,
    pub max_distance: f32,
}
impl Default for DoubleClickConfig {
    fn default() -> Self {
        Self {
            max_interval_ms: 400,
            max_distance: 6.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct PhotoStoreConfig {
    pub url: String,
    pub api_key: String,
}
impl PhotoStoreConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Loads configuration from, in increasing priority: built-in defaults, the
/// user configuration file, `explicit_file`, and `SPHEREMENU_*` environment
/// variables.
pub(crate) fn load(explicit_file: Option<&Path>) -> Result<ViewerConfig> {
    let mut builder = config::Config::builder()
        .add_source(config::File::from_str(DEFAULT_CONFIG_STR, CONFIG_FILE_FORMAT));

    match user_config_file() {
        Some(path) => {
            log::debug!("reading user config from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(false));
        }
        None => log::warn!("no configuration directory; skipping user config"),
    }

    if let Some(path) = explicit_file {
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    Ok(builder.build()?.try_deserialize()?)
}
