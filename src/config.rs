//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bubbletree/bubbletree.toml`
//! 3. Local config: `<catalog_dir>/.bubbletree.toml` (next to the catalog file)
//! 4. Environment variables: `BUBBLETREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::{value, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, ForestOrder, UnresolvedPolicy};

/// Search box configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of bubbles a search returns
    pub limit: usize,
    /// Hint shown while at top level
    pub root_placeholder: String,
    /// Prefix of the hint shown inside a node, followed by its label
    pub within_placeholder: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 15,
            root_placeholder: "Searching on root...".into(),
            within_placeholder: "Searching in ".into(),
        }
    }
}

/// Raw search config for intermediate parsing (`None` → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSearchConfig {
    pub limit: Option<usize>,
    pub root_placeholder: Option<String>,
    pub within_placeholder: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub catalog: Option<PathBuf>,
    pub unresolved: Option<UnresolvedPolicy>,
    pub order: Option<ForestOrder>,
    #[serde(default)]
    pub search: RawSearchConfig,
}

impl SearchConfig {
    /// Overlay wins if Some, otherwise keep base.
    pub fn merge(&self, overlay: &RawSearchConfig) -> Self {
        Self {
            limit: overlay.limit.unwrap_or(self.limit),
            root_placeholder: overlay
                .root_placeholder
                .clone()
                .unwrap_or_else(|| self.root_placeholder.clone()),
            within_placeholder: overlay
                .within_placeholder
                .clone()
                .unwrap_or_else(|| self.within_placeholder.clone()),
        }
    }
}

/// Unified configuration for bubbletree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Default catalog file used when `--catalog` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// Handling of elements whose parent cannot be resolved
    pub unresolved: UnresolvedPolicy,
    /// Order of the flat node list
    pub order: ForestOrder,
    /// Search settings
    pub search: SearchConfig,
}

/// Get the XDG config directory for bubbletree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bubbletree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bubbletree.toml"))
}

/// Get the path to the local config file in a catalog directory.
pub fn local_config_path(catalog_dir: &Path) -> PathBuf {
    catalog_dir.join(".bubbletree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in the catalog path.
    fn expand_paths(&mut self) {
        if let Some(catalog) = &self.catalog {
            let expanded = expand_env_vars(catalog.to_string_lossy().as_ref());
            self.catalog = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay config onto self (base): scalars win if Some.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            catalog: overlay.catalog.clone().or_else(|| self.catalog.clone()),
            unresolved: overlay.unresolved.unwrap_or(self.unresolved),
            order: overlay.order.unwrap_or(self.order),
            search: self.search.merge(&overlay.search),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `catalog_dir` - Optional directory of the catalog file for local config
    pub fn load(catalog_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(catalog_dir, env_source())
    }

    /// Load settings for the catalog that will be used.
    ///
    /// The catalog is `cli_catalog` if given, else the one named by global
    /// config or `BUBBLETREE_CATALOG`. The local config next to it is merged
    /// either way.
    pub fn load_for_catalog(cli_catalog: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_for_catalog_with(cli_catalog, env_source)
    }

    fn load_for_catalog_with(
        cli_catalog: Option<&Path>,
        env: impl Fn() -> Environment,
    ) -> Result<Self, ApplicationError> {
        let catalog = match cli_catalog {
            Some(path) => Some(path.to_path_buf()),
            None => Self::load_layers(None, env())?.catalog,
        };
        let mut settings = Self::load_layers(catalog.as_deref().and_then(Path::parent), env())?;
        if cli_catalog.is_none() {
            // A local config must not redirect to another catalog
            settings.catalog = catalog;
        }
        Ok(settings)
    }

    fn load_layers(catalog_dir: Option<&Path>, env: Environment) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = catalog_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply BUBBLETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(env);

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("catalog") {
            settings.catalog = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("unresolved") {
            settings.unresolved = parse_enum("unresolved", &val)?;
        }
        if let Ok(val) = config.get_string("order") {
            settings.order = parse_enum("order", &val)?;
        }
        match config.get::<usize>("search.limit") {
            Ok(val) => settings.search.limit = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => {
                return Err(ApplicationError::Config {
                    message: format!("search.limit: {e}"),
                })
            }
        }
        if let Ok(val) = config.get_string("search.root_placeholder") {
            settings.search.root_placeholder = val;
        }
        if let Ok(val) = config.get_string("search.within_placeholder") {
            settings.search.within_placeholder = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bubbletree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bubbletree/bubbletree.toml
#   Local:  <catalog_dir>/.bubbletree.toml
#   Env:    BUBBLETREE_* environment variables (e.g. BUBBLETREE_SEARCH__LIMIT=30)

# Catalog used when --catalog is not given
# catalog = "~/items.toml"

# Elements whose parent cannot be resolved: "ignore", "warn" or "reject"
# unresolved = "warn"

# Order of the flat node list: "construction", "label", "label-desc", "id", "id-desc"
# order = "construction"

[search]
# Maximum number of search hits
# limit = 15

# root_placeholder = "Searching on root..."
# within_placeholder = "Searching in "
"#
        .to_string()
    }
}

/// `BUBBLETREE_*` variables, `__` separating nested keys.
fn env_source() -> Environment {
    Environment::with_prefix("BUBBLETREE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Parse a kebab/lowercase enum value the same way the TOML layer does.
fn parse_enum<T: DeserializeOwned>(key: &str, val: &str) -> Result<T, ApplicationError> {
    let de: value::StrDeserializer<'_, value::Error> = val.into_deserializer();
    T::deserialize(de).map_err(|e| ApplicationError::Config {
        message: format!("{key}: {e}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
