//! Service configuration.
//!
//! TOML-based with bundled defaults: the shipped `optipress.toml` is compiled
//! in, an optional `./optipress.toml` overrides it key by key, and
//! `--config <path>` loads a single file verbatim.

use config::{Config, File, FileFormat};
use optipress_error::{ConfigError, OptipressError, OptipressResult};
use optipress_optimize::{Optimizer, ToolSpec};
use optipress_store::{FormatPolicy, ImageFormat, StoreRoot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../optipress.toml");

fn default_listen() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_uploads_dir() -> String {
    optipress_store::DEFAULT_UPLOADS_DIR.to_string()
}

fn default_optimized_dir() -> String {
    optipress_store::DEFAULT_OPTIMIZED_DIR.to_string()
}

fn default_allowed() -> Vec<String> {
    vec!["png".to_string(), "jpeg".to_string()]
}

/// Location of the two storage trees.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding both trees.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Name of the originals tree under the root.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Name of the optimized tree under the root.
    #[serde(default = "default_optimized_dir")]
    pub optimized_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            uploads_dir: default_uploads_dir(),
            optimized_dir: default_optimized_dir(),
        }
    }
}

/// Formats admitted into the pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FormatsConfig {
    /// Accepted format names (`"png"`, `"jpeg"`).
    #[serde(default = "default_allowed")]
    pub allowed: Vec<String>,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed(),
        }
    }
}

/// Top-level optipress configuration.
///
/// # Example
///
/// ```no_run
/// use optipress_server::ServerConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Bundled defaults merged with an optional ./optipress.toml
/// let config = ServerConfig::load()?;
/// println!("listening on {}", config.listen);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Storage tree locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Format allow-list.
    #[serde(default)]
    pub formats: FormatsConfig,

    /// Per-format compressor templates, keyed by format name.
    ///
    /// Formats absent from the map keep their stock tool.
    #[serde(default)]
    pub optimizers: HashMap<String, ToolSpec>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            storage: StorageConfig::default(),
            formats: FormatsConfig::default(),
            optimizers: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> OptipressResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                OptipressError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                OptipressError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled defaults.
    ///
    /// An `./optipress.toml` in the working directory is optional and silently
    /// skipped when absent.
    #[instrument]
    pub fn load() -> OptipressResult<Self> {
        debug!("Loading configuration with precedence: current dir > bundled defaults");

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("optipress").required(false))
            .build()
            .map_err(|e| {
                OptipressError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                OptipressError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// The storage trees this configuration names.
    pub fn store_root(&self) -> StoreRoot {
        StoreRoot::with_tree_names(
            self.storage.root.clone(),
            &self.storage.uploads_dir,
            &self.storage.optimized_dir,
        )
    }

    /// The format allow-list as an enforceable policy.
    ///
    /// # Errors
    ///
    /// Returns an error when `formats.allowed` names an unknown format.
    pub fn policy(&self) -> OptipressResult<FormatPolicy> {
        let mut allowed = Vec::with_capacity(self.formats.allowed.len());
        for name in &self.formats.allowed {
            let format = name.parse::<ImageFormat>().map_err(|e| ConfigError::new(e))?;
            allowed.push(format);
        }
        Ok(FormatPolicy::new(allowed))
    }

    /// The compressor set: stock tools overridden by configured entries.
    ///
    /// # Errors
    ///
    /// Returns an error when an `optimizers` key names an unknown format.
    pub fn optimizer(&self) -> OptipressResult<Optimizer> {
        let mut tools: HashMap<ImageFormat, ToolSpec> = [
            (ImageFormat::Png, ToolSpec::pngquant()),
            (ImageFormat::Jpeg, ToolSpec::jpegtran()),
        ]
        .into();
        for (name, spec) in &self.optimizers {
            let format = name.parse::<ImageFormat>().map_err(|e| ConfigError::new(e))?;
            tools.insert(format, spec.clone());
        }
        Ok(Optimizer::from_tools(tools))
    }
}
