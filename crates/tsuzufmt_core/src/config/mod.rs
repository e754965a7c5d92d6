//! Formatter configuration.
//!
//! A [`Config`] is resolved once per session from three layers, highest
//! precedence first: explicit overrides, a discovered config file, built-in
//! defaults. Resolution is field-by-field. A resolved config has no setters;
//! build a new one instead of patching.

mod discovery;
pub mod options;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use semver::{Version, VersionReq};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::ConfigError;

pub use discovery::{
    CONFIG_FILES, ConfigDiscovery, DiscoveredConfig, FsDiscovery, load_config_file, parse_config,
};
pub use options::{
    Color, Edition, EmitMode, NewlineStyle, OPTIONS, OptionKind, OptionSpec, Verbosity, lookup,
};

/// Unresolved key/value options as read from a file or the command line.
pub type RawOptions = BTreeMap<String, serde_json::Value>;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Default,
    File,
    Override,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Default => "defaults",
            Origin::File => "config file",
            Origin::Override => "overrides",
        })
    }
}

/// A single resolved option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Integer(u64),
    /// Canonical spelling of an enumerated choice.
    Choice(&'static str),
    Text(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(n) => write!(f, "{}", n),
            ConfigValue::Choice(s) => f.write_str(s),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Integer(n) => serializer.serialize_u64(*n),
            ConfigValue::Choice(s) => serializer.serialize_str(s),
            ConfigValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// A resolved value together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOption {
    pub value: ConfigValue,
    pub origin: Origin,
}

/// Resolved formatter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    values: BTreeMap<&'static str, ResolvedOption>,
}

impl Default for Config {
    fn default() -> Self {
        let values = OPTIONS
            .iter()
            .map(|spec| {
                (
                    spec.name,
                    ResolvedOption {
                        value: spec.default_value(),
                        origin: Origin::Default,
                    },
                )
            })
            .collect();
        Self { values }
    }
}

impl Config {
    /// Returns the value of `name`, if it is a known option.
    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name).map(|o| &o.value)
    }

    /// Returns where the value of `name` came from.
    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.values.get(name).map(|o| o.origin)
    }

    /// Iterates options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ResolvedOption)> {
        self.values.iter().map(|(name, option)| (*name, option))
    }

    fn bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(ConfigValue::Bool(true)))
    }

    fn integer(&self, name: &str) -> u64 {
        match self.get(name) {
            Some(ConfigValue::Integer(n)) => *n,
            _ => 0,
        }
    }

    fn choice<T: FromStr + Default>(&self, name: &str) -> T {
        match self.get(name) {
            Some(ConfigValue::Choice(s)) => s.parse().unwrap_or_default(),
            _ => T::default(),
        }
    }

    pub fn max_width(&self) -> usize {
        self.integer("max_width") as usize
    }

    pub fn hard_tabs(&self) -> bool {
        self.bool("hard_tabs")
    }

    pub fn tab_spaces(&self) -> usize {
        self.integer("tab_spaces") as usize
    }

    pub fn newline_style(&self) -> NewlineStyle {
        self.choice("newline_style")
    }

    pub fn edition(&self) -> Edition {
        self.choice("edition")
    }

    pub fn emit_mode(&self) -> EmitMode {
        self.choice("emit_mode")
    }

    pub fn color(&self) -> Color {
        self.choice("color")
    }

    pub fn verbosity(&self) -> Verbosity {
        self.choice("verbosity")
    }

    pub fn unstable_features(&self) -> bool {
        self.bool("unstable_features")
    }

    pub fn blank_lines_upper_bound(&self) -> usize {
        self.integer("blank_lines_upper_bound") as usize
    }

    pub fn error_on_line_overflow(&self) -> bool {
        self.bool("error_on_line_overflow")
    }

    /// The configured version requirement, if any.
    pub fn required_version(&self) -> Option<&str> {
        match self.get("required_version") {
            Some(ConfigValue::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    fn check_unstable(&self) -> Result<(), ConfigError> {
        if self.unstable_features() {
            return Ok(());
        }
        for spec in OPTIONS.iter().filter(|spec| !spec.stable) {
            if self.origin(spec.name).is_some_and(|o| o != Origin::Default) {
                return Err(ConfigError::UnstableOption {
                    key: spec.name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_required_version(&self) -> Result<(), ConfigError> {
        let Some(required) = self.required_version() else {
            return Ok(());
        };
        let requirement = VersionReq::parse(required).map_err(|e| {
            ConfigError::invalid_value("required_version", required, e.to_string())
        })?;
        let actual = env!("CARGO_PKG_VERSION");
        let version = Version::parse(actual)
            .map_err(|e| ConfigError::invalid_value("required_version", actual, e.to_string()))?;
        if !requirement.matches(&version) {
            return Err(ConfigError::VersionMismatch {
                required: required.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, option) in &self.values {
            map.serialize_entry(name, &option.value)?;
        }
        map.end()
    }
}

/// Resolves a configuration: `overrides` > `discovered` > `defaults`, field by field.
///
/// Unknown keys in either layer fail with [`ConfigError::UnknownOption`].
pub fn resolve(
    defaults: &Config,
    discovered: Option<&RawOptions>,
    overrides: &RawOptions,
) -> Result<Config, ConfigError> {
    let mut values = defaults.values.clone();

    let layers = [(discovered, Origin::File), (Some(overrides), Origin::Override)];
    for (layer, origin) in layers {
        let Some(layer) = layer else {
            continue;
        };
        for (key, raw) in layer {
            let spec = options::lookup(key).ok_or_else(|| ConfigError::UnknownOption {
                key: key.clone(),
                origin,
            })?;
            let value = spec.coerce(raw)?;
            values.insert(spec.name, ResolvedOption { value, origin });
        }
    }

    let config = Config { values };
    config.check_unstable()?;
    config.check_required_version()?;

    debug!(
        "Resolved config ({} from file, {} overridden)",
        config.iter().filter(|(_, o)| o.origin == Origin::File).count(),
        config.iter().filter(|(_, o)| o.origin == Origin::Override).count()
    );
    Ok(config)
}

/// Maps client-supplied options onto configuration overrides.
pub trait CliOptions {
    /// Writes every option the user set into `overrides`.
    fn apply_to(&self, overrides: &mut RawOptions);

    /// Explicit config file path, bypassing discovery.
    fn config_path(&self) -> Option<&Path>;
}

/// Everything needed to resolve a [`Config`], captured before a session starts.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub defaults: Config,
    pub discovered: Option<DiscoveredConfig>,
    pub overrides: RawOptions,
}

impl ConfigSources {
    /// Sources with only built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `discovered` as the config file layer.
    pub fn with_discovered(mut self, discovered: DiscoveredConfig) -> Self {
        self.discovered = Some(discovered);
        self
    }

    /// Adds one override.
    pub fn with_override(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Replaces the override layer.
    pub fn with_overrides(mut self, overrides: RawOptions) -> Self {
        self.overrides = overrides;
        self
    }

    /// Gathers sources: the explicit config path when given, else discovery
    /// from `start_dir`, plus the CLI overrides.
    pub fn load(
        start_dir: &Path,
        options: &dyn CliOptions,
        discovery: &dyn ConfigDiscovery,
    ) -> Result<Self, ConfigError> {
        let discovered = match options.config_path() {
            Some(path) => Some(load_config_file(path)?),
            None => discovery.discover(start_dir)?,
        };

        let mut overrides = RawOptions::new();
        options.apply_to(&mut overrides);

        Ok(Self {
            defaults: Config::default(),
            discovered,
            overrides,
        })
    }

    /// Path of the config file layer, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.discovered.as_ref().map(|d| d.path.as_path())
    }

    /// Resolves the layers into a [`Config`].
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        resolve(
            &self.defaults,
            self.discovered.as_ref().map(|d| &d.options),
            &self.overrides,
        )
    }
}

/// Loads and resolves a config in one step, returning the file used.
pub fn load_config(
    start_dir: &Path,
    options: &dyn CliOptions,
    discovery: &dyn ConfigDiscovery,
) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let sources = ConfigSources::load(start_dir, options, discovery)?;
    let config = sources.resolve()?;
    Ok((config, sources.config_path().map(Path::to_path_buf)))
}
