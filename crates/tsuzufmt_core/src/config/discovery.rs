//! Config file discovery on the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use jsonc_parser::ParseOptions;
use tracing::debug;

use super::RawOptions;
use crate::error::ConfigError;

/// Config file names, in lookup order within one directory.
pub const CONFIG_FILES: &[&str] = &[".tsuzufmt.jsonc", ".tsuzufmt.json", "tsuzufmt.json"];

/// A config file found by discovery, with its parsed options.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredConfig {
    pub path: PathBuf,
    pub options: RawOptions,
}

/// Finds at most one config file for a starting directory.
pub trait ConfigDiscovery {
    fn discover(&self, start_dir: &Path) -> Result<Option<DiscoveredConfig>, ConfigError>;
}

/// Searches `start_dir` and its ancestors, then the user config directory.
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    global_dir: Option<PathBuf>,
}

impl Default for FsDiscovery {
    fn default() -> Self {
        Self {
            global_dir: dirs::config_dir().map(|dir| dir.join("tsuzufmt")),
        }
    }
}

impl FsDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the fallback directory; `None` disables the fallback.
    pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_dir = dir;
        self
    }

    /// Returns the path of the nearest config file, without reading it.
    pub fn find(&self, start_dir: &Path) -> Option<PathBuf> {
        let start = start_dir
            .canonicalize()
            .unwrap_or_else(|_| start_dir.to_path_buf());

        start
            .ancestors()
            .find_map(find_in_dir)
            .or_else(|| self.global_dir.as_deref().and_then(find_in_dir))
    }
}

impl ConfigDiscovery for FsDiscovery {
    fn discover(&self, start_dir: &Path) -> Result<Option<DiscoveredConfig>, ConfigError> {
        match self.find(start_dir) {
            Some(path) => {
                debug!("Found config file {}", path.display());
                load_config_file(&path).map(Some)
            }
            None => {
                debug!("No config file found from {}", start_dir.display());
                Ok(None)
            }
        }
    }
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Reads and parses one config file.
pub fn load_config_file(path: &Path) -> Result<DiscoveredConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::file(path, e.to_string()))?;
    let options = parse_config(&content, path)?;
    Ok(DiscoveredConfig {
        path: path.to_path_buf(),
        options,
    })
}

/// Parses JSONC config text; the root must be an object.
pub fn parse_config(content: &str, path: &Path) -> Result<RawOptions, ConfigError> {
    let value = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
        .map_err(|e| ConfigError::file(path, e.to_string()))?;

    match value {
        None => Ok(RawOptions::new()),
        Some(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
        Some(_) => Err(ConfigError::file(path, "root must be an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn local_only() -> FsDiscovery {
        FsDiscovery::new().with_global_dir(None)
    }

    #[test]
    fn test_parse_jsonc_comments() {
        let content = r#"{
            // wrap early
            "max_width": 80,
            "hard_tabs": true /* block comment */
        }"#;
        let options = parse_config(content, Path::new("x.jsonc")).unwrap();

        assert_eq!(options["max_width"], json!(80));
        assert_eq!(options["hard_tabs"], json!(true));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_config("", Path::new("x.json")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = parse_config("[1, 2]", Path::new("x.json")).unwrap_err();
        assert!(err.to_string().contains("root must be an object"));
    }

    #[test]
    fn test_discovers_in_ancestor() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(".tsuzufmt.jsonc"), r#"{ "tab_spaces": 2 }"#).unwrap();

        let found = local_only().discover(&nested).unwrap().unwrap();
        assert_eq!(found.options["tab_spaces"], json!(2));
        assert!(found.path.ends_with(".tsuzufmt.jsonc"));
    }

    #[test]
    fn test_nearest_file_wins() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(".tsuzufmt.json"), r#"{ "max_width": 80 }"#).unwrap();
        fs::write(nested.join("tsuzufmt.json"), r#"{ "max_width": 60 }"#).unwrap();

        let found = local_only().discover(&nested).unwrap().unwrap();
        assert_eq!(found.options["max_width"], json!(60));
    }

    #[test]
    fn test_global_fallback() {
        let project = tempdir().unwrap();
        let global = tempdir().unwrap();
        fs::write(global.path().join(".tsuzufmt.json"), r#"{ "hard_tabs": true }"#).unwrap();

        let discovery = FsDiscovery::new().with_global_dir(Some(global.path().to_path_buf()));
        let found = discovery.discover(project.path()).unwrap().unwrap();
        assert_eq!(found.options["hard_tabs"], json!(true));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".tsuzufmt.jsonc"), "{ \"max_width\": ").unwrap();

        let err = local_only().discover(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }
}
