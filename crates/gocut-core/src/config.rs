//! Configuration loading and parsing for gocut
//!
//! Provides functionality to load and parse `gocut.toml` configuration files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "gocut.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["output", "emit", "imports"];
const KNOWN_EMIT_KEYS: &[&str] = &["doc_comments"];
const KNOWN_IMPORTS_KEYS: &[&str] = &["normalize", "strict"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory the minimized file is written to.
    pub output: PathBuf,
    pub emit: EmitConfig,
    pub imports: ImportsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            emit: EmitConfig::default(),
            imports: ImportsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmitConfig {
    /// Copy the doc comment of every retained declaration.
    pub doc_comments: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self { doc_comments: true }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportsConfig {
    pub normalize: bool,
    /// Fail instead of warning when the emitted file cannot be normalized.
    pub strict: bool,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            strict: false,
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult {
        config,
        path: Some(path.to_path_buf()),
        warnings,
    })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [("emit", KNOWN_EMIT_KEYS), ("imports", KNOWN_IMPORTS_KEYS)] {
        if let Some(toml::Value::Table(entries)) = table.get(section) {
            for key in entries.keys() {
                if !known.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

/// Loads the nearest `gocut.toml` above `start_dir`, falling back to the
/// defaults when there is none.
pub fn load_config_or_default_with_warnings(
    start_dir: &Path,
) -> Result<ConfigResult, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path),
        None => Ok(ConfigResult::default()),
    }
}
