//! Allocator configuration - TOML file or defaults

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Assign owning modules to class mirrors
    #[serde(default = "default_true")]
    pub modules_enabled: bool,

    /// Largest shape (in slots) initialized through its precomputed plan;
    /// 0 forces the generic loop everywhere
    #[serde(default = "default_unroll_limit")]
    pub unroll_limit: usize,

    /// Keep per-class counts in the counting tracker
    #[serde(default = "default_false")]
    pub per_class_accounting: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            modules_enabled: true,
            unroll_limit: default_unroll_limit(),
            per_class_accounting: false,
        }
    }
}

impl AllocatorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Look for `guest-heap.toml` in `dir`, falling back to defaults
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join("guest-heap.toml");
        if candidate.exists() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Config that never takes the precomputed initialization path
    pub fn generic_only() -> Self {
        Self {
            unroll_limit: 0,
            ..Self::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_unroll_limit() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AllocatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, AllocatorConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = AllocatorConfig::from_toml_str("unroll_limit = 8\nper_class_accounting = true").unwrap();
        assert_eq!(config.unroll_limit, 8);
        assert!(config.per_class_accounting);
        assert!(config.modules_enabled);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = AllocatorConfig::from_toml_str("unroll_limit = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn discover_reads_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("guest-heap.toml")).unwrap();
        writeln!(file, "modules_enabled = false").unwrap();

        let config = AllocatorConfig::discover(dir.path()).unwrap();
        assert!(!config.modules_enabled);
    }

    #[test]
    fn discover_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AllocatorConfig::discover(dir.path()).unwrap(), AllocatorConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AllocatorConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
