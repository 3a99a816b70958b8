//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! [audit]
//! enabled = true
//! extension_name = "TIE_FORMAT_MODIFICATIONS"
//!
//! [propagation]
//! update_in_progress_match_ups = false
//!
//! [ids]
//! pool = ["a1", "a2"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default name of the draw extension holding modification records.
pub const TIE_FORMAT_MODIFICATIONS: &str = "TIE_FORMAT_MODIFICATIONS";

/// Audit policy for tie-format modifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether modification records are appended to draws.
    pub enabled: bool,
    /// Extension name the records are stored under.
    pub extension_name: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            extension_name: TIE_FORMAT_MODIFICATIONS.to_string(),
        }
    }
}

/// Defaults applied during propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Allow reconciling match-ups that are in progress. Operations may
    /// override this per call.
    pub update_in_progress_match_ups: bool,
}

/// Pre-allocated identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    /// Consumed in order before any identifier is generated.
    pub pool: Vec<String>,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub audit: AuditConfig,
    pub propagation: PropagationConfig,
    pub ids: IdConfig,
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Builder: turn the audit policy on.
    pub fn with_audit(mut self) -> Self {
        self.audit.enabled = true;
        self
    }

    /// Builder: supply pre-allocated identifiers.
    pub fn with_id_pool(mut self, pool: Vec<String>) -> Self {
        self.ids.pool = pool;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(!config.audit.enabled);
        assert_eq!(config.audit.extension_name, TIE_FORMAT_MODIFICATIONS);
    }

    #[test]
    fn parse_sections() {
        let config = EngineConfig::parse(
            r#"
[audit]
enabled = true

[propagation]
update_in_progress_match_ups = true

[ids]
pool = ["id-1", "id-2"]
"#,
        )
        .unwrap();
        assert!(config.audit.enabled);
        assert_eq!(config.audit.extension_name, TIE_FORMAT_MODIFICATIONS);
        assert!(config.propagation.update_in_progress_match_ups);
        assert_eq!(config.ids.pool, vec!["id-1", "id-2"]);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[audit]\nenabled = true\nextension_name = \"AUDIT\"").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.audit.extension_name, "AUDIT");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("engine.toml")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn malformed_toml() {
        assert!(matches!(
            EngineConfig::parse("[audit\nenabled = true"),
            Err(EngineError::Toml(_))
        ));
    }
}
