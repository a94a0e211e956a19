//! Generator configuration.
//!
//! Usually read from `pygen.toml` next to the OpenAPI document:
//! ```toml
//! package_name = "acme"
//! seed = 10
//! error_type = "Error"
//! skip_duplicate_types = ["Point2d"]
//! acronyms = ["KittyCAD"]
//! ```
//! Every key is optional.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::GenError;

/// Default config filename looked up by the CLI.
pub const CONFIG_FILENAME: &str = "pygen.toml";

/// Seed used for example branch selection unless overridden.
pub const DEFAULT_SEED: u64 = 10;

/// Settings for one generation run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Python package the generated modules live under.
    pub package_name: String,
    /// Seed for the example synthesizer's branch picks.
    pub seed: u64,
    /// Component name of the generic error body, excluded from success types.
    pub error_type: String,
    /// PascalCase names allowed to collide; the first definition wins.
    pub skip_duplicate_types: Vec<String>,
    /// Extra spellings the case converters must keep as one word.
    pub acronyms: Vec<String>,
    /// Install hint written into the JSON patch. Defaults to `pip install <package>`.
    pub install_command: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            package_name: "client".to_string(),
            seed: DEFAULT_SEED,
            error_type: "Error".to_string(),
            skip_duplicate_types: Vec::new(),
            acronyms: Vec::new(),
            install_command: None,
        }
    }
}

impl GeneratorConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, GenError> {
        let config: Self = toml::from_str(contents)
            .map_err(|err| GenError::Config(format!("Failed to parse config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, GenError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|err| GenError::io(path, err))?;
        Self::from_toml_str(&contents)
    }

    /// Install line shown next to each example.
    pub fn install_line(&self) -> String {
        self.install_command
            .clone()
            .unwrap_or_else(|| format!("pip install {}", self.package_name))
    }

    /// Replace the package name, e.g. from a command-line flag.
    pub fn set_package_name(&mut self, package_name: &str) -> Result<(), GenError> {
        let previous = std::mem::replace(&mut self.package_name, package_name.to_string());
        if let Err(err) = self.validate() {
            self.package_name = previous;
            return Err(err);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), GenError> {
        let valid_package = !self.package_name.is_empty()
            && self
                .package_name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self
                .package_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_package {
            return Err(GenError::Config(format!(
                "package_name '{}' is not a valid Python package name",
                self.package_name
            )));
        }
        if self.error_type.is_empty() {
            return Err(GenError::Config("error_type must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.seed, 10);
        assert_eq!(config.install_line(), "pip install client");
    }

    #[test]
    fn test_partial_config() {
        let config = GeneratorConfig::from_toml_str(
            r#"
package_name = "acme"
skip_duplicate_types = ["Point2d"]
acronyms = ["KittyCAD"]
"#,
        )
        .unwrap();
        assert_eq!(config.package_name, "acme");
        assert_eq!(config.error_type, "Error");
        assert_eq!(config.skip_duplicate_types, vec!["Point2d".to_string()]);
        assert_eq!(config.acronyms, vec!["KittyCAD".to_string()]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GeneratorConfig::from_toml_str("packag_name = \"x\"").unwrap_err();
        assert!(matches!(err, GenError::Config(_)), "got {err:?}");
    }

    #[test]
    fn test_invalid_package_name_rejected() {
        let err = GeneratorConfig::from_toml_str("package_name = \"my-client\"").unwrap_err();
        assert!(err.to_string().contains("my-client"));
    }

    #[test]
    fn test_set_package_name_validates() {
        let mut config = GeneratorConfig::default();
        config.set_package_name("acme_v2").unwrap();
        assert_eq!(config.package_name, "acme_v2");
        assert!(config.set_package_name("2fast").is_err());
        assert_eq!(config.package_name, "acme_v2");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::load(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }
}
