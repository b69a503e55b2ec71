//! # Configuration File Loading
//!
//! Loads pipeline configuration from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension. Every section
//! is optional; missing fields take their defaults. Loaded files are validated
//! before they are returned.

use crate::config::Config;
use std::path::Path;
use validator::Validate;

/// Configuration file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration in {path}: {reason}")]
    Invalid { path: String, reason: String }
}

fn read_config(path: &Path) -> Result<String, ConfigFileError> {
    std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))
}

fn validated(config: Config, path: &Path) -> Result<Config, ConfigFileError> {
    config.validate().map_err(|e| ConfigFileError::Invalid {
        path: path.display().to_string(),
        reason: e.to_string()
    })?;
    Ok(config)
}

/// Load configuration from TOML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_toml(Path::new("aura.toml"))?;
///     println!("Provider: {}", config.provider.kind);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid TOML syntax or unknown enum values
/// - Values outside their validated ranges
pub fn load_from_toml(path: &Path) -> Result<Config, ConfigFileError> {
    let contents = read_config(path)?;
    let config: Config =
        toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;
    validated(config, path)
}

/// Load configuration from YAML file.
///
/// Same contract as [`load_from_toml`].
pub fn load_from_yaml(path: &Path) -> Result<Config, ConfigFileError> {
    let contents = read_config(path)?;
    let config: Config =
        serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))?;
    validated(config, path)
}

/// Load configuration from file with auto-detection.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml` / `.yml`: YAML format
pub fn load_from_file(path: &Path) -> Result<Config, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_toml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");

        let toml_content = r#"
[provider]
kind = "gemini"
timeout_seconds = 30

[provider.gemini]
model = "gemini-exp"

[pipeline]
max_elements = 20
assessment_confidence_threshold = 0.4

[pipeline.heuristics]
idle_time_seconds = 20.0

[cache]
explanation_ttl_seconds = 600

[storage]
database_url = "sqlite://test.db"

[observability]
logging_level = "debug"
"#;
        fs::write(&path, toml_content).unwrap();

        let config = load_from_toml(&path).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.provider.timeout_seconds, 30);
        assert_eq!(config.provider.gemini.model, "gemini-exp");
        assert_eq!(config.provider.gemini.vision_model, "gemini-1.5-pro");
        assert_eq!(config.pipeline.max_elements, 20);
        assert_eq!(config.pipeline.assessment_confidence_threshold, 0.4);
        assert_eq!(config.pipeline.heuristics.idle_time_seconds, 20.0);
        assert_eq!(config.pipeline.heuristics.structure_chars, 10_000);
        assert_eq!(config.cache.explanation_ttl_seconds, 600);
        assert_eq!(config.storage.database_url, "sqlite://test.db");
        assert_eq!(config.observability.logging_level, "debug");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_yaml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("yaml");

        let yaml_content = r#"
provider:
  kind: openai
  openai:
    model: gpt-4o-mini
pipeline:
  phase_retries: 2
cache:
  enabled: false
"#;
        fs::write(&path, yaml_content).unwrap();

        let config = load_from_yaml(&path).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.openai.model, "gpt-4o-mini");
        assert_eq!(config.pipeline.phase_retries, 2);
        assert!(!config.cache.enabled);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_file_unsupported() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("json");
        fs::write(&path, "{}").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::UnsupportedFormat(_))));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_file_no_extension() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("");

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::NoExtension)));
    }

    #[test]
    fn test_load_from_file_auto_detect_yml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("yml");
        fs::write(&path, "provider:\n  ollama:\n    model: llama3\n").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.provider.ollama.model, "llama3");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_toml_invalid() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        fs::write(&path, "[invalid\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::TomlParse(_))));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_toml_unknown_provider() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        fs::write(&path, "[provider]\nkind = \"claude\"\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::TomlParse(_))));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_toml_out_of_range() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        fs::write(&path, "[pipeline]\nadaptation_confidence_threshold = 2.0\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::Invalid { .. })));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_toml_not_found() {
        let path = Path::new("/nonexistent/path/config.toml");
        let result = load_from_toml(path);
        assert!(matches!(result, Err(ConfigFileError::FileNotFound(_))));
    }
}
