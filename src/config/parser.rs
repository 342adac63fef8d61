//! Configuration parser for loading configuration files.
//!
//! This module handles loading configuration from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, Result, StackformError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::{PipelineConfig, StackformConfig};

/// Configuration parser for loading stack configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<StackformConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(StackformError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            StackformError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<StackformConfig> {
        debug!("Parsing YAML configuration");

        let config: StackformConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            StackformError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Successfully parsed configuration for stack: {}", config.stack.name);
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// Environment variables are checked in the format `STACKFORM_<KEY>`
    /// (e.g., `STACKFORM_STACK_NAME`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<StackformConfig> {
        let mut config = self.load_file(path)?;

        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(config: &mut StackformConfig) {
        if let Ok(region) = std::env::var("STACKFORM_REGION") {
            debug!("Overriding region from environment");
            config.region = Some(region);
        }

        if let Ok(name) = std::env::var("STACKFORM_STACK_NAME") {
            debug!("Overriding stack.name from environment");
            config.stack.name = name;
        }

        if let Ok(template) = std::env::var("STACKFORM_TEMPLATE") {
            debug!("Overriding stack.template from environment");
            config.stack.template = template;
        }

        if let Ok(pipeline) = std::env::var("STACKFORM_PIPELINE") {
            debug!("Overriding pipeline.name from environment");
            match config.pipeline.as_mut() {
                Some(existing) => existing.name = pipeline,
                None => {
                    config.pipeline = Some(PipelineConfig {
                        name: pipeline,
                        source_action: crate::pipeline::DEFAULT_SOURCE_ACTION.to_string(),
                    });
                }
            }
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                StackformError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Resolves a path from the configuration against the base path.
    #[must_use]
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "stackform.yaml",
    "stackform.yml",
    "stack.yaml",
    "stack.yml",
];

/// Finds the configuration file in the current directory or parent directories.
///
/// # Errors
///
/// Returns an error if the start directory cannot be resolved or no
/// configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    // Relative paths such as "." have no parents to pop.
    let mut current = std::fs::canonicalize(start)?;

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(StackformError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaitConfig;
    use crate::stack::Waiter;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
stack:
  name: demo-stack
  template: template.yml
";
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).expect("valid config");

        assert_eq!(config.stack.name, "demo-stack");
        assert!(config.stack.parameters.is_empty());
        assert_eq!(config.waits, WaitConfig::default());
        assert!(config.pipeline.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
region: eu-west-1
stack:
  name: demo-stack
  template: templates/app.yml
  parameters:
    Env: dev
    InstanceCount: "2"
waits:
  exists_secs: 30
  update_secs: 900
  max_rounds: 5
pipeline:
  name: app-pipeline
"#;
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).expect("valid config");

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.stack.parameters.get("Env"), Some("dev"));
        assert_eq!(config.stack.parameters.get("InstanceCount"), Some("2"));
        assert_eq!(config.waits.limit_for(Waiter::Exists), Duration::from_secs(30));
        assert_eq!(
            config.waits.limit_for(Waiter::UpdateComplete),
            Duration::from_secs(900)
        );
        assert_eq!(
            config.waits.limit_for(Waiter::CreateComplete),
            Duration::from_secs(WaitConfig::DEFAULT_OPERATION_SECS)
        );
        assert_eq!(config.waits.max_rounds, 5);

        let pipeline = config.pipeline.expect("pipeline");
        assert_eq!(pipeline.name, "app-pipeline");
        assert_eq!(pipeline.source_action, "Source");
    }

    #[test]
    fn test_invalid_yaml_reports_location() {
        let parser = ConfigParser::new();
        let err = parser
            .parse_yaml("stack: [", Some(Path::new("stackform.yaml")))
            .expect_err("invalid yaml");

        assert!(matches!(
            err,
            StackformError::Config(ConfigError::ParseError { location: Some(_), .. })
        ));
    }

    #[test]
    fn test_find_config_file_searches_parents() {
        let temp = TempDir::new().expect("temp dir");
        let nested = temp.path().join("infra").join("app");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(
            temp.path().join("stackform.yaml"),
            "stack:\n  name: demo-stack\n  template: t.yml\n",
        )
        .expect("write config");

        let found = find_config_file(&nested).expect("config found");
        assert_eq!(
            found,
            std::fs::canonicalize(temp.path().join("stackform.yaml")).expect("canonical path")
        );

        let config = ConfigParser::new().load_file(&found).expect("load");
        assert_eq!(config.stack.template, "t.yml");
    }

    #[test]
    fn test_find_config_file_from_relative_start() {
        let temp = TempDir::new().expect("temp dir");
        let nested = temp.path().join("infra").join("app");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(
            temp.path().join("stack.yml"),
            "stack:\n  name: demo-stack\n  template: t.yml\n",
        )
        .expect("write config");

        let original = std::env::current_dir().expect("cwd");
        std::env::set_current_dir(&nested).expect("enter nested dir");
        let found = find_config_file(".");
        std::env::set_current_dir(original).expect("restore cwd");

        let expected =
            std::fs::canonicalize(temp.path().join("stack.yml")).expect("canonical path");
        assert_eq!(found.expect("config found"), expected);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let err = ConfigParser::new()
            .load_file(temp.path().join("nope.yaml"))
            .expect_err("missing file");

        assert!(matches!(
            err,
            StackformError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_path_against_base() {
        let parser = ConfigParser::new().with_base_path("/srv/infra");

        assert_eq!(
            parser.resolve_path("templates/app.yml"),
            PathBuf::from("/srv/infra/templates/app.yml")
        );
        assert_eq!(
            parser.resolve_path("/abs/app.yml"),
            PathBuf::from("/abs/app.yml")
        );
    }
}
