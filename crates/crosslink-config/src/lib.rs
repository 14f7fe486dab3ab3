//! Configuration management for crosslink.
//!
//! Parses `crosslink.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Site declarations
//! (`[[crosslinks]]`) are kept raw here and validated by
//! [`SiteRegistry::from_config`], so errors can point at the offending entry.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `local.docs_dir`
//! - `local.site_url`
//! - `crosslinks[].source_dir`
//! - `crosslinks[].target_url`

mod expand;
mod site;

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use site::{LOCAL_SITE_NAME, SITE_FIELDS, Site, SiteRegistry};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the local docs directory.
    pub docs_dir: Option<PathBuf>,
    /// Override the local site URL.
    pub site_url: Option<String>,
    /// Override the enabled flag.
    pub enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "crosslink.toml";

/// Upper bound for `index.max_extension_depth`.
const MAX_EXTENSION_DEPTH_LIMIT: usize = 32;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether links are rewritten at all.
    pub enabled: bool,
    /// Pseudo-protocol prefix (`x-` in `x-NAME://path`).
    pub prefix: String,
    /// Pseudo-protocol suffix (`://` in `x-NAME://path`).
    pub suffix: String,
    /// Local site configuration (paths are relative strings from TOML).
    local: LocalConfigRaw,
    /// Path index configuration.
    pub index: IndexConfig,
    /// Source migration configuration.
    pub migrate: MigrateConfig,
    /// Raw site declarations, validated by [`SiteRegistry::from_config`].
    pub crosslinks: Vec<toml::Value>,

    /// Resolved local site configuration (set after loading).
    #[serde(skip)]
    pub local_resolved: LocalConfig,
    /// Directory relative paths are resolved against (set after loading).
    #[serde(skip)]
    pub config_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw local site configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LocalConfigRaw {
    docs_dir: Option<String>,
    site_url: Option<String>,
    use_directory_urls: Option<bool>,
}

/// Resolved configuration of the host site with absolute paths.
#[derive(Debug, Default)]
pub struct LocalConfig {
    /// Docs directory of the host site.
    pub docs_dir: PathBuf,
    /// Public URL of the host site, if known.
    pub site_url: Option<String>,
    /// Whether the host site publishes `page.md` as `page/`.
    pub use_directory_urls: bool,
}

impl LocalConfig {
    /// Target URL for links into the host site.
    ///
    /// Only the path of `site_url` is used, so `https://example.com/docs/`
    /// yields `/docs/` and links keep working under a local preview server.
    /// Without a site URL the target is `/`.
    pub fn target_url(&self) -> Result<String, ConfigError> {
        let Some(site_url) = self.site_url.as_deref() else {
            return Ok("/".to_owned());
        };
        match url::Url::parse(site_url) {
            Ok(parsed) => Ok(parsed.path().to_owned()),
            Err(url::ParseError::RelativeUrlWithoutBase) if site_url.starts_with('/') => {
                Ok(site_url.to_owned())
            }
            Err(e) => Err(ConfigError::Validation(format!(
                "local.site_url '{site_url}' is not a valid URL: {e}"
            ))),
        }
    }
}

/// Path index configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of extensions a lookup may strip (`jquery` finds `jquery.min.js` at 2).
    pub max_extension_depth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_extension_depth: 5,
        }
    }
}

/// Source migration configuration.
///
/// Describes the legacy link syntax (`@NAME:path` by default) that
/// `crosslink migrate` converts to the current pseudo-protocol.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Legacy protocol prefix.
    pub legacy_prefix: String,
    /// Legacy protocol suffix.
    pub legacy_suffix: String,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            legacy_prefix: "@".to_owned(),
            legacy_suffix: ":".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`local.site_url`").
        field: String,
        /// Error message (e.g., "${`DOCS_HOST`} not set").
        message: String,
    },
    /// Invalid site declaration, with the data that caused it.
    #[error("{message}\n\nCaused by data at {location}: {data}")]
    Entry {
        /// What is wrong with the entry.
        message: String,
        /// Position in the declaration list (e.g., "crosslinks[2]").
        location: String,
        /// The offending entry rendered as JSON.
        data: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `crosslink.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Relative paths are resolved against `config_dir`. Used by hosts that
    /// embed the crosslink settings in their own configuration.
    pub fn parse(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;
        config.resolve_paths(config_dir);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(docs_dir) = &settings.docs_dir {
            self.local_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(site_url) = &settings.site_url {
            self.local_resolved.site_url = Some(site_url.clone());
        }
        if let Some(enabled) = settings.enabled {
            self.enabled = enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            enabled: true,
            prefix: "x-".to_owned(),
            suffix: "://".to_owned(),
            local: LocalConfigRaw::default(),
            index: IndexConfig::default(),
            migrate: MigrateConfig::default(),
            crosslinks: Vec::new(),
            local_resolved: LocalConfig {
                docs_dir: base.join("docs"),
                site_url: None,
                use_directory_urls: true,
            },
            config_dir: base.to_path_buf(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::parse(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Site declarations are validated separately by [`SiteRegistry::from_config`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.prefix, "prefix")?;
        require_non_empty(&self.migrate.legacy_prefix, "migrate.legacy_prefix")?;

        let depth = self.index.max_extension_depth;
        if depth == 0 || depth > MAX_EXTENSION_DEPTH_LIMIT {
            return Err(ConfigError::Validation(format!(
                "index.max_extension_depth must be between 1 and {MAX_EXTENSION_DEPTH_LIMIT}"
            )));
        }

        self.local_resolved.target_url()?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref docs_dir) = self.local.docs_dir {
            self.local.docs_dir = Some(expand::expand_env(docs_dir, "local.docs_dir")?);
        }
        if let Some(ref site_url) = self.local.site_url {
            self.local.site_url = Some(expand::expand_env(site_url, "local.site_url")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.local_resolved = LocalConfig {
            docs_dir: config_dir.join(self.local.docs_dir.as_deref().unwrap_or("docs")),
            site_url: self.local.site_url.clone(),
            use_directory_urls: self.local.use_directory_urls.unwrap_or(true),
        };
        self.config_dir = config_dir.to_path_buf();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.enabled);
        assert_eq!(config.prefix, "x-");
        assert_eq!(config.suffix, "://");
        assert_eq!(config.local_resolved.docs_dir, PathBuf::from("/test/docs"));
        assert!(config.local_resolved.use_directory_urls);
        assert_eq!(config.index.max_extension_depth, 5);
        assert_eq!(config.migrate.legacy_prefix, "@");
        assert_eq!(config.migrate.legacy_suffix, ":");
        assert!(config.crosslinks.is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse("", Path::new("/project")).unwrap();
        assert_eq!(config.prefix, "x-");
        assert_eq!(
            config.local_resolved.docs_dir,
            PathBuf::from("/project/docs")
        );
        assert_eq!(config.config_dir, PathBuf::from("/project"));
    }

    #[test]
    fn test_parse_protocol_and_local() {
        let toml = r#"
prefix = "site+"
suffix = ":"
enabled = false

[local]
docs_dir = "documentation"
site_url = "https://example.com/some/dir/"
use_directory_urls = false
"#;
        let config = Config::parse(toml, Path::new("/project")).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.prefix, "site+");
        assert_eq!(config.suffix, ":");
        assert_eq!(
            config.local_resolved.docs_dir,
            PathBuf::from("/project/documentation")
        );
        assert!(!config.local_resolved.use_directory_urls);
        assert_eq!(config.local_resolved.target_url().unwrap(), "/some/dir/");
    }

    #[test]
    fn test_parse_crosslinks_kept_raw() {
        let toml = r#"
[[crosslinks]]
name = "api"
source_dir = "../api/docs"
target_url = "https://example.com/api/"
use_directory_urls = true

[[crosslinks]]
name = "blog"
"#;
        let config = Config::parse(toml, Path::new("/project")).unwrap();
        assert_eq!(config.crosslinks.len(), 2);
        assert_eq!(config.crosslinks[0]["name"].as_str(), Some("api"));
    }

    #[test]
    fn test_local_target_url_defaults_to_root() {
        let local = LocalConfig::default();
        assert_eq!(local.target_url().unwrap(), "/");
    }

    #[test]
    fn test_local_target_url_accepts_absolute_path() {
        let local = LocalConfig {
            site_url: Some("/docs/".to_owned()),
            ..LocalConfig::default()
        };
        assert_eq!(local.target_url().unwrap(), "/docs/");
    }

    #[test]
    fn test_local_target_url_rejects_garbage() {
        let local = LocalConfig {
            site_url: Some("not a url".to_owned()),
            ..LocalConfig::default()
        };
        let err = local.target_url().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("local.site_url"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            docs_dir: Some(PathBuf::from("/custom/docs")),
            site_url: Some("https://example.com/".to_owned()),
            enabled: Some(false),
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.local_resolved.docs_dir, PathBuf::from("/custom/docs"));
        assert_eq!(
            config.local_resolved.site_url.as_deref(),
            Some("https://example.com/")
        );
        assert!(!config.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert!(config.enabled);
        assert_eq!(config.local_resolved.docs_dir, PathBuf::from("/test/docs"));
        assert!(config.local_resolved.site_url.is_none());
    }

    #[test]
    fn test_expand_env_vars_local() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("XL_CONFIG_TEST_HOST", "docs.example.com");
        }

        let toml = r#"
[local]
site_url = "https://${XL_CONFIG_TEST_HOST}/handbook/"
docs_dir = "${XL_CONFIG_TEST_DOCS:-content}"
"#;
        let config = Config::parse(toml, Path::new("/project")).unwrap();

        assert_eq!(config.local_resolved.target_url().unwrap(), "/handbook/");
        assert_eq!(
            config.local_resolved.docs_dir,
            PathBuf::from("/project/content")
        );

        unsafe {
            std::env::remove_var("XL_CONFIG_TEST_HOST");
        }
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/crosslink.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file_sets_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "prefix = \"xl-\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.prefix, "xl-");
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.config_dir, temp_dir.path());
        assert_eq!(config.local_resolved.docs_dir, temp_dir.path().join("docs"));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.prefix = String::new();
        assert_validation_error(&config, &["prefix", "empty"]);
    }

    #[test]
    fn test_validate_empty_suffix_allowed() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.suffix = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_legacy_prefix() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.migrate.legacy_prefix = String::new();
        assert_validation_error(&config, &["migrate.legacy_prefix"]);
    }

    #[test]
    fn test_validate_extension_depth_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.index.max_extension_depth = 0;
        assert_validation_error(&config, &["max_extension_depth"]);
    }

    #[test]
    fn test_validate_extension_depth_too_high() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.index.max_extension_depth = 100;
        assert_validation_error(&config, &["max_extension_depth", "32"]);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = Config::parse("prefix = ", Path::new("/project")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
