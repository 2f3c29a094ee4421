//! Job definitions
//!
//! Jobs are declared in a config file, `~/.config/shelf/jobs.toml` by default
//! (`$SHELF_CONFIG` overrides it). JSON files using the older `bk_jobs` layout
//! are read as well:
//!
//! ```json
//! { "bk_jobs": [ { "name": "docs", "destination": "$BACKUPS/docs",
//!                  "source": ["~/Documents"], "method": "tar.gz" } ] }
//! ```

use serde::{Deserialize, Serialize};
use shelf_core::Job;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The only archive method this tool implements
pub const TAR_GZ_METHOD: &str = "tar.gz";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SHELF_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config at {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Unknown backup method '{method}' for job '{job}'")]
    UnsupportedMethod { job: String, method: String },

    #[error("Invalid job '{job}': {reason}")]
    InvalidJob { job: String, reason: String },
}

/// All job definitions from one config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default, alias = "bk_jobs")]
    pub jobs: Vec<JobDefinition>,
}

impl JobConfig {
    /// First definition named `name`
    pub fn find(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// A job as written in the config, before path expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub destination: String,
    #[serde(default, alias = "sources")]
    pub source: Vec<String>,
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    TAR_GZ_METHOD.to_string()
}

impl JobDefinition {
    pub fn new(name: &str, destination: &str, sources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            destination: destination.to_string(),
            source: sources.iter().map(|s| s.to_string()).collect(),
            method: default_method(),
        }
    }

    /// Validate and expand environment references and `~` into a [`Job`]
    pub fn resolve(&self, home: Option<&Path>) -> Result<Job, ConfigError> {
        self.validate()?;

        let lookup = |name: &str| std::env::var(name).ok();
        let destination = expand_path(&self.destination, home, lookup);
        let sources = self
            .source
            .iter()
            .map(|source| expand_path(source, home, lookup))
            .collect();

        Ok(Job::new(self.name.clone(), sources, destination))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidJob {
            job: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.name.contains(|c: char| c == '/' || c == '\\') {
            return Err(invalid("name must not contain path separators"));
        }
        if self.method != TAR_GZ_METHOD {
            return Err(ConfigError::UnsupportedMethod {
                job: self.name.clone(),
                method: self.method.clone(),
            });
        }
        if self.destination.trim().is_empty() {
            return Err(invalid("destination is empty"));
        }
        if self.source.is_empty() {
            return Err(invalid("no sources declared"));
        }
        Ok(())
    }
}

/// Source of job definitions
pub trait ConfigProvider {
    fn load(&self) -> Result<JobConfig, ConfigError>;
}

/// Reads job definitions from a file on every load
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Provider for `$SHELF_CONFIG` or the platform default path
    pub fn from_default_path() -> Result<Self, ConfigError> {
        default_config_path()
            .map(Self::new)
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> Result<JobConfig, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(self.path.clone()))
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let config = parse_config(&self.path, &content)?;
        tracing::debug!(
            "Loaded {} job(s) from {}",
            config.jobs.len(),
            self.path.display()
        );
        Ok(config)
    }
}

/// In-memory job definitions
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: JobConfig,
}

impl StaticConfigProvider {
    pub fn new(jobs: Vec<JobDefinition>) -> Self {
        Self {
            config: JobConfig { jobs },
        }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> Result<JobConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Parse config content, choosing JSON or TOML by file extension
pub fn parse_config(path: &Path, content: &str) -> Result<JobConfig, ConfigError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        toml::from_str(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir().map(|h| h.join(".config/shelf"))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir().map(|c| c.join("shelf"))
    }
}

/// `$SHELF_CONFIG`, or `jobs.toml` in the config directory
pub fn default_config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => config_dir().map(|d| d.join("jobs.toml")),
    }
}

/// Expand `$VAR` / `${VAR}` references, then a leading `~`.
///
/// Unknown variables are left as written.
pub fn expand_path<F>(raw: &str, home: Option<&Path>, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let expanded = expand_vars(raw, lookup);

    if let Some(home) = home {
        if expanded == "~" {
            return home.to_path_buf();
        }
        if let Some(rest) = expanded.strip_prefix("~/") {
            return home.join(rest);
        }
    }

    PathBuf::from(expanded)
}

/// Replace `$NAME` and `${NAME}` with values from `lookup`
pub fn expand_vars<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                match lookup(name) {
                    Some(value) if !name.is_empty() => out.push_str(&value),
                    _ => out.push_str(&rest[pos..pos + end + 3]),
                }
                rest = &braced[end + 1..];
                continue;
            }
            out.push('$');
            rest = after;
            continue;
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..len];

        match lookup(name) {
            Some(value) if !name.is_empty() => out.push_str(&value),
            _ => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

/// Generate example config content for display
pub fn example_config() -> String {
    let config = JobConfig {
        jobs: vec![
            JobDefinition::new("documents", "~/Backups/documents", &["~/Documents", "~/Notes"]),
            JobDefinition::new("dotfiles", "$BACKUP_ROOT/dotfiles", &["~/.bashrc", "~/.config/nvim"]),
        ],
    };

    let mut content = String::from("# Shelf job definitions\n");
    content.push_str("# Location: ~/.config/shelf/jobs.toml (override with $SHELF_CONFIG or --config)\n");
    content.push_str("#\n");
    content.push_str("# Paths may use ~ and $VAR / ${VAR} environment references.\n");
    content.push_str("# Archives are written to <destination>/<name>-<version>.tar.gz\n\n");
    content.push_str(&toml::to_string_pretty(&config).unwrap_or_default());
    content
}
