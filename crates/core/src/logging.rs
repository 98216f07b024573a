//! Logging configuration file handling.
//!
//! The container ships a TOML template containing `${LOG_LEVEL}`. At startup the
//! supervisor substitutes the resolved level into the file in place, then both
//! the supervisor and the application server load it to build their tracing
//! subscriber.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::level::LogLevel;

/// Token replaced with the resolved log level.
pub const LOG_LEVEL_PLACEHOLDER: &str = "${LOG_LEVEL}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    /// Colored output; off by default since container logs are files
    #[serde(default)]
    pub ansi: bool,

    /// Include the event target (module path)
    #[serde(default = "default_target")]
    pub target: bool,

    /// Extra `EnvFilter` directives, e.g. `"tower_http=debug"`
    #[serde(default)]
    pub directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

fn default_target() -> bool {
    true
}

impl LoggingConfig {
    /// Config used when no file is given.
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            level,
            format: LogFormat::default(),
            ansi: false,
            target: default_target(),
            directives: Vec::new(),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read logging config {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid logging config {}", path.display()))
    }

    /// Substitute `level` into the template at `path`, write it back, and load it.
    pub fn render_template(path: &Path, level: LogLevel) -> Result<Self> {
        let template = fs::read_to_string(path)
            .with_context(|| format!("Failed to read logging config template {}", path.display()))?;
        let rendered = substitute_level(&template, level);
        fs::write(path, &rendered)
            .with_context(|| format!("Failed to write logging config {}", path.display()))?;
        Self::parse(&rendered)
            .with_context(|| format!("Invalid logging config {}", path.display()))
    }

    /// Build the filter: `RUST_LOG` first, then the configured level and directives.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::from_default_env().add_directive(self.level.as_tracing().into());
        for directive in &self.directives {
            filter = filter.add_directive(
                directive
                    .parse::<Directive>()
                    .with_context(|| format!("Invalid log directive '{}'", directive))?,
            );
        }
        Ok(filter)
    }

    /// Install the global subscriber. Fails if one is already installed.
    pub fn init(&self) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_ansi(self.ansi)
            .with_target(self.target);

        let installed = match self.format {
            LogFormat::Full => builder.try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        };
        installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
    }
}

pub fn substitute_level(template: &str, level: LogLevel) -> String {
    template.replace(LOG_LEVEL_PLACEHOLDER, level.as_str())
}
