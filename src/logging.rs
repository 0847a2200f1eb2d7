// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Subscriber setup for binaries
//!
//! The library only emits `tracing` events. Nothing is printed unless a
//! subscriber is installed, e.g. with [`init`].

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Environment variable holding the log level or a full filter directive
pub const LOG_ENV: &str = "TEAPOT_LOG";

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "TEAPOT_LOG_FORMAT";

/// Minimum level of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(Error::config(
                "log_level",
                s,
                "expected one of trace, debug, info, warn, error",
            )),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogFormat {
    /// Human readable single lines
    #[default]
    Text,
    /// Newline-delimited JSON objects
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(Error::config("log_format", s, "expected text or json")),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

impl TryFrom<String> for LogFormat {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LogFormat> for String {
    fn from(format: LogFormat) -> Self {
        format.as_str().to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra filter directives, e.g. `teapot::session=debug`
    pub directives: Vec<String>,
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Parse a JSON document such as `{"level": "debug", "format": "json"}`
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(level) = value.get("level").and_then(|v| v.as_str()) {
            level.parse::<LogLevel>()?;
        }
        if let Some(format) = value.get("format").and_then(|v| v.as_str()) {
            format.parse::<LogFormat>()?;
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Read [`LOG_ENV`] and [`LOG_FORMAT_ENV`].
    ///
    /// A level name in [`LOG_ENV`] sets the level, anything else is kept
    /// as a filter directive. Unset variables keep the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var(LOG_ENV) {
            config.apply_filter(&value)?;
        }
        if let Ok(value) = env::var(LOG_FORMAT_ENV) {
            config.format = value.parse()?;
        }

        Ok(config)
    }

    fn apply_filter(&mut self, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        if let Ok(level) = value.parse() {
            self.level = level;
            return Ok(());
        }

        for directive in value.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            if !directive.contains('=') {
                return Err(Error::config(
                    "log_filter",
                    directive,
                    "expected a level or target=level",
                ));
            }
            self.directives.push(directive.to_string());
        }
        Ok(())
    }

    /// Build the env filter for this configuration
    pub fn filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::new(self.level.as_str());
        for directive in &self.directives {
            let parsed = directive
                .parse()
                .map_err(|e| Error::config("log_filter", directive.as_str(), format!("{}", e)))?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Install a global `tracing` subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = config.filter()?;

    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
    };

    installed.map_err(|e| Error::other(format!("failed to install subscriber: {}", e)))
}
