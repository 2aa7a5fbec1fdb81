//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use download_broker::broker::{BrokerConfig, ModifierKey};
use download_broker::{AttributeScope, ManagerConfig};

/// TOML-backed file configuration for broker defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Manager port on loopback.
    pub port: Option<u16>,
    /// Connect timeout for manager requests in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Overall timeout for manager requests in seconds.
    pub request_timeout_secs: Option<u64>,
    /// How long inline link feedback stays, in milliseconds.
    pub feedback_revert_ms: Option<u64>,
    /// Modifier key that bypasses the broker on click.
    pub override_modifier: Option<ModifierKey>,
    /// Where download attributes are looked for.
    pub attribute_scope: Option<AttributeScope>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        if let Some(ms) = self.feedback_revert_ms
            && ms > 60_000
        {
            bail!("Invalid config value for `feedback_revert_ms`: {ms}. Expected range: 0..=60000");
        }
        Ok(())
    }

    /// Builds the manager settings; `port_override` (from the CLI) wins.
    #[must_use]
    pub fn manager_config(&self, port_override: Option<u16>) -> ManagerConfig {
        let defaults = ManagerConfig::default();
        ManagerConfig {
            port: port_override.or(self.port).unwrap_or(defaults.port),
            connect_timeout: self
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            request_timeout: self
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
        }
    }

    /// Builds the watcher settings.
    #[must_use]
    pub fn broker_config(&self) -> BrokerConfig {
        let defaults = BrokerConfig::default();
        BrokerConfig {
            override_modifier: self.override_modifier.unwrap_or(defaults.override_modifier),
            attribute_scope: self.attribute_scope.unwrap_or(defaults.attribute_scope),
            feedback_revert_after: self
                .feedback_revert_ms
                .map_or(defaults.feedback_revert_after, Duration::from_millis),
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=300).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=300");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing filter directive for this setting.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if one is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: FileConfig,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/download-broker/config.toml`
/// 2. `$HOME/.config/download-broker/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("download-broker")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("download-broker")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` (which must exist) or from the default path
/// if a file is present there.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            ..LoadedConfig::default()
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "port" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `port` value on line {line_no}"))?;
                let port = u16::try_from(parsed)
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid config value for `port`: {parsed}. Expected range: 1..=65535"
                        )
                    })?;
                cfg.port = Some(port);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "request_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `request_timeout_secs` value on line {line_no}")
                })?;
                cfg.request_timeout_secs = Some(parsed);
            }
            "feedback_revert_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `feedback_revert_ms` value on line {line_no}")
                })?;
                cfg.feedback_revert_ms = Some(parsed);
            }
            "override_modifier" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `override_modifier` value on line {line_no}")
                })?;
                cfg.override_modifier = Some(
                    parsed
                        .parse::<ModifierKey>()
                        .map_err(anyhow::Error::msg)
                        .with_context(|| {
                            format!("Invalid `override_modifier` value on line {line_no}")
                        })?,
                );
            }
            "attribute_scope" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `attribute_scope` value on line {line_no}")
                })?;
                cfg.attribute_scope = Some(
                    parsed
                        .parse::<AttributeScope>()
                        .map_err(anyhow::Error::msg)
                        .with_context(|| {
                            format!("Invalid `attribute_scope` value on line {line_no}")
                        })?,
                );
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Values are bare integers or quoted words, so `#` always starts a comment.
fn strip_inline_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::to_string)
        .context("Expected double-quoted string")
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    raw_value
        .parse::<u64>()
        .context("Expected non-negative integer")
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
