//! Layered run configuration.
//!
//! Settings are merged with figment from three layers, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. Environment variables prefixed with `HARDLINK_`
//!    (`HARDLINK_DRY_RUN=true`, `HARDLINK_THREADS=4`, `HARDLINK_POLICY=maximize`)
//! 3. Command-line flags that were actually given
//!
//! `HARDLINK_INCLUDE` and `HARDLINK_EXCLUDE` take either one pattern
//! (`HARDLINK_EXCLUDE='\.tmp$'`) or a figment array
//! (`HARDLINK_EXCLUDE='[\.tmp$, ~$]'`).
//!
//! No configuration file is read.

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::linker::{LinkPolicy, ReducerConfig};
use crate::scanner::{FingerprintConfig, PathFilter, PatternError, WalkerConfig};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "HARDLINK_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be parsed into [`Settings`].
    #[error("invalid configuration")]
    Extract(#[from] Box<figment::Error>),

    /// A value was parsed but is out of range.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// An include or exclude pattern does not compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Every knob that influences a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Report links without touching the filesystem.
    pub dry_run: bool,
    /// Require identical basenames.
    pub respect_name: bool,
    /// Require identical permission bits.
    pub respect_mode: bool,
    /// Require identical uid and gid.
    pub respect_owner: bool,
    /// Require identical modification times.
    pub respect_time: bool,
    /// Master selection policy.
    pub policy: LinkPolicy,
    /// Worker threads for bucket reduction.
    pub threads: usize,
    /// Include patterns.
    #[serde(deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    /// Exclude patterns.
    #[serde(deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}

impl Default for Settings {
    fn default() -> Self {
        let fingerprint = FingerprintConfig::default();
        Self {
            dry_run: false,
            respect_name: fingerprint.respect_name,
            respect_mode: fingerprint.respect_mode,
            respect_owner: fingerprint.respect_owner,
            respect_time: fingerprint.respect_time,
            policy: LinkPolicy::First,
            threads: 1,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// The subset of [`Settings`] the command line actually set.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    respect_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    respect_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    respect_owner: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    respect_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy: Option<LinkPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threads: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclude: Vec<String>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        let set = |flag: bool, value: bool| flag.then_some(value);

        let mut overrides = Self {
            dry_run: set(cli.dry_run, true),
            respect_name: set(cli.respect_name, true),
            respect_mode: set(cli.ignore_mode, false),
            respect_owner: set(cli.ignore_owner, false),
            respect_time: set(cli.ignore_time, false),
            policy: if cli.maximize {
                Some(LinkPolicy::Maximize)
            } else if cli.minimize {
                Some(LinkPolicy::Minimize)
            } else {
                None
            },
            threads: cli.threads,
            include: cli.include.clone(),
            exclude: cli.exclude.clone(),
        };

        if cli.content_only {
            overrides.respect_name = Some(false);
            overrides.respect_mode = Some(false);
            overrides.respect_owner = Some(false);
            overrides.respect_time = Some(false);
        }
        overrides
    }
}

impl Settings {
    /// Defaults merged with `HARDLINK_*` environment variables.
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the layered settings for a parsed command line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an environment value does not parse or a
    /// value is out of range.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(), cli)
    }

    /// Merge `cli` over an existing figment and extract.
    ///
    /// # Errors
    ///
    /// See [`Settings::load`].
    pub fn from_figment(figment: Figment, cli: &Cli) -> Result<Self, ConfigError> {
        let settings: Settings = figment
            .merge(Serialized::defaults(CliOverrides::from(cli)))
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid {
                key: "threads",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Which attributes take part in the fingerprint.
    #[must_use]
    pub fn fingerprint_config(&self) -> FingerprintConfig {
        FingerprintConfig {
            respect_mode: self.respect_mode,
            respect_owner: self.respect_owner,
            respect_name: self.respect_name,
            respect_time: self.respect_time,
        }
    }

    /// Walker configuration with compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pattern`] for the first pattern that does not
    /// compile.
    pub fn walker_config(&self) -> Result<WalkerConfig, ConfigError> {
        let filter = PathFilter::new(&self.include, &self.exclude)?;
        Ok(WalkerConfig::new(self.fingerprint_config(), filter))
    }

    /// Reducer configuration without shutdown flag or progress callback.
    #[must_use]
    pub fn reducer_config(&self) -> ReducerConfig {
        ReducerConfig::default()
            .with_policy(self.policy)
            .with_dry_run(self.dry_run)
            .with_threads(self.threads)
    }
}
