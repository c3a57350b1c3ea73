// Configuration loading and parsing (league.toml, strategy.toml, credentials.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use draftline_core::draft::identity::TeamResolver;
use draftline_core::draft::ledger::{DraftLedger, MAX_TEAMS, MIN_LEAGUE_SIZE};
use draftline_llm::LlmSettings;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub credentials: CredentialsConfig,
    /// Directory relative paths in the config resolve against.
    pub base_dir: PathBuf,
}

impl Config {
    /// A fresh ledger with the configured size, user team and aliases.
    pub fn new_ledger(&self) -> DraftLedger {
        let resolver = TeamResolver::new(
            self.league
                .team_aliases
                .iter()
                .map(|(name, id)| (name.clone(), *id)),
        );
        DraftLedger::with_config(self.league.league_size, self.league.user_team, resolver)
            // validate() already range-checked both values.
            .unwrap_or_default()
    }

    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub league_size: u32,
    pub user_team: u32,
    /// Team names pinned to a draft team number. Replaces the built-in table.
    #[serde(default)]
    pub team_aliases: HashMap<String, u32>,
    /// `name,position,team` CSV replacing the bundled player pool.
    #[serde(default)]
    pub players_csv: Option<String>,
    /// `name,tier` CSV replacing the bundled tier lists.
    #[serde(default)]
    pub tiers_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    #[serde(default)]
    llm: LlmSettings,
    #[serde(default)]
    trades: TradeSettings,
}

#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub llm: LlmSettings,
    pub trades: TradeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeSettings {
    #[serde(default = "default_viability_threshold")]
    pub viability_threshold: f64,
}

impl Default for TradeSettings {
    fn default() -> Self {
        TradeSettings {
            viability_threshold: default_viability_threshold(),
        }
    }
}

fn default_viability_threshold() -> f64 {
    draftline_core::trade::compatibility::VIABILITY_THRESHOLD
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/league.toml`, `config/strategy.toml` and the
/// optional `config/credentials.toml` under `base_dir`. Does not copy
/// defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_file: LeagueFile = parse_file(&league_path)?;

    let strategy_path = config_dir.join("strategy.toml");
    let strategy_file: StrategyFile = parse_file(&strategy_path)?;

    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        parse_file(&credentials_path)?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        league: league_file.league,
        strategy: StrategyConfig {
            llm: strategy_file.llm,
            trades: strategy_file.trades,
        },
        credentials,
        base_dir: base_dir.to_path_buf(),
    };

    validate(&config)?;
    Ok(config)
}

/// Config files seeded from `defaults/`. Credentials are never copied; the
/// `.example` template stays where it is.
const SEEDED_FILES: &[&str] = &["league.toml", "strategy.toml"];

/// Copy any missing seeded file from `defaults/` into `config/`.
///
/// Existing files are never overwritten. Returns the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "no defaults/ or config/ directory under {}",
            base_dir.display()
        )));
    }
    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut written = Vec::new();
    for name in SEEDED_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| {
            copy_error(format!("cannot seed {}: {e}", target.display()))
        })?;
        info!("Seeded {} from defaults", target.display());
        written.push(target);
    }
    Ok(written)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Where config lives: the working directory when it holds `config/` or
/// `defaults/`, otherwise the platform config directory.
pub fn resolve_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        return Ok(cwd);
    }
    Ok(ProjectDirs::from("", "", "draftline")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or(cwd))
}

/// Resolve the base directory, copy defaults, load and validate.
pub fn load_config() -> Result<Config, ConfigError> {
    let base = resolve_base_dir()?;
    ensure_config_files(&base)?;
    load_config_from(&base)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn validation(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if !(MIN_LEAGUE_SIZE..=MAX_TEAMS).contains(&league.league_size) {
        return Err(validation(
            "league.league_size",
            format!(
                "must be between {MIN_LEAGUE_SIZE} and {MAX_TEAMS}, got {}",
                league.league_size
            ),
        ));
    }
    if !(1..=MAX_TEAMS).contains(&league.user_team) {
        return Err(validation(
            "league.user_team",
            format!("must be between 1 and {MAX_TEAMS}, got {}", league.user_team),
        ));
    }
    for (name, id) in &league.team_aliases {
        if !(1..=MAX_TEAMS).contains(id) {
            return Err(validation(
                &format!("league.team_aliases.{name}"),
                format!("must be between 1 and {MAX_TEAMS}, got {id}"),
            ));
        }
    }

    let llm = &config.strategy.llm;
    if llm.model.trim().is_empty() {
        return Err(validation("llm.model", "must not be empty"));
    }
    if llm.max_tokens == 0 {
        return Err(validation("llm.max_tokens", "must be > 0"));
    }
    if llm.timeout_secs == 0 {
        return Err(validation("llm.timeout_secs", "must be > 0"));
    }

    let threshold = config.strategy.trades.viability_threshold;
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(validation(
            "trades.viability_threshold",
            format!("must be a non-negative number, got {threshold}"),
        ));
    }

    Ok(())
}
