use pursuit_bot::{CommandProvider, CommandProviderOptions, EngineConfig};
use pursuit_core::game::{GameSetup, RevealSchedule};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const DEFAULT_DETECTIVES: usize = 4;
const DEFAULT_MAX_CULPRIT_TURNS: u32 = 24;
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 5_000;
const MAX_DETECTIVES: usize = 8;
const MAX_TRIALS: usize = 200;
const MAX_DEPTH: usize = 8;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub games: GamesConfig,
    /// JSON map definition; the bundled demo map when unset.
    #[serde(default)]
    pub map: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.games.validate()?;
        self.engine.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_providers(&self.providers)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// How many games to deal and with which rules.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_detectives")]
    pub detectives: usize,
    #[serde(default = "default_max_culprit_turns")]
    pub max_culprit_turns: u32,
    /// Reveal turns; the standard schedule when omitted.
    #[serde(default)]
    pub reveal_turns: Option<Vec<u32>>,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "games.count".to_string(),
                message: "number of games must be greater than zero".to_string(),
            });
        }

        if self.detectives == 0 || self.detectives > MAX_DETECTIVES {
            return Err(ValidationError::InvalidField {
                field: "games.detectives".to_string(),
                message: format!("detectives must be between 1 and {MAX_DETECTIVES}"),
            });
        }

        if self.max_culprit_turns == 0 {
            return Err(ValidationError::InvalidField {
                field: "games.max_culprit_turns".to_string(),
                message: "culprit needs at least one turn".to_string(),
            });
        }

        if let Some(turns) = &self.reveal_turns
            && turns.iter().any(|turn| *turn == 0 || *turn > self.max_culprit_turns)
        {
            return Err(ValidationError::InvalidField {
                field: "games.reveal_turns".to_string(),
                message: format!("reveal turns must lie in 1..={}", self.max_culprit_turns),
            });
        }

        Ok(())
    }

    /// Setup shared by every game of the run; all players are AI-driven.
    pub fn setup(&self) -> GameSetup {
        GameSetup {
            detectives: self.detectives,
            culprit_ai: true,
            detectives_ai: true,
            reveal: self
                .reveal_turns
                .clone()
                .map(RevealSchedule::new)
                .unwrap_or_default(),
            max_culprit_turns: self.max_culprit_turns,
        }
    }
}

fn default_detectives() -> usize {
    DEFAULT_DETECTIVES
}

fn default_max_culprit_turns() -> u32 {
    DEFAULT_MAX_CULPRIT_TURNS
}

/// Engine knobs; anything left out keeps the engine default.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub simulation: Option<bool>,
    pub trials: Option<usize>,
    pub depth: Option<usize>,
    pub threads: Option<usize>,
    pub simulation_seed: Option<u64>,
    pub coordination: Option<bool>,
    pub history_window: Option<usize>,
}

impl EngineSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(trials) = self.trials
            && !(1..=MAX_TRIALS).contains(&trials)
        {
            return Err(ValidationError::InvalidField {
                field: "engine.trials".to_string(),
                message: format!("trials must be between 1 and {MAX_TRIALS}"),
            });
        }

        if let Some(depth) = self.depth
            && !(1..=MAX_DEPTH).contains(&depth)
        {
            return Err(ValidationError::InvalidField {
                field: "engine.depth".to_string(),
                message: format!("depth must be between 1 and {MAX_DEPTH}"),
            });
        }

        if self.history_window == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "engine.history_window".to_string(),
                message: "history window must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Engine configuration built from defaults, never from the environment,
    /// so that a run is reproducible from its YAML alone.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(enabled) = self.simulation {
            config.simulation.enabled = enabled;
        }
        if let Some(trials) = self.trials {
            config.simulation.trials = trials;
        }
        if let Some(depth) = self.depth {
            config.simulation.depth = depth;
        }
        if let Some(threads) = self.threads {
            config.simulation.threads = threads;
        }
        if let Some(seed) = self.simulation_seed {
            config.simulation.seed = seed;
        }
        if let Some(coordination) = self.coordination {
            config.coordination = coordination;
        }
        if let Some(window) = self.history_window {
            config.history_window = window;
        }
        config
    }
}

/// External reasoning provider, consulted in list order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub credential_env: Option<String>,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

impl ProviderConfig {
    pub fn build(&self) -> CommandProvider {
        CommandProvider::new(
            self.name.clone(),
            CommandProviderOptions {
                command: self.command.clone(),
                args: self.args.clone(),
                working_dir: self.working_dir.clone(),
                credential_env: self.credential_env.clone(),
                timeout: Duration::from_millis(self.timeout_ms),
            },
        )
    }
}

fn default_provider_timeout_ms() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_MS
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_providers(providers: &[ProviderConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for provider in providers {
        if provider.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "providers.name".to_string(),
                message: "provider name must not be empty".to_string(),
            });
        }

        if !provider.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("providers[{}].name", provider.name),
                message: "provider name contains invalid characters".to_string(),
            });
        }

        if provider.command.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: format!("providers[{}].command", provider.name),
                message: "command must not be empty".to_string(),
            });
        }

        if provider.timeout_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: format!("providers[{}].timeout_ms", provider.name),
                message: "timeout must be greater than zero".to_string(),
            });
        }

        if !seen.insert(provider.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "providers".to_string(),
                message: format!("provider name '{}' defined more than once", provider.name),
            });
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

impl ResolvedOutputs {
    /// Structured telemetry sits next to the summary.
    pub fn telemetry_dir(&self) -> PathBuf {
        self.summary_md
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
