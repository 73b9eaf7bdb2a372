use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{oracle::types::OracleConfig, orchestrator::OrchestratorLimits};

const SCHEMA_FILE_NAME: &str = "lifeline.schema.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub oracle: OracleConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorLimits,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Unix socket the NDJSON server binds to.
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("lifeline.sock"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    #[default]
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    /// `EnvFilter` directives, e.g. `info,oracle=debug`.
    pub filter: String,
    pub rotation: LoggingRotation,
    /// Log files older than this many days are purged at startup.
    pub retention_days: usize,
    /// Mirrors WARN and above to stderr.
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs/lifeline"),
            filter: "info".to_string(),
            rotation: LoggingRotation::Daily,
            retention_days: 14,
            stderr_warn_enabled: true,
        }
    }
}

impl Config {
    /// Reads a JSON5 config, checks it against the schema, then resolves relative paths
    /// against the directory holding the config file.
    pub fn load(config_path: &Path) -> Result<Self> {
        let document = read_document(config_path)?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        check_schema(&document, &schema_for(base_dir, &document)?)?;

        let mut config: Config =
            serde_json::from_value(document).context("config does not match lifeline settings")?;
        config
            .orchestrator
            .validate()
            .context("invalid orchestrator limits")?;

        config.server.socket_path = anchored(base_dir, &config.server.socket_path);
        config.oracle.few_shot_path = config
            .oracle
            .few_shot_path
            .as_deref()
            .map(|path| anchored(base_dir, path));
        Ok(config)
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    json5::from_str(&text).with_context(|| format!("{} is not valid JSON5", path.display()))
}

/// `$schema` from the document when present, else the schema file beside the config.
fn schema_for(base_dir: &Path, document: &Value) -> Result<PathBuf> {
    match document.get("$schema").and_then(Value::as_str) {
        Some(declared) => Ok(anchored(base_dir, Path::new(declared))),
        None => {
            let beside = base_dir.join(SCHEMA_FILE_NAME);
            if !beside.exists() {
                bail!("no $schema in config and no {SCHEMA_FILE_NAME} in {}", base_dir.display());
            }
            Ok(beside)
        }
    }
}

fn check_schema(document: &Value, schema_path: &Path) -> Result<()> {
    let schema_text = fs::read_to_string(schema_path)
        .with_context(|| format!("unable to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_text)
        .with_context(|| format!("schema {} is not valid JSON", schema_path.display()))?;
    let validator = JSONSchema::compile(&schema)
        .map_err(|err| anyhow::anyhow!("schema {} does not compile: {err}", schema_path.display()))?;

    if let Err(errors) = validator.validate(document) {
        let problems = errors
            .map(|error| format!("{}: {error}", error.instance_path))
            .collect::<Vec<_>>();
        bail!("config validation failed: {}", problems.join("; "));
    }
    Ok(())
}

fn anchored(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
