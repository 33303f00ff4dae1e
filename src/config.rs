//! Campaign configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! command-line overrides. The result is validated once before any request is
//! sent.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::params::{DataFormat, Datastore, Operation, TestKind, TxType};

/// Default benchmark host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default RESTCONF port.
pub const DEFAULT_PORT: u16 = 8181;
/// Default basic-auth user and password.
pub const DEFAULT_CREDENTIAL: &str = "admin";
/// Default report file name.
pub const DEFAULT_OUTPUT: &str = "test.csv";

const DEFAULT_TOTAL_ELEMENTS: u64 = 100_000;
const DEFAULT_SHAPES: [u64; 6] = [1, 10, 100, 1_000, 10_000, 100_000];
const DEFAULT_WARMUP_RUNS: u32 = 10;
const DEFAULT_MEASURED_RUNS: u32 = 10;

/// Where and how to reach the benchmark service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Per-request timeout; `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: DEFAULT_CREDENTIAL.to_string(),
            password: DEFAULT_CREDENTIAL.to_string(),
            timeout: None,
        }
    }
}

impl TargetConfig {
    /// RESTCONF root, e.g. `http://localhost:8181/restconf/`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/restconf/", self.host, self.port)
    }

    /// Applies every override that is set.
    pub fn apply(&mut self, overrides: &TargetOverrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(username) = &overrides.username {
            self.username = username.clone();
        }
        if let Some(password) = &overrides.password {
            self.password = password.clone();
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
    }

    /// Rejects settings no request could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be non-zero".into(),
            });
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// The parameter matrix of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Transaction types to sweep.
    pub tx_types: Vec<TxType>,
    /// Total element budget shared by outer and inner lists.
    pub total_elements: u64,
    /// Inner list sizes for the `DATA-FORMAT` test.
    pub inner_elements: Vec<u64>,
    /// Operations per transaction for the `OPS-PER-TX` test.
    pub ops_per_tx: Vec<u64>,
    /// Operations to sweep.
    pub operations: Vec<Operation>,
    /// Data formats to sweep.
    pub data_formats: Vec<DataFormat>,
    /// Tests to run.
    pub tests: Vec<TestKind>,
    /// Datastores to sweep.
    pub datastores: Vec<Datastore>,
    /// Discarded runs before measuring each combination.
    pub warmup_runs: u32,
    /// Measured runs per combination.
    pub measured_runs: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            tx_types: TxType::ALL.to_vec(),
            total_elements: DEFAULT_TOTAL_ELEMENTS,
            inner_elements: DEFAULT_SHAPES.to_vec(),
            ops_per_tx: DEFAULT_SHAPES.to_vec(),
            operations: Operation::ALL.to_vec(),
            data_formats: DataFormat::ALL.to_vec(),
            tests: TestKind::ALL.to_vec(),
            datastores: Datastore::ALL.to_vec(),
            warmup_runs: DEFAULT_WARMUP_RUNS,
            measured_runs: DEFAULT_MEASURED_RUNS,
        }
    }
}

impl SweepConfig {
    /// Applies every override that is set. Empty lists count as unset.
    pub fn apply(&mut self, overrides: &SweepOverrides) {
        replace_list(&mut self.tx_types, &overrides.tx_types);
        replace_list(&mut self.inner_elements, &overrides.inner_elements);
        replace_list(&mut self.ops_per_tx, &overrides.ops_per_tx);
        replace_list(&mut self.operations, &overrides.operations);
        replace_list(&mut self.data_formats, &overrides.data_formats);
        replace_list(&mut self.tests, &overrides.tests);
        replace_list(&mut self.datastores, &overrides.datastores);
        if let Some(total) = overrides.total_elements {
            self.total_elements = total;
        }
        if let Some(warmup) = overrides.warmup_runs {
            self.warmup_runs = warmup;
        }
        if let Some(runs) = overrides.measured_runs {
            self.measured_runs = runs;
        }
    }

    /// Checks the invariants the sweep relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_elements == 0 {
            return Err(ConfigError::Invalid {
                field: "total",
                reason: "must be positive".into(),
            });
        }
        if self.measured_runs == 0 {
            return Err(ConfigError::Invalid {
                field: "runs",
                reason: "at least one measured run is required".into(),
            });
        }
        if let Some(zero) = self.inner_elements.iter().position(|&n| n == 0) {
            return Err(ConfigError::Invalid {
                field: "inner",
                reason: format!("entry {zero} is zero"),
            });
        }
        if let Some(zero) = self.ops_per_tx.iter().position(|&n| n == 0) {
            return Err(ConfigError::Invalid {
                field: "ops",
                reason: format!("entry {zero} is zero"),
            });
        }
        if let Some(&inner) = self
            .inner_elements
            .iter()
            .find(|&&inner| inner > self.total_elements)
        {
            return Err(ConfigError::Invalid {
                field: "inner",
                reason: format!(
                    "{inner} exceeds the total element budget {}",
                    self.total_elements
                ),
            });
        }
        Ok(())
    }

    /// Number of `start-test` calls the campaign will issue.
    pub fn planned_requests(&self) -> u64 {
        let categorical = (self.tx_types.len()
            * self.data_formats.len()
            * self.operations.len()
            * self.datastores.len()) as u64;
        let per_combination = u64::from(self.warmup_runs) + u64::from(self.measured_runs);
        let leaves: u64 = self
            .tests
            .iter()
            .map(|kind| match kind {
                TestKind::DataFormat => self.inner_elements.len() as u64,
                TestKind::OpsPerTx => self.ops_per_tx.len() as u64,
            })
            .sum();
        categorical * leaves * per_combination
    }
}

fn replace_list<T: Clone>(target: &mut Vec<T>, source: &Option<Vec<T>>) {
    if let Some(values) = source.as_ref().filter(|values| !values.is_empty()) {
        *target = values.clone();
    }
}

/// Optional target settings from the config file or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetOverrides {
    /// Host override.
    pub host: Option<String>,
    /// Port override.
    pub port: Option<u16>,
    /// User override.
    pub username: Option<String>,
    /// Password override.
    pub password: Option<String>,
    /// Request timeout override in seconds.
    pub timeout_secs: Option<u64>,
}

/// Optional sweep settings from the config file or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepOverrides {
    /// Transaction types.
    #[serde(rename = "txtype")]
    pub tx_types: Option<Vec<TxType>>,
    /// Total element budget.
    #[serde(rename = "total")]
    pub total_elements: Option<u64>,
    /// Inner list sizes.
    #[serde(rename = "inner")]
    pub inner_elements: Option<Vec<u64>>,
    /// Operations per transaction.
    #[serde(rename = "ops")]
    pub ops_per_tx: Option<Vec<u64>>,
    /// Operations.
    #[serde(rename = "optype")]
    pub operations: Option<Vec<Operation>>,
    /// Data formats.
    #[serde(rename = "format")]
    pub data_formats: Option<Vec<DataFormat>>,
    /// Tests to run.
    #[serde(rename = "test")]
    pub tests: Option<Vec<TestKind>>,
    /// Datastores.
    #[serde(rename = "datastore")]
    pub datastores: Option<Vec<Datastore>>,
    /// Warmup runs.
    #[serde(rename = "warmup")]
    pub warmup_runs: Option<u32>,
    /// Measured runs.
    #[serde(rename = "runs")]
    pub measured_runs: Option<u32>,
}

/// Contents of a `dsbench` TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `[target]` table.
    #[serde(default)]
    pub target: TargetOverrides,
    /// `[sweep]` table.
    #[serde(default)]
    pub sweep: SweepOverrides,
    /// Report path.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl FileConfig {
    /// Loads the explicit path, or the default path when it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => read_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `<config dir>/dsbench/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("dsbench").join("config.toml"))
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this tool.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// A setting failed validation.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Setting name as spelled on the command line.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
