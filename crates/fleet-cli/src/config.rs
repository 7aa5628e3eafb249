//! Planner configuration
//!
//! Read from `--config FILE`, else `~/.fleetplan/config.toml` if it exists,
//! else built-in defaults. Command-line flags override file values.
//!
//! ```toml
//! [data]
//! dir = "Dataset"
//! vehicles = "vehicles.csv"
//!
//! [horizon]
//! start = 2023
//! end = 2038
//!
//! [solver]
//! backend = "highs"          # "microlp" without the solver-highs feature
//! integrality_tolerance = 1e-6
//! max_time_seconds = 300
//! mip_gap = 1e-4
//!
//! [planning]
//! strict_coverage = false
//! parallel_precompute = true
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Context, Result};
use fleet_algo::{
    MilpSolverKind, PlannerConfig, DEFAULT_INTEGRALITY_TOLERANCE, DEFAULT_MAX_TIME_SECONDS,
    DEFAULT_MIP_GAP,
};
use fleet_core::horizon::{DEFAULT_END_YEAR, DEFAULT_START_YEAR};
use fleet_core::{PlanningHorizon, Year};
use fleet_io::TableFiles;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FleetConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub horizon: HorizonConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input directory and table file names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(flatten)]
    pub files: TableFiles,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            files: TableFiles::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("Dataset")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HorizonConfig {
    #[serde(default = "default_start")]
    pub start: Year,
    #[serde(default = "default_end")]
    pub end: Year,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
        }
    }
}

fn default_start() -> Year {
    DEFAULT_START_YEAR
}

fn default_end() -> Year {
    DEFAULT_END_YEAR
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// MILP backend name
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_integrality_tolerance")]
    pub integrality_tolerance: f64,
    /// Wall-clock limit for one solve (seconds)
    #[serde(default = "default_max_time_seconds")]
    pub max_time_seconds: f64,
    /// Relative MIP gap at which the search stops
    #[serde(default = "default_mip_gap")]
    pub mip_gap: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            integrality_tolerance: default_integrality_tolerance(),
            max_time_seconds: default_max_time_seconds(),
            mip_gap: default_mip_gap(),
        }
    }
}

fn default_backend() -> String {
    MilpSolverKind::default().as_str().to_string()
}

fn default_integrality_tolerance() -> f64 {
    DEFAULT_INTEGRALITY_TOLERANCE
}

fn default_max_time_seconds() -> f64 {
    DEFAULT_MAX_TIME_SECONDS
}

fn default_mip_gap() -> f64 {
    DEFAULT_MIP_GAP
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanningConfig {
    #[serde(default)]
    pub strict_coverage: bool,
    #[serde(default = "default_true")]
    pub parallel_precompute: bool,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            strict_coverage: false,
            parallel_precompute: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FleetConfig {
    /// Horizon from the config, with optional overrides.
    pub fn horizon(&self, start: Option<Year>, end: Option<Year>) -> Result<PlanningHorizon> {
        let horizon = PlanningHorizon::new(
            start.unwrap_or(self.horizon.start),
            end.unwrap_or(self.horizon.end),
        )?;
        Ok(horizon)
    }

    pub fn data_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .unwrap_or_else(|| self.data.dir.clone())
    }

    /// Planner settings, with optional overrides.
    pub fn planner(
        &self,
        solver: Option<&str>,
        strict_coverage: bool,
        time_limit: Option<f64>,
    ) -> Result<PlannerConfig> {
        let solver = solver.unwrap_or(self.solver.backend.as_str()).parse::<MilpSolverKind>()?;
        if !(self.solver.integrality_tolerance > 0.0 && self.solver.integrality_tolerance < 0.5) {
            return Err(anyhow!(
                "integrality_tolerance must lie in (0, 0.5), got {}",
                self.solver.integrality_tolerance
            ));
        }
        let max_time_seconds = time_limit.unwrap_or(self.solver.max_time_seconds);
        if !(max_time_seconds.is_finite() && max_time_seconds > 0.0) {
            return Err(anyhow!(
                "max_time_seconds must be positive, got {}",
                max_time_seconds
            ));
        }
        if !(self.solver.mip_gap.is_finite() && self.solver.mip_gap >= 0.0) {
            return Err(anyhow!(
                "mip_gap must be non-negative, got {}",
                self.solver.mip_gap
            ));
        }
        Ok(PlannerConfig {
            solver,
            integrality_tolerance: self.solver.integrality_tolerance,
            strict_coverage: strict_coverage || self.planning.strict_coverage,
            max_time_seconds,
            mip_gap: self.solver.mip_gap,
        })
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow!("invalid log level '{}'", self.logging.level))
    }
}

/// `~/.fleetplan`
pub fn fleet_home() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".fleetplan"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(fleet_home()?.join("config.toml"))
}

pub fn parse_config(contents: &str) -> Result<FleetConfig> {
    Ok(toml::from_str(contents)?)
}

/// Load the configuration. An explicit path must exist; the default one may not.
pub fn load_config(path: Option<&Path>) -> Result<FleetConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(FleetConfig::default()),
        },
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config file {}", path.display()))
}
