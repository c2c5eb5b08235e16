use crate::error::{CliError, Result};
use nanorelax::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_MAX_STEPS: usize = 1000;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "method")]
enum PartialClusteringConfig {
    Filters {
        filters: Vec<String>,
    },
    Dbscan {
        #[serde(rename = "neighbour-radius")]
        neighbour_radius: f64,
        #[serde(rename = "min-points")]
        min_points: usize,
    },
}

impl From<PartialClusteringConfig> for core_config::ClusteringConfig {
    fn from(p: PartialClusteringConfig) -> Self {
        match p {
            PartialClusteringConfig::Filters { filters } => Self::Filters { filters },
            PartialClusteringConfig::Dbscan {
                neighbour_radius,
                min_points,
            } => Self::Dbscan {
                neighbour_radius,
                min_points,
            },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialJointConfig {
    #[serde(rename = "target-bond-length")]
    target_bond_length: Option<f64>,
    #[serde(rename = "spring-constant")]
    spring_constant: Option<f64>,
    #[serde(rename = "break-force")]
    break_force: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSimulatorConfig {
    #[serde(rename = "time-step")]
    time_step: Option<f64>,
    #[serde(rename = "collision-resolution-multiplier")]
    collision_resolution_multiplier: Option<f64>,
    friction: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialConvergenceConfig {
    #[serde(rename = "force-threshold")]
    force_threshold: Option<f64>,
    patience: Option<usize>,
}

/// Relaxation settings as read from a TOML file, before command-line
/// overrides are applied.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRelaxConfig {
    #[serde(rename = "max-steps")]
    max_steps: Option<usize>,
    #[serde(rename = "frame-delta")]
    frame_delta: Option<f64>,
    #[serde(rename = "explosion-strength")]
    explosion_strength: Option<f64>,
    clustering: Option<PartialClusteringConfig>,
    joints: Option<PartialJointConfig>,
    simulator: Option<PartialSimulatorConfig>,
    convergence: Option<PartialConvergenceConfig>,
}

/// Values given directly on the command line; each one wins over the file.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub max_steps: Option<usize>,
    pub time_step: Option<f64>,
    pub explosion_strength: Option<f64>,
    pub filters: &'a [String],
    pub set_values: &'a [String],
}

impl PartialRelaxConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads the file when one is given, otherwise starts from an empty
    /// configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(mut self, overrides: &Overrides) -> Result<core_config::RelaxConfig> {
        self.apply_set_values(overrides.set_values)?;

        let clustering = if !overrides.filters.is_empty() {
            debug!(
                "Using {} filter(s) from the command line for clustering.",
                overrides.filters.len()
            );
            core_config::ClusteringConfig::Filters {
                filters: overrides.filters.to_vec(),
            }
        } else {
            self.clustering
                .take()
                .ok_or_else(|| {
                    CliError::Config(
                        "A `[clustering]` section or at least one --filter is required."
                            .to_string(),
                    )
                })?
                .into()
        };

        let joints = Self::merge_joints(self.joints.take());
        let simulator = Self::merge_simulator(self.simulator.take(), overrides.time_step);

        let mut builder = core_config::RelaxConfigBuilder::new()
            .clustering(clustering)
            .joints(joints)
            .simulator(simulator)
            .max_steps(
                overrides
                    .max_steps
                    .or(self.max_steps)
                    .unwrap_or(DEFAULT_MAX_STEPS),
            );

        if let Some(delta) = self.frame_delta {
            builder = builder.frame_delta(delta);
        }
        if let Some(strength) = overrides.explosion_strength.or(self.explosion_strength) {
            builder = builder.explosion_strength(strength);
        }
        if let Some(convergence) = Self::merge_convergence(self.convergence.take())? {
            builder = builder.convergence(convergence);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_joints(partial: Option<PartialJointConfig>) -> core_config::JointConfig {
        let partial = partial.unwrap_or_default();
        let defaults = core_config::JointConfig::default();
        core_config::JointConfig {
            target_bond_length: partial
                .target_bond_length
                .unwrap_or(defaults.target_bond_length),
            spring_constant: partial.spring_constant.unwrap_or(defaults.spring_constant),
            break_force: partial.break_force,
        }
    }

    fn merge_simulator(
        partial: Option<PartialSimulatorConfig>,
        cli_time_step: Option<f64>,
    ) -> core_config::SimulatorConfig {
        let partial = partial.unwrap_or_default();
        let defaults = core_config::SimulatorConfig::default();
        core_config::SimulatorConfig {
            time_step: cli_time_step
                .or(partial.time_step)
                .unwrap_or(defaults.time_step),
            collision_resolution_multiplier: partial
                .collision_resolution_multiplier
                .unwrap_or(defaults.collision_resolution_multiplier),
            friction: partial.friction.unwrap_or(defaults.friction),
        }
    }

    fn merge_convergence(
        partial: Option<PartialConvergenceConfig>,
    ) -> Result<Option<core_config::ConvergenceConfig>> {
        let Some(p) = partial else {
            return Ok(None);
        };
        Ok(Some(core_config::ConvergenceConfig {
            force_threshold: p.force_threshold.ok_or_else(|| {
                CliError::Config("`convergence` requires `force-threshold`".to_string())
            })?,
            patience: p.patience.unwrap_or(5),
        }))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "max-steps" => self.max_steps = Some(parse_value(key, value_str)?),
                "frame-delta" => self.frame_delta = Some(parse_value(key, value_str)?),
                "explosion-strength" => {
                    self.explosion_strength = Some(parse_value(key, value_str)?)
                }
                "joints.target-bond-length" => {
                    self.joints
                        .get_or_insert_with(Default::default)
                        .target_bond_length = Some(parse_value(key, value_str)?);
                }
                "joints.spring-constant" => {
                    self.joints
                        .get_or_insert_with(Default::default)
                        .spring_constant = Some(parse_value(key, value_str)?);
                }
                "joints.break-force" => {
                    self.joints.get_or_insert_with(Default::default).break_force =
                        Some(parse_value(key, value_str)?);
                }
                "simulator.time-step" => {
                    self.simulator
                        .get_or_insert_with(Default::default)
                        .time_step = Some(parse_value(key, value_str)?);
                }
                "simulator.collision-resolution-multiplier" => {
                    self.simulator
                        .get_or_insert_with(Default::default)
                        .collision_resolution_multiplier = Some(parse_value(key, value_str)?);
                }
                "simulator.friction" => {
                    self.simulator
                        .get_or_insert_with(Default::default)
                        .friction = Some(parse_value(key, value_str)?);
                }
                "convergence.force-threshold" => {
                    self.convergence
                        .get_or_insert_with(Default::default)
                        .force_threshold = Some(parse_value(key, value_str)?);
                }
                "convergence.patience" => {
                    self.convergence
                        .get_or_insert_with(Default::default)
                        .patience = Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value_str
        ))
    })
}
