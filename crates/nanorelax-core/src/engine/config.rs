use crate::core::dynamics::body::DEFAULT_FRICTION;
use thiserror::Error;

/// A time step of zero (or below) makes the simulator use the frame delta
/// handed to each tick.
pub const DEFAULT_TIME_STEP: f64 = 0.0;
pub const DEFAULT_COLLISION_RESOLUTION_MULTIPLIER: f64 = 1.0;
/// Target distance between sequence-adjacent nucleotides, in Angstroms.
pub const DEFAULT_TARGET_BOND_LENGTH: f64 = 3.32;
pub const DEFAULT_SPRING_CONSTANT: f64 = 10.0;
/// One display frame at 60 Hz.
pub const DEFAULT_FRAME_DELTA: f64 = 1.0 / 60.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Fixed integration step; `<= 0` means "use the frame delta".
    pub time_step: f64,
    /// Scales the penetration depth into a penalty force.
    pub collision_resolution_multiplier: f64,
    /// Friction given to every structure cluster.
    pub friction: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            collision_resolution_multiplier: DEFAULT_COLLISION_RESOLUTION_MULTIPLIER,
            friction: DEFAULT_FRICTION,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_step.is_finite() {
            return Err(invalid("time_step", "must be finite"));
        }
        if !self.collision_resolution_multiplier.is_finite()
            || self.collision_resolution_multiplier < 0.0
        {
            return Err(invalid(
                "collision_resolution_multiplier",
                format!(
                    "must be finite and non-negative, got {}",
                    self.collision_resolution_multiplier
                ),
            ));
        }
        if !(0.0..1.0).contains(&self.friction) {
            return Err(invalid(
                "friction",
                format!("must lie in [0, 1), got {}", self.friction),
            ));
        }
        Ok(())
    }
}

/// How a structure is partitioned into rigid clusters.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringConfig {
    /// One cluster per filter expression, first match wins.
    Filters { filters: Vec<String> },
    /// Density-based clustering of monomer positions.
    Dbscan {
        neighbour_radius: f64,
        min_points: usize,
    },
}

impl ClusteringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ClusteringConfig::Filters { filters } => {
                if filters.is_empty() {
                    return Err(invalid("filters", "at least one filter is required"));
                }
            }
            ClusteringConfig::Dbscan {
                neighbour_radius,
                min_points,
            } => {
                if !neighbour_radius.is_finite() || *neighbour_radius <= 0.0 {
                    return Err(invalid(
                        "neighbour_radius",
                        format!("must be finite and positive, got {neighbour_radius}"),
                    ));
                }
                if *min_points == 0 {
                    return Err(invalid("min_points", "must be at least 1"));
                }
            }
        }
        Ok(())
    }
}

/// Parameters of the backbone springs created between clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointConfig {
    pub target_bond_length: f64,
    pub spring_constant: f64,
    /// `None` keeps the joints unbreakable.
    pub break_force: Option<f64>,
}

impl Default for JointConfig {
    fn default() -> Self {
        Self {
            target_bond_length: DEFAULT_TARGET_BOND_LENGTH,
            spring_constant: DEFAULT_SPRING_CONSTANT,
            break_force: None,
        }
    }
}

impl JointConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_bond_length.is_finite() || self.target_bond_length < 0.0 {
            return Err(invalid(
                "target_bond_length",
                format!("must be finite and non-negative, got {}", self.target_bond_length),
            ));
        }
        if !self.spring_constant.is_finite() {
            return Err(invalid("spring_constant", "must be finite"));
        }
        if let Some(force) = self.break_force {
            if force.is_nan() || force <= 0.0 {
                return Err(invalid(
                    "break_force",
                    format!("must be positive, got {force}"),
                ));
            }
        }
        Ok(())
    }
}

/// Early stop once the total system force stays below `force_threshold` for
/// `patience` consecutive steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceConfig {
    pub force_threshold: f64,
    pub patience: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxConfig {
    pub clustering: ClusteringConfig,
    pub joints: JointConfig,
    pub simulator: SimulatorConfig,
    pub convergence: Option<ConvergenceConfig>,
    pub max_steps: usize,
    /// Outward impulse applied once before the first step.
    pub explosion_strength: Option<f64>,
    /// Delta handed to every tick; only used when the simulator time step is
    /// not fixed.
    pub frame_delta: f64,
}

#[derive(Default)]
pub struct RelaxConfigBuilder {
    clustering: Option<ClusteringConfig>,
    joints: Option<JointConfig>,
    simulator: Option<SimulatorConfig>,
    convergence: Option<ConvergenceConfig>,
    max_steps: Option<usize>,
    explosion_strength: Option<f64>,
    frame_delta: Option<f64>,
}

impl RelaxConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clustering(mut self, clustering: ClusteringConfig) -> Self {
        self.clustering = Some(clustering);
        self
    }
    pub fn joints(mut self, joints: JointConfig) -> Self {
        self.joints = Some(joints);
        self
    }
    pub fn simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = Some(simulator);
        self
    }
    pub fn convergence(mut self, convergence: ConvergenceConfig) -> Self {
        self.convergence = Some(convergence);
        self
    }
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }
    pub fn explosion_strength(mut self, strength: f64) -> Self {
        self.explosion_strength = Some(strength);
        self
    }
    pub fn frame_delta(mut self, delta: f64) -> Self {
        self.frame_delta = Some(delta);
        self
    }

    pub fn build(self) -> Result<RelaxConfig, ConfigError> {
        let clustering = self
            .clustering
            .ok_or(ConfigError::MissingParameter("clustering"))?;
        clustering.validate()?;

        let joints = self.joints.unwrap_or_default();
        joints.validate()?;

        let simulator = self.simulator.unwrap_or_default();
        simulator.validate()?;

        if let Some(convergence) = &self.convergence {
            if !convergence.force_threshold.is_finite() || convergence.force_threshold < 0.0 {
                return Err(invalid(
                    "force_threshold",
                    format!(
                        "must be finite and non-negative, got {}",
                        convergence.force_threshold
                    ),
                ));
            }
            if convergence.patience == 0 {
                return Err(invalid("patience", "must be at least 1"));
            }
        }

        let max_steps = self
            .max_steps
            .ok_or(ConfigError::MissingParameter("max_steps"))?;

        if let Some(strength) = self.explosion_strength {
            if !strength.is_finite() {
                return Err(invalid("explosion_strength", "must be finite"));
            }
        }

        let frame_delta = self.frame_delta.unwrap_or(DEFAULT_FRAME_DELTA);
        if !frame_delta.is_finite() || frame_delta <= 0.0 {
            return Err(invalid(
                "frame_delta",
                format!("must be finite and positive, got {frame_delta}"),
            ));
        }

        Ok(RelaxConfig {
            clustering,
            joints,
            simulator,
            convergence: self.convergence,
            max_steps,
            explosion_strength: self.explosion_strength,
            frame_delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dbscan() -> ClusteringConfig {
        ClusteringConfig::Dbscan {
            neighbour_radius: 5.0,
            min_points: 3,
        }
    }

    #[test]
    fn build_fills_defaults() {
        let config = RelaxConfigBuilder::new()
            .clustering(dbscan())
            .max_steps(100)
            .build()
            .unwrap();

        assert_eq!(config.simulator, SimulatorConfig::default());
        assert_eq!(config.simulator.time_step, 0.0);
        assert_eq!(config.simulator.collision_resolution_multiplier, 1.0);
        assert_eq!(config.simulator.friction, 0.4);
        assert_eq!(config.joints.target_bond_length, 3.32);
        assert_eq!(config.joints.spring_constant, 10.0);
        assert_eq!(config.joints.break_force, None);
        assert_eq!(config.convergence, None);
        assert_eq!(config.frame_delta, DEFAULT_FRAME_DELTA);
    }

    #[test]
    fn build_requires_clustering_and_max_steps() {
        assert_eq!(
            RelaxConfigBuilder::new().max_steps(10).build(),
            Err(ConfigError::MissingParameter("clustering"))
        );
        assert_eq!(
            RelaxConfigBuilder::new().clustering(dbscan()).build(),
            Err(ConfigError::MissingParameter("max_steps"))
        );
    }

    #[test]
    fn build_rejects_invalid_values() {
        let bad_friction = RelaxConfigBuilder::new()
            .clustering(dbscan())
            .max_steps(1)
            .simulator(SimulatorConfig {
                friction: 1.0,
                ..SimulatorConfig::default()
            })
            .build();
        assert!(matches!(
            bad_friction,
            Err(ConfigError::InvalidParameter { parameter: "friction", .. })
        ));

        let no_filters = RelaxConfigBuilder::new()
            .clustering(ClusteringConfig::Filters { filters: vec![] })
            .max_steps(1)
            .build();
        assert!(matches!(
            no_filters,
            Err(ConfigError::InvalidParameter { parameter: "filters", .. })
        ));

        let zero_min_points = RelaxConfigBuilder::new()
            .clustering(ClusteringConfig::Dbscan {
                neighbour_radius: 1.0,
                min_points: 0,
            })
            .max_steps(1)
            .build();
        assert!(matches!(
            zero_min_points,
            Err(ConfigError::InvalidParameter { parameter: "min_points", .. })
        ));

        let no_patience = RelaxConfigBuilder::new()
            .clustering(dbscan())
            .max_steps(1)
            .convergence(ConvergenceConfig {
                force_threshold: 0.1,
                patience: 0,
            })
            .build();
        assert!(matches!(
            no_patience,
            Err(ConfigError::InvalidParameter { parameter: "patience", .. })
        ));

        let bad_break_force = RelaxConfigBuilder::new()
            .clustering(dbscan())
            .max_steps(1)
            .joints(JointConfig {
                break_force: Some(0.0),
                ..JointConfig::default()
            })
            .build();
        assert!(matches!(
            bad_break_force,
            Err(ConfigError::InvalidParameter { parameter: "break_force", .. })
        ));
    }
}
