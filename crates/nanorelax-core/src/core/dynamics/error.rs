use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum DynamicsError {
    #[error("Friction must lie in [0, 1), got {0}")]
    InvalidFriction(f64),

    #[error("A structure cluster needs at least one element")]
    EmptyCluster,
}
