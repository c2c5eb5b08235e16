pub mod cluster;
pub mod relax;
