//! Partitioning of a structure into rigid clusters, and synthesis of the
//! backbone springs that hold neighbouring clusters together.
//!
//! Every entry point works on a snapshot of the structure taken after
//! [`prepare::prepare_components`] has baked component transforms into
//! monomer coordinates. Skipping that step yields clusters built from
//! component-space positions.

pub mod dbscan;
pub mod filter;
pub mod joints;
pub mod prepare;
mod snapshot;

pub use dbscan::create_dbscan_clusters;
pub use filter::create_filter_clusters;
pub use joints::compute_intercluster_joints;
pub use prepare::prepare_components;
