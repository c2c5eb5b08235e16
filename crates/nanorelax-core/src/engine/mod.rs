//! # Engine Module
//!
//! The stateful layer that turns a structure into simulated rigid bodies and
//! drives them.
//!
//! ## Overview
//!
//! The engine partitions a prepared structure into
//! [`StructureCluster`](crate::core::dynamics::cluster::StructureCluster)s,
//! connects them with backbone springs and advances the resulting system
//! with a [`simulator::Simulator`], one step per frame tick.
//!
//! ## Architecture
//!
//! - **Clustering** ([`clustering`]) - Component preparation, filter and
//!   DBSCAN clustering, and inter-cluster joint synthesis
//! - **Simulation** ([`simulator`]) - Body and joint registries, lifecycle
//!   control and the per-step force pipeline
//! - **Configuration** ([`config`]) - Simulator, clustering, joint and
//!   convergence parameters with validation
//! - **Progress Monitoring** ([`progress`]) - Phase and step events for
//!   user feedback
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod clustering;
pub mod config;
pub mod error;
pub mod progress;
pub mod simulator;
