//! # Dynamics Module
//!
//! Rigid-body dynamics used to relax coarse-grained structures into
//! non-overlapping arrangements.
//!
//! ## Overview
//!
//! Bodies are integrated with a semi-implicit Euler scheme and carry exactly
//! one [`shape::Shape`] that defines their mass, moment of inertia and
//! collision geometry. [`joint::Joint`]s connect pairs of bodies through
//! breakable springs, and [`cluster::StructureCluster`]s are bodies that move
//! a set of structural elements along with them.
//!
//! All bodies live in a [`bodies::BodySet`] arena addressed by [`ids::BodyId`]
//! handles; shapes and joints refer to bodies through these handles instead of
//! holding references. The module talks to the structural data layer only
//! through the [`store::ElementStore`] trait.
//!
//! ## Key Components
//!
//! - [`shape`] - Sphere and compound shapes with the narrow-phase tests
//! - [`contact`] - Collision contacts between two bodies
//! - [`body`] - Rigid body state and integration
//! - [`joint`] - Breakable spring joints
//! - [`cluster`] - Structure clusters and their element snapshots
//! - [`bodies`] - The body arena and the body variants it holds

pub mod bodies;
pub mod body;
pub mod cluster;
pub mod contact;
pub mod error;
pub mod ids;
pub mod joint;
pub mod shape;
pub mod store;
