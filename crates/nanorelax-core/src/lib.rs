//! # NanoRelax Core Library
//!
//! Relaxes coarse-grained nucleic-acid and protein structures into
//! non-overlapping arrangements with a small rigid-body dynamics engine
//! instead of an atomistic simulation.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** The structural data model (`Structure`), the
//!   monomer filter language, file I/O and the dynamics primitives: shapes,
//!   rigid bodies, collision contacts, breakable spring joints and structure
//!   clusters.
//!
//! - **[`engine`]: The Logic Core.** Clustering algorithms that split a
//!   structure into rigid units, synthesis of backbone joints between them,
//!   and the `Simulator` that applies joint forces, resolves collisions and
//!   integrates every body once per frame.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures, such as
//!   [`workflows::relax::run`], that take a structure and a configuration and
//!   leave the structure relaxed in place.

pub mod core;
pub mod engine;
pub mod workflows;
