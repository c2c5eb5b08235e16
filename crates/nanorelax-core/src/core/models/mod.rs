//! # Core Models Module
//!
//! This module contains the coarse-grained structural data model that the
//! dynamics engine relaxes.
//!
//! ## Overview
//!
//! A [`structure::Structure`] owns every component, strand and monomer in a
//! scene. Components are the units a host application loads and renders,
//! strands are ordered polymers (DNA, RNA or protein), and monomers are the
//! coarse-grained elements (one nucleotide or residue each) whose positions
//! the engine moves.
//!
//! ## Key Components
//!
//! - [`monomer`] - Coarse-grained elements with position and local frame
//! - [`strand`] - Ordered polymers and their terminus queries
//! - [`component`] - Top-level objects carrying a world transform
//! - [`structure`] - The container tying them together
//! - [`ids`] - Stable slotmap keys for monomers, strands and components
//!
//! ## Usage
//!
//! ```ignore
//! use nanorelax::core::models::{structure::Structure, strand::StrandKind};
//!
//! let mut structure = Structure::new();
//! let component = structure.add_component("origami");
//! let strand = structure.add_strand(component, "scaffold", StrandKind::Dna, false)?;
//! structure.add_monomer(strand, "A", Point3::new(0.0, 0.0, 0.0))?;
//! ```

pub mod component;
pub mod ids;
pub mod monomer;
pub mod strand;
pub mod structure;
