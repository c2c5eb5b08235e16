//! # Core Module
//!
//! The foundation of NanoRelax: the structural data model, the monomer
//! filter language, file I/O and the rigid-body dynamics primitives.
//!
//! ## Architecture
//!
//! - **Structural Representation** ([`models`]) - Components, strands and
//!   coarse-grained monomers
//! - **Selection** ([`selection`]) - Boolean filter expressions over monomers
//! - **File I/O** ([`io`]) - Structure files and step telemetry
//! - **Dynamics** ([`dynamics`]) - Shapes, rigid bodies, contacts, joints and
//!   structure clusters
//!
//! The dynamics module never reaches into the data model directly; it reads
//! and moves monomers only through the
//! [`ElementStore`](dynamics::store::ElementStore) trait, which
//! [`Structure`](models::structure::Structure) implements.

pub mod dynamics;
pub mod io;
pub mod models;
pub mod selection;
