//! # Workflows Module
//!
//! High-level entry points that run complete procedures on a structure.
//!
//! ## Overview
//!
//! A workflow ties the [`crate::core`] data model and the [`crate::engine`]
//! together: it prepares the structure, builds rigid clusters, drives the
//! simulator and reports progress along the way. Callers only need a
//! [`crate::core::models::structure::Structure`], a configuration and a
//! [`crate::engine::progress::ProgressReporter`].
//!
//! - **Relaxation** ([`relax`]) - Clustering followed by rigid-body
//!   relaxation until the system settles or a step budget runs out.

pub mod relax;
