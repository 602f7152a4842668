//! Core types for rigid-body contact resolution.
//!
//! This crate provides the foundational types consumed by the contact
//! solver in `rbd-contact`:
//!
//! - [`BodyId`] / [`BodyType`] - body handles and mobility classes
//! - [`RigidBody`] - the read-only view of a body the solver needs
//!   (world center of mass, inverse mass, world-space inverse inertia)
//! - [`Material`] / [`MixingRules`] - surface properties and the rules
//!   for combining them across a contact pair
//! - [`SolverError`] - precondition violations surfaced to callers
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no behavior beyond
//! construction, validation, and trivial queries. They are the common
//! language between:
//!
//! - The contact solver (`rbd-contact`)
//! - Collision detection, which produces contact manifolds
//! - The timestep driver, which owns body state and velocity buffers
//!
//! # Coordinate System
//!
//! Right-handed, world-space. Positions are `Point3`, directions and
//! velocities `Vector3`, inertia tensors `Matrix3`, all over [`Scalar`].
//!
//! # Example
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use rbd_types::{RigidBody, solid_box_inertia};
//!
//! let inertia = solid_box_inertia(1.0, Vector3::new(0.5, 0.5, 0.5));
//! let body = RigidBody::dynamic(Point3::new(0.0, 0.5, 0.0), 1.0, inertia);
//!
//! assert!(body.is_dynamic());
//! assert!((body.inverse_mass - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/rbd-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Lints that are overly pedantic for plain data definitions
#![allow(
    clippy::missing_const_for_fn, // Most methods can't be const due to nalgebra
    clippy::missing_errors_doc    // Error docs added where non-obvious
)]

mod body;
mod error;
mod material;

pub use body::{solid_box_inertia, solid_sphere_inertia, BodyId, BodyType, RigidBody};
pub use error::SolverError;
pub use material::{Material, MixRule, MixingRules};

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, Vector3};

/// The floating-point scalar used throughout the workspace.
///
/// The solver is written against this alias so the precision could be
/// switched in one place; every shipped configuration uses `f64`.
pub type Scalar = f64;

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;
