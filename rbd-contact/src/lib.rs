//! Sequential-impulse contact solver for rigid-body islands.
//!
//! This crate implements the constraint solver at the heart of a 3D
//! rigid-body engine: given the contact manifolds of one island of
//! interacting bodies plus their current velocities, it computes the
//! corrective impulses that resolve interpenetration and apply Coulomb
//! friction. It is a projected Gauss-Seidel (sequential impulse)
//! solver:
//!
//! - **Non-penetration** is a unilateral constraint per contact point;
//!   accumulated normal impulses are projected onto `lambda >= 0`.
//! - **Friction** is solved once per manifold at the contact centroid:
//!   two tangent directions, a twist about the normal, and optional
//!   rolling resistance, each clamped by the Coulomb cone
//!   `|J| <= mu * totalNormalImpulse`.
//! - **Warm starting** replays the previous step's impulses so stacks
//!   converge in a handful of iterations.
//! - **Split impulse** corrects penetration through separate
//!   position-only velocity lanes, so depth correction never injects
//!   kinetic energy into the velocity solve.
//!
//! Collision detection, island building, and integration live
//! upstream; the solver only consumes [`Island`]s, a body lookup, and
//! the externally owned [`VelocityBuffers`].
//!
//! # Example
//!
//! A unit cube falling onto a static floor:
//!
//! ```
//! use nalgebra::{Matrix3, Point3, Vector3};
//! use rbd_contact::{
//!     BodyIndexMap, ContactManifold, ContactPoint, ContactSolver, Island, VelocityBuffers,
//! };
//! use rbd_types::{BodyId, RigidBody};
//!
//! let floor_id = BodyId::new(0);
//! let cube_id = BodyId::new(1);
//!
//! let floor = RigidBody::fixed(Point3::origin());
//! let cube = RigidBody::dynamic(Point3::new(0.0, 0.5, 0.0), 1.0, Matrix3::identity());
//! let bodies = move |id: BodyId| match id {
//!     id if id == floor_id => Some(floor),
//!     id if id == cube_id => Some(cube),
//!     _ => None,
//! };
//!
//! // One contact under the cube's center, normal from floor toward cube.
//! let mut island = Island::new();
//! island.push(
//!     ContactManifold::new(floor_id, cube_id).with_point(ContactPoint::new(
//!         Point3::origin(),
//!         Point3::origin(),
//!         Vector3::y(),
//!         0.0,
//!     )),
//! );
//!
//! let mut velocities = VelocityBuffers::new(2);
//! velocities.linear[1] = Vector3::new(0.0, -1.0, 0.0); // cube falling
//!
//! let mut solver = ContactSolver::default();
//! let mut map = BodyIndexMap::new();
//! map.insert(floor_id, 0);
//! map.insert(cube_id, 1);
//! solver.set_body_index_map(map);
//!
//! solver.initialize_island(1.0 / 60.0, &mut island, bodies, &velocities)?;
//! solver.warm_start(&mut velocities);
//! solver.solve(10, &mut velocities);
//! solver.store_impulses(&mut island);
//! solver.cleanup();
//!
//! // The cube no longer moves into the floor.
//! assert!(velocities.linear[1].y >= -1e-9);
//! # Ok::<(), rbd_types::SolverError>(())
//! ```
//!
//! # Concurrency
//!
//! The solver is single-threaded within an island and assumes exclusive
//! access to the island, its constraint records, and the velocity
//! buffers for the duration of a step - which the `&mut` borrows
//! enforce. Separate solver instances over disjoint islands may run
//! concurrently under an external driver.

#![doc(html_root_url = "https://docs.rs/rbd-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Most methods can't be const due to nalgebra
    clippy::cast_precision_loss   // usize to f64 is fine for contact counts
)]

mod constraint;
mod friction;
mod manifold;
mod solver;
mod velocity;

pub use constraint::{FrictionConstraint, PenetrationConstraint};
pub use friction::{compute_tangent_basis, one_unit_orthogonal};
pub use manifold::{ContactManifold, ContactPoint, Island};
pub use solver::{
    ContactSolver, ContactSolverConfig, ContactSolverStats, BETA, BETA_SPLIT_IMPULSE,
    DEFAULT_RESTITUTION_VELOCITY_THRESHOLD, PENETRATION_SLOP,
};
pub use velocity::{BodyIndexMap, VelocityBuffers};

// Re-export the types the solver API is written in terms of
pub use rbd_types::{BodyId, BodyType, Material, MixRule, MixingRules, RigidBody, SolverError};
