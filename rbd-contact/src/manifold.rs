//! Contact points, manifolds, and islands.
//!
//! These are the wire contract between collision detection and the
//! solver. A [`ContactManifold`] groups the contact points between one
//! body pair and carries the caches the solver writes back each step
//! for warm starting: the friction tangent basis and the accumulated
//! impulses. An [`Island`] is the batch of manifolds solved together in
//! one invocation.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rbd_types::{BodyId, Scalar};

/// A single contact between two bodies.
///
/// The normal is a unit vector pointing from body A toward body B, and
/// the penetration depth is non-negative. `is_resting` and
/// `normal_impulse` are solver caches: the solver flags every point it
/// has seen so the next frame treats it as persistent, and stores the
/// accumulated normal impulse for warm starting.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactPoint {
    /// Contact location on body A, world coordinates.
    pub point_a: Point3<Scalar>,
    /// Contact location on body B, world coordinates.
    pub point_b: Point3<Scalar>,
    /// Unit contact normal, from body A toward body B.
    pub normal: Vector3<Scalar>,
    /// Penetration depth, >= 0.
    pub penetration: Scalar,
    /// Whether this contact existed at the previous step.
    pub is_resting: bool,
    /// Accumulated normal impulse from the previous step.
    pub normal_impulse: Scalar,
}

impl ContactPoint {
    /// Create a fresh contact point with empty solver caches.
    #[must_use]
    pub fn new(
        point_a: Point3<Scalar>,
        point_b: Point3<Scalar>,
        normal: Vector3<Scalar>,
        penetration: Scalar,
    ) -> Self {
        Self {
            point_a,
            point_b,
            normal,
            penetration,
            is_resting: false,
            normal_impulse: 0.0,
        }
    }
}

/// The contact points between one pair of bodies, plus warm-start caches.
///
/// Friction is solved once per manifold at the centroid of its contact
/// points, so the friction caches (tangent basis, tangential, twist and
/// rolling impulses) live here rather than on the individual points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactManifold {
    /// First body of the pair.
    pub body_a: BodyId,
    /// Second body of the pair.
    pub body_b: BodyId,
    /// Contact points sharing this manifold's approximate normal.
    pub points: Vec<ContactPoint>,
    /// First friction tangent from the previous step.
    pub tangent1: Vector3<Scalar>,
    /// Second friction tangent from the previous step.
    pub tangent2: Vector3<Scalar>,
    /// Accumulated impulse along `tangent1` from the previous step.
    pub tangent_impulse1: Scalar,
    /// Accumulated impulse along `tangent2` from the previous step.
    pub tangent_impulse2: Scalar,
    /// Accumulated twist-friction impulse from the previous step.
    pub twist_impulse: Scalar,
    /// Accumulated rolling-resistance impulse from the previous step.
    pub rolling_impulse: Vector3<Scalar>,
}

impl ContactManifold {
    /// Create an empty manifold for a body pair.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            points: Vec::new(),
            tangent1: Vector3::zeros(),
            tangent2: Vector3::zeros(),
            tangent_impulse1: 0.0,
            tangent_impulse2: 0.0,
            twist_impulse: 0.0,
            rolling_impulse: Vector3::zeros(),
        }
    }

    /// Add a contact point.
    pub fn push(&mut self, point: ContactPoint) {
        self.points.push(point);
    }

    /// Add a contact point, builder style.
    #[must_use]
    pub fn with_point(mut self, point: ContactPoint) -> Self {
        self.push(point);
        self
    }

    /// Number of contact points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the manifold has no contact points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reset all warm-start caches, on the manifold and its points.
    ///
    /// Call when the contact pair reappears after separation and the
    /// previous impulses are no longer a meaningful guess.
    pub fn clear_caches(&mut self) {
        self.tangent1 = Vector3::zeros();
        self.tangent2 = Vector3::zeros();
        self.tangent_impulse1 = 0.0;
        self.tangent_impulse2 = 0.0;
        self.twist_impulse = 0.0;
        self.rolling_impulse = Vector3::zeros();
        for point in &mut self.points {
            point.is_resting = false;
            point.normal_impulse = 0.0;
        }
    }
}

/// One independent group of interacting bodies' contact manifolds.
///
/// Islands are built upstream; the solver treats the island as the unit
/// of work and assumes exclusive access to it for the duration of a
/// step. Distinct islands may be solved concurrently by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Island {
    manifolds: Vec<ContactManifold>,
}

impl Island {
    /// Create an empty island.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an island from a list of manifolds.
    #[must_use]
    pub fn from_manifolds(manifolds: Vec<ContactManifold>) -> Self {
        Self { manifolds }
    }

    /// Add a manifold.
    pub fn push(&mut self, manifold: ContactManifold) {
        self.manifolds.push(manifold);
    }

    /// The island's manifolds.
    #[must_use]
    pub fn manifolds(&self) -> &[ContactManifold] {
        &self.manifolds
    }

    /// Mutable access to the island's manifolds.
    pub fn manifolds_mut(&mut self) -> &mut [ContactManifold] {
        &mut self.manifolds
    }

    /// Number of manifolds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    /// Check if the island has no manifolds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }

    /// Total number of contact points across all manifolds.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.manifolds.iter().map(ContactManifold::len).sum()
    }
}
