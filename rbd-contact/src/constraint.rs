//! Internal constraint records, one island's worth at a time.
//!
//! Initialization flattens the island's manifolds into two dense
//! arrays: one [`PenetrationConstraint`] per contact point and one
//! [`FrictionConstraint`] per manifold (friction is solved at the
//! manifold centroid). Everything the sweeps need - offsets, cross
//! products, effective masses, mixed material properties - is
//! precomputed here so the per-iteration loops touch no external state
//! beyond the velocity buffers.
//!
//! Back-references into the island are `(manifold, point)` indices, not
//! pointers; the records are only meaningful against the island they
//! were initialized from.

use nalgebra::{Matrix3, Vector3};

use rbd_types::Scalar;

/// Non-penetration constraint along one contact point's normal.
#[derive(Debug, Clone)]
pub struct PenetrationConstraint {
    /// Velocity-array index of body A.
    pub body_a: usize,
    /// Velocity-array index of body B.
    pub body_b: usize,
    /// Contact offset from body A's center of mass.
    pub r_a: Vector3<Scalar>,
    /// Contact offset from body B's center of mass.
    pub r_b: Vector3<Scalar>,
    /// Unit contact normal, from body A toward body B.
    pub normal: Vector3<Scalar>,
    /// Precomputed `r_a x n`.
    pub r_a_cross_n: Vector3<Scalar>,
    /// Precomputed `r_b x n`.
    pub r_b_cross_n: Vector3<Scalar>,
    /// Inverse mass of body A.
    pub inverse_mass_a: Scalar,
    /// Inverse mass of body B.
    pub inverse_mass_b: Scalar,
    /// World-space inverse inertia of body A.
    pub inverse_inertia_a: Matrix3<Scalar>,
    /// World-space inverse inertia of body B.
    pub inverse_inertia_b: Matrix3<Scalar>,
    /// Mixed restitution coefficient for the pair.
    pub restitution: Scalar,
    /// Penetration depth, >= 0.
    pub penetration: Scalar,
    /// Whether the contact point existed at the previous step.
    pub is_resting: bool,
    /// Inverse effective mass along the normal (0 if degenerate).
    pub inverse_normal_mass: Scalar,
    /// Restitution bias `e * (v_rel . n)`, set only for fast approaches.
    pub restitution_bias: Scalar,
    /// Accumulated normal impulse, >= 0 at all times.
    pub normal_impulse: Scalar,
    /// Accumulated split (position-correction) impulse, >= 0.
    pub split_impulse: Scalar,
    /// Index of the owning friction constraint.
    pub friction_index: usize,
    /// Index of the source manifold within the island.
    pub manifold_index: usize,
    /// Index of the source contact point within its manifold.
    pub point_index: usize,
}

/// Friction constraint solved at a manifold's contact centroid.
///
/// Bundles the two tangential directions, the twist about the averaged
/// normal, and the optional rolling-resistance constraint. All four are
/// clamped against `mu * total_normal_impulse`, the Coulomb cone limit
/// accumulated over this manifold's penetration constraints during the
/// current iteration.
#[derive(Debug, Clone)]
pub struct FrictionConstraint {
    /// Velocity-array index of body A.
    pub body_a: usize,
    /// Velocity-array index of body B.
    pub body_b: usize,
    /// Centroid offset from body A's center of mass.
    pub r_a: Vector3<Scalar>,
    /// Centroid offset from body B's center of mass.
    pub r_b: Vector3<Scalar>,
    /// Averaged, normalized manifold normal.
    pub normal: Vector3<Scalar>,
    /// First friction tangent; `t1 x t2 = n`.
    pub tangent1: Vector3<Scalar>,
    /// Second friction tangent.
    pub tangent2: Vector3<Scalar>,
    /// Previous step's first tangent, for impulse reprojection.
    pub old_tangent1: Vector3<Scalar>,
    /// Previous step's second tangent.
    pub old_tangent2: Vector3<Scalar>,
    /// Precomputed `r_a x t1`.
    pub r_a_cross_t1: Vector3<Scalar>,
    /// Precomputed `r_a x t2`.
    pub r_a_cross_t2: Vector3<Scalar>,
    /// Precomputed `r_b x t1`.
    pub r_b_cross_t1: Vector3<Scalar>,
    /// Precomputed `r_b x t2`.
    pub r_b_cross_t2: Vector3<Scalar>,
    /// Inverse mass of body A.
    pub inverse_mass_a: Scalar,
    /// Inverse mass of body B.
    pub inverse_mass_b: Scalar,
    /// World-space inverse inertia of body A.
    pub inverse_inertia_a: Matrix3<Scalar>,
    /// World-space inverse inertia of body B.
    pub inverse_inertia_b: Matrix3<Scalar>,
    /// Inverse effective mass along `tangent1` (0 if degenerate).
    pub inverse_tangent1_mass: Scalar,
    /// Inverse effective mass along `tangent2` (0 if degenerate).
    pub inverse_tangent2_mass: Scalar,
    /// Inverse effective mass for twist about the normal (0 if degenerate).
    pub inverse_twist_mass: Scalar,
    /// `(I_a^-1 + I_b^-1)^-1` for rolling resistance, zero when disabled.
    pub inverse_rolling_resistance: Matrix3<Scalar>,
    /// Mixed Coulomb friction coefficient.
    pub friction_coefficient: Scalar,
    /// Mixed rolling-resistance factor.
    pub rolling_resistance: Scalar,
    /// Accumulated impulse along `tangent1`.
    pub tangent_impulse1: Scalar,
    /// Accumulated impulse along `tangent2`.
    pub tangent_impulse2: Scalar,
    /// Accumulated twist impulse.
    pub twist_impulse: Scalar,
    /// Accumulated rolling-resistance impulse.
    pub rolling_impulse: Vector3<Scalar>,
    /// Sum of this manifold's normal impulses, reset each iteration.
    pub total_normal_impulse: Scalar,
    /// Whether any of the manifold's contact points is resting.
    pub any_resting: bool,
    /// Index of the source manifold within the island.
    pub manifold_index: usize,
}
