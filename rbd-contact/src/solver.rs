//! Sequential-impulse contact solver.
//!
//! A projected Gauss-Seidel solver over one island's contact
//! constraints. Per step, the driving loop is:
//!
//! 1. [`ContactSolver::initialize_island`] - flatten the island's
//!    manifolds into dense constraint records and precompute effective
//!    masses, biases, and the friction tangent basis.
//! 2. [`ContactSolver::warm_start`] - apply the previous step's cached
//!    impulses to the velocity buffers so the iteration starts near the
//!    solution.
//! 3. N times: [`ContactSolver::reset_total_penetration_impulse`],
//!    [`ContactSolver::solve_penetration_constraints`],
//!    [`ContactSolver::solve_friction_constraints`] (or just
//!    [`ContactSolver::solve`], which runs the triple for you).
//! 4. [`ContactSolver::store_impulses`] - write the accumulated
//!    impulses back onto the island for next-step warm starting.
//! 5. [`ContactSolver::cleanup`].
//!
//! Gauss-Seidel order matters: each constraint reads the velocities
//! already updated by the constraints before it in the same sweep, and
//! the iteration order over the constraint arrays is part of the
//! contract. With split impulse enabled, position error is corrected
//! through the separate split velocity lanes and the velocity-space
//! solve carries no positional bias at all, so stacked contacts do not
//! gain energy from depth correction.

use nalgebra::{Matrix3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rbd_types::{BodyId, MixingRules, Result, RigidBody, Scalar, SolverError};

use crate::constraint::{FrictionConstraint, PenetrationConstraint};
use crate::friction::{clamp_per_axis, clamp_symmetric, compute_tangent_basis};
use crate::manifold::Island;
use crate::velocity::{BodyIndexMap, VelocityBuffers};

/// Baumgarte factor for the positional bias.
pub const BETA: Scalar = 0.2;
/// Baumgarte factor used by the split-impulse position sweep.
pub const BETA_SPLIT_IMPULSE: Scalar = 0.2;
/// Allowed penetration below which no positional correction is applied.
pub const PENETRATION_SLOP: Scalar = 0.01;
/// Default approach speed above which restitution kicks in (m/s).
pub const DEFAULT_RESTITUTION_VELOCITY_THRESHOLD: Scalar = 1.0;

/// Configuration for the contact solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactSolverConfig {
    /// Seed accumulated impulses from the previous step's caches.
    pub warm_starting: bool,

    /// Correct penetration through the split velocity lanes instead of
    /// biasing the velocity solve.
    pub split_impulse: bool,

    /// Solve friction once per manifold at the contact centroid.
    ///
    /// Kept for compatibility with older per-contact-point friction;
    /// the solver only ships the centroid path and ignores `false`.
    pub friction_at_manifold_center: bool,

    /// Approach speed below which no restitution bias is applied (m/s).
    ///
    /// Keeps resting contacts from jittering on bounce energy.
    pub restitution_velocity_threshold: Scalar,

    /// How the two bodies' materials combine per manifold.
    pub mixing: MixingRules,
}

impl Default for ContactSolverConfig {
    fn default() -> Self {
        Self {
            warm_starting: true,
            split_impulse: true,
            friction_at_manifold_center: true,
            restitution_velocity_threshold: DEFAULT_RESTITUTION_VELOCITY_THRESHOLD,
            mixing: MixingRules::default(),
        }
    }
}

impl ContactSolverConfig {
    /// Enable or disable warm starting.
    #[must_use]
    pub const fn with_warm_starting(mut self, enabled: bool) -> Self {
        self.warm_starting = enabled;
        self
    }

    /// Enable or disable split-impulse position correction.
    #[must_use]
    pub const fn with_split_impulse(mut self, enabled: bool) -> Self {
        self.split_impulse = enabled;
        self
    }

    /// Set the restitution velocity threshold.
    #[must_use]
    pub const fn with_restitution_velocity_threshold(mut self, threshold: Scalar) -> Self {
        self.restitution_velocity_threshold = threshold;
        self
    }

    /// Set the material mixing rules.
    #[must_use]
    pub const fn with_mixing(mut self, mixing: MixingRules) -> Self {
        self.mixing = mixing;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if !(self.restitution_velocity_threshold >= 0.0
            && self.restitution_velocity_threshold.is_finite())
        {
            return Err("restitution velocity threshold must be non-negative and finite");
        }
        Ok(())
    }
}

/// Counters describing the last initialized island.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSolverStats {
    /// Manifolds in the island.
    pub manifolds: usize,
    /// Penetration constraints (total contact points).
    pub penetration_constraints: usize,
    /// Friction constraints (one per manifold).
    pub friction_constraints: usize,
    /// Whether initialization seeded impulses from previous-step caches.
    pub warm_started: bool,
}

/// Per-island sequential-impulse contact solver.
///
/// The solver is stateless across islands: `initialize_island` replaces
/// all internal records, and `cleanup` drops them. Velocities live in
/// externally owned [`VelocityBuffers`] that every operation borrows
/// mutably, so exclusive access during a step is compiler-enforced.
///
/// See the [crate-level docs](crate) for a complete example.
#[derive(Debug, Clone, Default)]
pub struct ContactSolver {
    config: ContactSolverConfig,
    body_map: BodyIndexMap,
    dt: Scalar,
    penetration_constraints: Vec<PenetrationConstraint>,
    friction_constraints: Vec<FrictionConstraint>,
    stats: ContactSolverStats,
    initialized: bool,
}

impl ContactSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: ContactSolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ContactSolverConfig {
        &self.config
    }

    /// Enable or disable warm starting.
    pub fn set_warm_starting(&mut self, enabled: bool) {
        self.config.warm_starting = enabled;
    }

    /// Enable or disable split-impulse position correction.
    pub fn set_split_impulse(&mut self, enabled: bool) {
        self.config.split_impulse = enabled;
    }

    /// Set the centroid-friction compatibility toggle.
    pub fn set_friction_at_manifold_center(&mut self, enabled: bool) {
        self.config.friction_at_manifold_center = enabled;
    }

    /// Install the body-to-velocity-index lookup.
    pub fn set_body_index_map(&mut self, map: BodyIndexMap) {
        self.body_map = map;
    }

    /// The installed body-index map.
    #[must_use]
    pub fn body_index_map(&self) -> &BodyIndexMap {
        &self.body_map
    }

    /// Counters from the last initialization.
    #[must_use]
    pub fn stats(&self) -> ContactSolverStats {
        self.stats
    }

    /// The penetration constraint records of the current island.
    #[must_use]
    pub fn penetration_constraints(&self) -> &[PenetrationConstraint] {
        &self.penetration_constraints
    }

    /// The friction constraint records of the current island.
    #[must_use]
    pub fn friction_constraints(&self) -> &[FrictionConstraint] {
        &self.friction_constraints
    }

    /// Materialize constraint records for an island.
    ///
    /// Replaces any previous island state. `get_body` resolves a body
    /// handle to the solver's view of that body; `velocities` is only
    /// read (for the restitution bias and the tangent basis), using the
    /// indices installed via [`Self::set_body_index_map`].
    ///
    /// Also flags every processed contact point as resting, so the
    /// *next* step sees it as persistent and warm-starts it.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] on precondition violations: a
    /// non-positive `dt`, an empty island or manifold, a body that
    /// cannot be resolved or mapped, an index outside `velocities`, or
    /// an invalid configuration.
    pub fn initialize_island<F>(
        &mut self,
        dt: Scalar,
        island: &mut Island,
        get_body: F,
        velocities: &VelocityBuffers,
    ) -> Result<()>
    where
        F: Fn(BodyId) -> Option<RigidBody>,
    {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SolverError::InvalidTimestep(dt));
        }
        if island.is_empty() {
            return Err(SolverError::EmptyIsland);
        }
        self.config.validate().map_err(SolverError::invalid_config)?;

        self.cleanup();
        self.dt = dt;

        let manifold_count = island.len();
        for (manifold_index, manifold) in island.manifolds_mut().iter_mut().enumerate() {
            if manifold.is_empty() {
                return Err(SolverError::EmptyManifold {
                    manifold: manifold_index,
                });
            }

            let body_a =
                get_body(manifold.body_a).ok_or(SolverError::UnknownBody(manifold.body_a))?;
            let body_b =
                get_body(manifold.body_b).ok_or(SolverError::UnknownBody(manifold.body_b))?;
            let index_a = self
                .body_map
                .get(manifold.body_a)
                .ok_or(SolverError::UnmappedBody(manifold.body_a))?;
            let index_b = self
                .body_map
                .get(manifold.body_b)
                .ok_or(SolverError::UnmappedBody(manifold.body_b))?;
            for index in [index_a, index_b] {
                if index >= velocities.len() {
                    return Err(SolverError::IndexOutOfRange {
                        index,
                        len: velocities.len(),
                    });
                }
            }

            let x_a = body_a.center_of_mass;
            let x_b = body_b.center_of_mass;
            let inertia_a = body_a.inverse_inertia_world;
            let inertia_b = body_b.inverse_inertia_world;
            let v_a = velocities.linear[index_a];
            let w_a = velocities.angular[index_a];
            let v_b = velocities.linear[index_b];
            let w_b = velocities.angular[index_b];

            let mixed = self.config.mixing.mix(&body_a.material, &body_b.material);

            let inverse_rolling_resistance = if mixed.rolling_resistance > 0.0
                && (body_a.is_dynamic() || body_b.is_dynamic())
            {
                (inertia_a + inertia_b)
                    .try_inverse()
                    .unwrap_or_else(Matrix3::zeros)
            } else {
                Matrix3::zeros()
            };

            let friction_index = self.friction_constraints.len();
            let mut centroid_a = Vector3::zeros();
            let mut centroid_b = Vector3::zeros();
            let mut averaged_normal = Vector3::zeros();
            let mut any_resting = false;

            for (point_index, point) in manifold.points.iter_mut().enumerate() {
                let r_a = point.point_a - x_a;
                let r_b = point.point_b - x_b;
                let normal = point.normal;
                let r_a_cross_n = r_a.cross(&normal);
                let r_b_cross_n = r_b.cross(&normal);

                let normal_mass = body_a.inverse_mass
                    + body_b.inverse_mass
                    + ((inertia_a * r_a_cross_n).cross(&r_a)).dot(&normal)
                    + ((inertia_b * r_b_cross_n).cross(&r_b)).dot(&normal);
                let inverse_normal_mass = if normal_mass > 0.0 {
                    1.0 / normal_mass
                } else {
                    0.0
                };

                // Restitution uses the approach speed at the *start* of the
                // step, not the partially solved velocities inside sweeps.
                let delta_v = v_b + w_b.cross(&r_b) - v_a - w_a.cross(&r_a);
                let approach = delta_v.dot(&normal);
                let restitution_bias = if approach < -self.config.restitution_velocity_threshold {
                    mixed.restitution * approach
                } else {
                    0.0
                };

                let normal_impulse = if self.config.warm_starting {
                    point.normal_impulse
                } else {
                    0.0
                };

                any_resting |= point.is_resting;
                let is_resting = point.is_resting;
                point.is_resting = true;

                centroid_a += point.point_a.coords;
                centroid_b += point.point_b.coords;
                averaged_normal += normal;

                self.penetration_constraints.push(PenetrationConstraint {
                    body_a: index_a,
                    body_b: index_b,
                    r_a,
                    r_b,
                    normal,
                    r_a_cross_n,
                    r_b_cross_n,
                    inverse_mass_a: body_a.inverse_mass,
                    inverse_mass_b: body_b.inverse_mass,
                    inverse_inertia_a: inertia_a,
                    inverse_inertia_b: inertia_b,
                    restitution: mixed.restitution,
                    penetration: point.penetration,
                    is_resting,
                    inverse_normal_mass,
                    restitution_bias,
                    normal_impulse,
                    split_impulse: 0.0,
                    friction_index,
                    manifold_index,
                    point_index,
                });
            }

            let count = manifold.len() as Scalar;
            let r_a = Point3::from(centroid_a / count) - x_a;
            let r_b = Point3::from(centroid_b / count) - x_b;
            let normal = averaged_normal
                .try_normalize(Scalar::EPSILON)
                .or_else(|| manifold.points.first().map(|p| p.normal))
                .unwrap_or_else(Vector3::y);

            let delta_v = v_b + w_b.cross(&r_b) - v_a - w_a.cross(&r_a);
            let (tangent1, tangent2) = compute_tangent_basis(&normal, &delta_v);

            let r_a_cross_t1 = r_a.cross(&tangent1);
            let r_a_cross_t2 = r_a.cross(&tangent2);
            let r_b_cross_t1 = r_b.cross(&tangent1);
            let r_b_cross_t2 = r_b.cross(&tangent2);

            let mass_sum = body_a.inverse_mass + body_b.inverse_mass;
            let tangent1_mass = mass_sum
                + ((inertia_a * r_a_cross_t1).cross(&r_a)).dot(&tangent1)
                + ((inertia_b * r_b_cross_t1).cross(&r_b)).dot(&tangent1);
            let tangent2_mass = mass_sum
                + ((inertia_a * r_a_cross_t2).cross(&r_a)).dot(&tangent2)
                + ((inertia_b * r_b_cross_t2).cross(&r_b)).dot(&tangent2);
            let twist_mass = normal.dot(&(inertia_a * normal)) + normal.dot(&(inertia_b * normal));

            let reciprocal = |mass: Scalar| if mass > 0.0 { 1.0 / mass } else { 0.0 };

            let (tangent_impulse1, tangent_impulse2, twist_impulse, rolling_impulse) =
                if self.config.warm_starting {
                    (
                        manifold.tangent_impulse1,
                        manifold.tangent_impulse2,
                        manifold.twist_impulse,
                        manifold.rolling_impulse,
                    )
                } else {
                    (0.0, 0.0, 0.0, Vector3::zeros())
                };

            self.friction_constraints.push(FrictionConstraint {
                body_a: index_a,
                body_b: index_b,
                r_a,
                r_b,
                normal,
                tangent1,
                tangent2,
                old_tangent1: manifold.tangent1,
                old_tangent2: manifold.tangent2,
                r_a_cross_t1,
                r_a_cross_t2,
                r_b_cross_t1,
                r_b_cross_t2,
                inverse_mass_a: body_a.inverse_mass,
                inverse_mass_b: body_b.inverse_mass,
                inverse_inertia_a: inertia_a,
                inverse_inertia_b: inertia_b,
                inverse_tangent1_mass: reciprocal(tangent1_mass),
                inverse_tangent2_mass: reciprocal(tangent2_mass),
                inverse_twist_mass: reciprocal(twist_mass),
                inverse_rolling_resistance,
                friction_coefficient: mixed.friction,
                rolling_resistance: mixed.rolling_resistance,
                tangent_impulse1,
                tangent_impulse2,
                twist_impulse,
                rolling_impulse,
                total_normal_impulse: 0.0,
                any_resting,
                manifold_index,
            });
        }

        self.stats = ContactSolverStats {
            manifolds: manifold_count,
            penetration_constraints: self.penetration_constraints.len(),
            friction_constraints: self.friction_constraints.len(),
            warm_started: self.config.warm_starting,
        };
        self.initialized = true;

        tracing::debug!(
            manifolds = manifold_count,
            penetration_constraints = self.penetration_constraints.len(),
            warm_starting = self.config.warm_starting,
            "contact solver initialized for island"
        );

        Ok(())
    }

    /// Apply the previous step's cached impulses to the velocities.
    ///
    /// Resting contacts get their cached normal impulse replayed;
    /// manifolds with at least one resting contact get their cached
    /// friction impulses reprojected from the previous tangent basis
    /// onto the current one and replayed. Fresh contacts have their
    /// accumulators zeroed instead.
    pub fn warm_start(&mut self, velocities: &mut VelocityBuffers) {
        debug_assert!(self.initialized, "warm_start before initialize_island");
        if !self.config.warm_starting {
            return;
        }

        for c in &mut self.penetration_constraints {
            if c.is_resting {
                let linear = c.normal * c.normal_impulse;
                velocities.linear[c.body_a] -= linear * c.inverse_mass_a;
                velocities.angular[c.body_a] -=
                    c.inverse_inertia_a * (c.r_a_cross_n * c.normal_impulse);
                velocities.linear[c.body_b] += linear * c.inverse_mass_b;
                velocities.angular[c.body_b] +=
                    c.inverse_inertia_b * (c.r_b_cross_n * c.normal_impulse);
            } else {
                c.normal_impulse = 0.0;
            }
        }

        for f in &mut self.friction_constraints {
            if f.any_resting {
                // Carry the cached tangential impulse across the basis
                // change between steps.
                let cached = f.old_tangent1 * f.tangent_impulse1 + f.old_tangent2 * f.tangent_impulse2;
                f.tangent_impulse1 = cached.dot(&f.tangent1);
                f.tangent_impulse2 = cached.dot(&f.tangent2);

                let linear1 = f.tangent1 * f.tangent_impulse1;
                velocities.linear[f.body_a] -= linear1 * f.inverse_mass_a;
                velocities.angular[f.body_a] -=
                    f.inverse_inertia_a * (f.r_a_cross_t1 * f.tangent_impulse1);
                velocities.linear[f.body_b] += linear1 * f.inverse_mass_b;
                velocities.angular[f.body_b] +=
                    f.inverse_inertia_b * (f.r_b_cross_t1 * f.tangent_impulse1);

                let linear2 = f.tangent2 * f.tangent_impulse2;
                velocities.linear[f.body_a] -= linear2 * f.inverse_mass_a;
                velocities.angular[f.body_a] -=
                    f.inverse_inertia_a * (f.r_a_cross_t2 * f.tangent_impulse2);
                velocities.linear[f.body_b] += linear2 * f.inverse_mass_b;
                velocities.angular[f.body_b] +=
                    f.inverse_inertia_b * (f.r_b_cross_t2 * f.tangent_impulse2);

                let twist = f.normal * f.twist_impulse;
                velocities.angular[f.body_a] -= f.inverse_inertia_a * twist;
                velocities.angular[f.body_b] += f.inverse_inertia_b * twist;

                velocities.angular[f.body_a] -= f.inverse_inertia_a * f.rolling_impulse;
                velocities.angular[f.body_b] += f.inverse_inertia_b * f.rolling_impulse;
            } else {
                f.tangent_impulse1 = 0.0;
                f.tangent_impulse2 = 0.0;
                f.twist_impulse = 0.0;
                f.rolling_impulse = Vector3::zeros();
            }
        }
    }

    /// Zero every friction constraint's accumulated normal-impulse sum.
    ///
    /// Call at the top of each iteration, before the penetration sweep
    /// re-accumulates the Coulomb limits.
    pub fn reset_total_penetration_impulse(&mut self) {
        for f in &mut self.friction_constraints {
            f.total_normal_impulse = 0.0;
        }
    }

    /// One Gauss-Seidel sweep over the non-penetration constraints.
    ///
    /// Accumulate-and-project: the running normal impulse is clamped to
    /// be non-negative and only the clamped delta is applied. With
    /// split impulse enabled, each constraint additionally runs the
    /// position-correction projection against the split lanes, with the
    /// Baumgarte depth bias moved there.
    pub fn solve_penetration_constraints(&mut self, velocities: &mut VelocityBuffers) {
        debug_assert!(
            self.initialized,
            "solve_penetration_constraints before initialize_island"
        );

        let split_impulse = self.config.split_impulse;
        let beta = if split_impulse { BETA_SPLIT_IMPULSE } else { BETA };

        for c in &mut self.penetration_constraints {
            let v_a = velocities.linear[c.body_a];
            let w_a = velocities.angular[c.body_a];
            let v_b = velocities.linear[c.body_b];
            let w_b = velocities.angular[c.body_b];

            let delta_v = v_b + w_b.cross(&c.r_b) - v_a - w_a.cross(&c.r_a);
            let jv = delta_v.dot(&c.normal);

            let position_bias = if c.penetration > PENETRATION_SLOP {
                -(beta / self.dt) * (c.penetration - PENETRATION_SLOP).max(0.0)
            } else {
                0.0
            };

            let delta_lambda = if split_impulse {
                -(jv + c.restitution_bias) * c.inverse_normal_mass
            } else {
                -(jv + position_bias + c.restitution_bias) * c.inverse_normal_mass
            };

            let updated = (c.normal_impulse + delta_lambda).max(0.0);
            let applied = updated - c.normal_impulse;
            c.normal_impulse = updated;

            self.friction_constraints[c.friction_index].total_normal_impulse += c.normal_impulse;

            let linear = c.normal * applied;
            velocities.linear[c.body_a] -= linear * c.inverse_mass_a;
            velocities.angular[c.body_a] -= c.inverse_inertia_a * (c.r_a_cross_n * applied);
            velocities.linear[c.body_b] += linear * c.inverse_mass_b;
            velocities.angular[c.body_b] += c.inverse_inertia_b * (c.r_b_cross_n * applied);

            if split_impulse {
                let delta_v_split = velocities.split_linear[c.body_b]
                    + velocities.split_angular[c.body_b].cross(&c.r_b)
                    - velocities.split_linear[c.body_a]
                    - velocities.split_angular[c.body_a].cross(&c.r_a);
                let jv_split = delta_v_split.dot(&c.normal);

                let delta_split = -(jv_split + position_bias) * c.inverse_normal_mass;
                let updated_split = (c.split_impulse + delta_split).max(0.0);
                let applied_split = updated_split - c.split_impulse;
                c.split_impulse = updated_split;

                let linear_split = c.normal * applied_split;
                velocities.split_linear[c.body_a] -= linear_split * c.inverse_mass_a;
                velocities.split_angular[c.body_a] -=
                    c.inverse_inertia_a * (c.r_a_cross_n * applied_split);
                velocities.split_linear[c.body_b] += linear_split * c.inverse_mass_b;
                velocities.split_angular[c.body_b] +=
                    c.inverse_inertia_b * (c.r_b_cross_n * applied_split);
            }
        }
    }

    /// One Gauss-Seidel sweep over the friction constraints.
    ///
    /// Per manifold: both tangent directions, the twist about the
    /// normal, and (when enabled by a positive mixed factor) rolling
    /// resistance. Every accumulator is clamped against the Coulomb
    /// limit `mu * total_normal_impulse` from the preceding penetration
    /// sweep; rolling resistance clamps coordinate-wise.
    pub fn solve_friction_constraints(&mut self, velocities: &mut VelocityBuffers) {
        debug_assert!(
            self.initialized,
            "solve_friction_constraints before initialize_island"
        );

        for f in &mut self.friction_constraints {
            let mut v_a = velocities.linear[f.body_a];
            let mut w_a = velocities.angular[f.body_a];
            let mut v_b = velocities.linear[f.body_b];
            let mut w_b = velocities.angular[f.body_b];

            let friction_limit = f.friction_coefficient * f.total_normal_impulse;

            // First tangent direction.
            let delta_v = v_b + w_b.cross(&f.r_b) - v_a - w_a.cross(&f.r_a);
            let jv = delta_v.dot(&f.tangent1);
            let delta_lambda = -jv * f.inverse_tangent1_mass;
            let updated = clamp_symmetric(f.tangent_impulse1 + delta_lambda, friction_limit);
            let applied = updated - f.tangent_impulse1;
            f.tangent_impulse1 = updated;

            let linear = f.tangent1 * applied;
            v_a -= linear * f.inverse_mass_a;
            w_a -= f.inverse_inertia_a * (f.r_a_cross_t1 * applied);
            v_b += linear * f.inverse_mass_b;
            w_b += f.inverse_inertia_b * (f.r_b_cross_t1 * applied);

            // Second tangent direction.
            let delta_v = v_b + w_b.cross(&f.r_b) - v_a - w_a.cross(&f.r_a);
            let jv = delta_v.dot(&f.tangent2);
            let delta_lambda = -jv * f.inverse_tangent2_mass;
            let updated = clamp_symmetric(f.tangent_impulse2 + delta_lambda, friction_limit);
            let applied = updated - f.tangent_impulse2;
            f.tangent_impulse2 = updated;

            let linear = f.tangent2 * applied;
            v_a -= linear * f.inverse_mass_a;
            w_a -= f.inverse_inertia_a * (f.r_a_cross_t2 * applied);
            v_b += linear * f.inverse_mass_b;
            w_b += f.inverse_inertia_b * (f.r_b_cross_t2 * applied);

            // Twist about the manifold normal; purely angular.
            let jv = (w_b - w_a).dot(&f.normal);
            let delta_lambda = -jv * f.inverse_twist_mass;
            let updated = clamp_symmetric(f.twist_impulse + delta_lambda, friction_limit);
            let applied = updated - f.twist_impulse;
            f.twist_impulse = updated;

            let twist = f.normal * applied;
            w_a -= f.inverse_inertia_a * twist;
            w_b += f.inverse_inertia_b * twist;

            // Rolling resistance; purely angular, coordinate-wise clamp.
            if f.rolling_resistance > 0.0 {
                let jv_rolling = w_b - w_a;
                let delta = f.inverse_rolling_resistance * (-jv_rolling);
                let rolling_limit = f.rolling_resistance * f.total_normal_impulse;
                let updated = clamp_per_axis(&(f.rolling_impulse + delta), rolling_limit);
                let applied = updated - f.rolling_impulse;
                f.rolling_impulse = updated;

                w_a -= f.inverse_inertia_a * applied;
                w_b += f.inverse_inertia_b * applied;
            }

            velocities.linear[f.body_a] = v_a;
            velocities.angular[f.body_a] = w_a;
            velocities.linear[f.body_b] = v_b;
            velocities.angular[f.body_b] = w_b;
        }
    }

    /// Run `iterations` full solver iterations.
    ///
    /// Each iteration resets the per-manifold normal-impulse sums, then
    /// runs one penetration sweep and one friction sweep. Fixed
    /// iteration counts keep the solve deterministic and its cost
    /// predictable.
    pub fn solve(&mut self, iterations: usize, velocities: &mut VelocityBuffers) {
        for _ in 0..iterations {
            self.reset_total_penetration_impulse();
            self.solve_penetration_constraints(velocities);
            self.solve_friction_constraints(velocities);
        }
    }

    /// Write the accumulated impulses back onto the island.
    ///
    /// Stores each contact point's normal impulse and each manifold's
    /// friction impulses and tangent basis, for next-step warm starting.
    /// Must be called with the same island that was initialized.
    pub fn store_impulses(&self, island: &mut Island) {
        debug_assert!(self.initialized, "store_impulses before initialize_island");
        debug_assert_eq!(
            island.len(),
            self.stats.manifolds,
            "store_impulses island does not match the initialized island"
        );

        for c in &self.penetration_constraints {
            let manifold = &mut island.manifolds_mut()[c.manifold_index];
            manifold.points[c.point_index].normal_impulse = c.normal_impulse;
        }

        for f in &self.friction_constraints {
            let manifold = &mut island.manifolds_mut()[f.manifold_index];
            manifold.tangent_impulse1 = f.tangent_impulse1;
            manifold.tangent_impulse2 = f.tangent_impulse2;
            manifold.twist_impulse = f.twist_impulse;
            manifold.rolling_impulse = f.rolling_impulse;
            manifold.tangent1 = f.tangent1;
            manifold.tangent2 = f.tangent2;
        }

        tracing::trace!(
            manifolds = self.stats.manifolds,
            "stored contact impulses for warm starting"
        );
    }

    /// Drop the current island's constraint records.
    pub fn cleanup(&mut self) {
        self.penetration_constraints.clear();
        self.friction_constraints.clear();
        self.initialized = false;
    }
}
