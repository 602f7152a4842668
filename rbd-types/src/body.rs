//! Body handles and the solver-facing rigid-body view.
//!
//! The contact solver never owns bodies. It consumes a snapshot of the
//! handful of attributes it needs - world center of mass, inverse mass,
//! world-space inverse inertia tensor, mobility class, and surface
//! material - through [`RigidBody`].

use nalgebra::{Matrix3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Material, Scalar};

/// Unique identifier for a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Mobility class of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyType {
    /// Moved by the solver: gravity, constraints, impulses.
    #[default]
    Dynamic,
    /// Moved by user code; pushes dynamic bodies but never reacts.
    Kinematic,
    /// Never moves.
    Fixed,
}

/// Read-only view of a rigid body as consumed by the contact solver.
///
/// Non-dynamic bodies carry zero inverse mass and zero inverse inertia;
/// the provided constructors enforce this. The inertia tensor is the
/// **world-space inverse** - callers rotate the local tensor into world
/// frame before handing bodies to the solver, once per step.
///
/// # Example
///
/// ```
/// use nalgebra::{Matrix3, Point3};
/// use rbd_types::RigidBody;
///
/// let ball = RigidBody::dynamic(Point3::new(0.0, 1.0, 0.0), 1.0, Matrix3::identity());
/// let floor = RigidBody::fixed(Point3::origin());
///
/// assert!(ball.is_dynamic());
/// assert_eq!(floor.inverse_mass, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Mobility class.
    pub body_type: BodyType,
    /// Center of mass in world coordinates.
    pub center_of_mass: Point3<Scalar>,
    /// Inverse mass in 1/kg (0 for kinematic and fixed bodies).
    pub inverse_mass: Scalar,
    /// Inverse inertia tensor in world coordinates (zero for kinematic
    /// and fixed bodies).
    pub inverse_inertia_world: Matrix3<Scalar>,
    /// Surface material.
    pub material: Material,
}

impl RigidBody {
    /// Create a dynamic body from its mass and world-space inertia tensor.
    ///
    /// A non-positive or non-finite mass yields zero inverse mass; a
    /// singular inertia tensor yields a zero inverse tensor. Degenerate
    /// axes simply produce no angular response.
    #[must_use]
    pub fn dynamic(
        center_of_mass: Point3<Scalar>,
        mass: Scalar,
        inertia_world: Matrix3<Scalar>,
    ) -> Self {
        let inverse_mass = if mass > 0.0 && mass.is_finite() {
            1.0 / mass
        } else {
            0.0
        };
        let inverse_inertia_world = inertia_world.try_inverse().unwrap_or_else(Matrix3::zeros);

        Self {
            body_type: BodyType::Dynamic,
            center_of_mass,
            inverse_mass,
            inverse_inertia_world,
            material: Material::default(),
        }
    }

    /// Create a fixed (immovable) body.
    #[must_use]
    pub fn fixed(center_of_mass: Point3<Scalar>) -> Self {
        Self {
            body_type: BodyType::Fixed,
            center_of_mass,
            inverse_mass: 0.0,
            inverse_inertia_world: Matrix3::zeros(),
            material: Material::default(),
        }
    }

    /// Create a kinematic body (script-driven, infinite effective mass).
    #[must_use]
    pub fn kinematic(center_of_mass: Point3<Scalar>) -> Self {
        Self {
            body_type: BodyType::Kinematic,
            ..Self::fixed(center_of_mass)
        }
    }

    /// Replace the surface material.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Check if the body is dynamic.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Check if the body is kinematic.
    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }

    /// Check if the body is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.body_type == BodyType::Fixed
    }
}

/// Inertia tensor of a solid sphere about its center: I = (2/5) m r².
#[must_use]
pub fn solid_sphere_inertia(mass: Scalar, radius: Scalar) -> Matrix3<Scalar> {
    let i = 0.4 * mass * radius * radius;
    Matrix3::from_diagonal(&Vector3::new(i, i, i))
}

/// Inertia tensor of a solid box about its center.
///
/// For full extents (x, y, z) = 2 * `half_extents`:
/// - Ixx = (1/12) m (y² + z²)
/// - Iyy = (1/12) m (x² + z²)
/// - Izz = (1/12) m (x² + y²)
#[must_use]
pub fn solid_box_inertia(mass: Scalar, half_extents: Vector3<Scalar>) -> Matrix3<Scalar> {
    let x2 = 4.0 * half_extents.x * half_extents.x;
    let y2 = 4.0 * half_extents.y * half_extents.y;
    let z2 = 4.0 * half_extents.z * half_extents.z;

    Matrix3::from_diagonal(&Vector3::new(
        mass * (y2 + z2) / 12.0,
        mass * (x2 + z2) / 12.0,
        mass * (x2 + y2) / 12.0,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_id() {
        let id = BodyId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "body#7");

        let id2: BodyId = 7.into();
        assert_eq!(id, id2);
    }

    #[test]
    fn test_dynamic_inverse_mass() {
        let body = RigidBody::dynamic(Point3::origin(), 4.0, Matrix3::identity());
        assert_relative_eq!(body.inverse_mass, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_infinite_mass_treated_as_immovable() {
        let body = RigidBody::dynamic(Point3::origin(), Scalar::INFINITY, Matrix3::identity());
        assert_eq!(body.inverse_mass, 0.0);
    }

    #[test]
    fn test_singular_inertia_zeroed() {
        let body = RigidBody::dynamic(Point3::origin(), 1.0, Matrix3::zeros());
        assert_eq!(body.inverse_inertia_world, Matrix3::zeros());
    }

    #[test]
    fn test_kinematic_and_fixed_are_immovable() {
        for body in [
            RigidBody::fixed(Point3::origin()),
            RigidBody::kinematic(Point3::origin()),
        ] {
            assert_eq!(body.inverse_mass, 0.0);
            assert_eq!(body.inverse_inertia_world, Matrix3::zeros());
            assert!(!body.is_dynamic());
        }
    }

    #[test]
    fn test_sphere_inertia() {
        let inertia = solid_sphere_inertia(1.0, 1.0);
        assert_relative_eq!(inertia[(0, 0)], 0.4, epsilon = 1e-12);
        assert_relative_eq!(inertia[(1, 1)], 0.4, epsilon = 1e-12);
        assert_relative_eq!(inertia[(2, 2)], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_box_inertia() {
        // A 1x1x1 cube of mass 12 has I = (1/12) * 12 * (1 + 1) = 2 on each axis.
        let inertia = solid_box_inertia(12.0, Vector3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(inertia[(0, 0)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(inertia[(2, 2)], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_cube_inertia_is_identity_scaled() {
        // Mass 6 unit cube: I = (1/12) * 6 * 2 = 1.
        let inertia = solid_box_inertia(6.0, Vector3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(inertia[(0, 0)], 1.0, epsilon = 1e-12);
    }
}
