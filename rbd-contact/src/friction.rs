//! Tangent-plane helpers for the friction sweep.

use nalgebra::Vector3;

use rbd_types::Scalar;

/// A unit vector orthogonal to `n`, chosen deterministically.
///
/// `n` must be non-zero. Crosses `n` with whichever reference axis it
/// is least aligned with, so the result stays well-conditioned.
#[must_use]
pub fn one_unit_orthogonal(n: &Vector3<Scalar>) -> Vector3<Scalar> {
    let axis = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    n.cross(&axis).normalize()
}

/// Compute the orthonormal tangent basis `(t1, t2)` for a contact normal.
///
/// `t1` is aligned with the tangential part of `relative_velocity` when
/// there is one, so the first friction direction opposes the actual
/// slide. With no tangential motion, `t1` falls back to a deterministic
/// orthogonal of the normal. In both cases `t2 = n x t1`, which makes
/// `t1 x t2 = n`.
#[must_use]
pub fn compute_tangent_basis(
    normal: &Vector3<Scalar>,
    relative_velocity: &Vector3<Scalar>,
) -> (Vector3<Scalar>, Vector3<Scalar>) {
    let normal_velocity = normal * relative_velocity.dot(normal);
    let tangent_velocity = relative_velocity - normal_velocity;

    let speed = tangent_velocity.norm();
    let tangent1 = if speed > Scalar::EPSILON {
        tangent_velocity / speed
    } else {
        one_unit_orthogonal(normal)
    };
    let tangent2 = normal.cross(&tangent1).normalize();

    (tangent1, tangent2)
}

/// Clamp a scalar impulse into the symmetric interval `[-limit, limit]`.
///
/// `limit` must be non-negative; it is `mu * total_normal_impulse` at
/// the call sites, which the penetration sweep keeps >= 0.
#[must_use]
pub(crate) fn clamp_symmetric(value: Scalar, limit: Scalar) -> Scalar {
    value.clamp(-limit, limit)
}

/// Clamp each component of an impulse vector into `[-limit, limit]`.
///
/// The rolling-resistance contract is a coordinate-wise (L-infinity)
/// clamp, not a projection onto the L2 ball.
#[must_use]
pub(crate) fn clamp_per_axis(v: &Vector3<Scalar>, limit: Scalar) -> Vector3<Scalar> {
    Vector3::new(
        v.x.clamp(-limit, limit),
        v.y.clamp(-limit, limit),
        v.z.clamp(-limit, limit),
    )
}
