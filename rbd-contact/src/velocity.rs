//! Velocity buffers and the body-index map.
//!
//! The solver never owns body velocities. The timestep driver keeps
//! them in four dense lanes indexed by body index - regular linear and
//! angular velocities, plus the split-impulse lanes used exclusively
//! for position correction - and lends the whole set to the solver for
//! one step at a time. [`BodyIndexMap`] translates body handles into
//! those dense indices.

use std::collections::HashMap;

use nalgebra::Vector3;

use rbd_types::{BodyId, Scalar};

/// The four dense velocity lanes the solver reads and writes in place.
///
/// All four lanes share the same length and indexing: the body index
/// assigned through the [`BodyIndexMap`]. The split lanes accumulate
/// pure position-correction velocity and must be consumed (and cleared)
/// by the integrator each step; they never feed back into the regular
/// lanes.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityBuffers {
    /// Linear velocities (m/s).
    pub linear: Vec<Vector3<Scalar>>,
    /// Angular velocities (rad/s).
    pub angular: Vec<Vector3<Scalar>>,
    /// Split-impulse linear velocities, position correction only.
    pub split_linear: Vec<Vector3<Scalar>>,
    /// Split-impulse angular velocities, position correction only.
    pub split_angular: Vec<Vector3<Scalar>>,
}

impl VelocityBuffers {
    /// Create zeroed buffers for `body_count` bodies.
    #[must_use]
    pub fn new(body_count: usize) -> Self {
        Self {
            linear: vec![Vector3::zeros(); body_count],
            angular: vec![Vector3::zeros(); body_count],
            split_linear: vec![Vector3::zeros(); body_count],
            split_angular: vec![Vector3::zeros(); body_count],
        }
    }

    /// Number of bodies the buffers cover.
    #[must_use]
    pub fn len(&self) -> usize {
        self.linear.len()
    }

    /// Check if the buffers cover no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.linear.is_empty()
    }

    /// Velocity of a material point at offset `r` from the body's COM.
    ///
    /// `v + omega x r`, read from the regular lanes.
    #[must_use]
    pub fn velocity_at_point(&self, index: usize, r: &Vector3<Scalar>) -> Vector3<Scalar> {
        self.linear[index] + self.angular[index].cross(r)
    }

    /// Zero the split-impulse lanes.
    ///
    /// The integrator calls this after consuming the position
    /// correction, before the next step's solve.
    pub fn reset_split(&mut self) {
        for v in &mut self.split_linear {
            *v = Vector3::zeros();
        }
        for w in &mut self.split_angular {
            *w = Vector3::zeros();
        }
    }

    /// Check that no lane contains `NaN` or `Inf`.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        let finite = |lane: &[Vector3<Scalar>]| lane.iter().all(|v| v.iter().all(|x| x.is_finite()));
        finite(&self.linear)
            && finite(&self.angular)
            && finite(&self.split_linear)
            && finite(&self.split_angular)
    }
}

/// Lookup from body handles to dense velocity-array indices.
///
/// Installed on the solver before initialization; read-only to the
/// solver afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyIndexMap {
    map: HashMap<BodyId, usize>,
}

impl BodyIndexMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body at the given dense index.
    ///
    /// Returns the previous index if the body was already registered.
    pub fn insert(&mut self, body: BodyId, index: usize) -> Option<usize> {
        self.map.insert(body, index)
    }

    /// Look up the dense index for a body.
    #[must_use]
    pub fn get(&self, body: BodyId) -> Option<usize> {
        self.map.get(&body).copied()
    }

    /// Check if a body is registered.
    #[must_use]
    pub fn contains(&self, body: BodyId) -> bool {
        self.map.contains_key(&body)
    }

    /// Number of registered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no bodies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(BodyId, usize)> for BodyIndexMap {
    fn from_iter<T: IntoIterator<Item = (BodyId, usize)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
