//! Error types for solver operations.

use thiserror::Error;

use crate::{BodyId, Scalar};

/// Errors that can occur while preparing the solver for an island.
///
/// These are all precondition violations - programming errors on the
/// caller's side rather than runtime conditions to recover from. The
/// solver itself never fails once initialized; numerical degeneracies
/// are absorbed internally by zero-impulse substitution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// Non-positive or non-finite timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(Scalar),

    /// The island carries no contact manifolds.
    #[error("island has no contact manifolds")]
    EmptyIsland,

    /// A manifold carries no contact points.
    #[error("contact manifold {manifold} has no contact points")]
    EmptyManifold {
        /// Index of the offending manifold within the island.
        manifold: usize,
    },

    /// A body referenced by a manifold could not be resolved.
    #[error("{0} could not be resolved to a rigid body")]
    UnknownBody(BodyId),

    /// A body has no entry in the body-index map.
    #[error("{0} is not registered in the body-index map")]
    UnmappedBody(BodyId),

    /// A mapped body index falls outside the velocity buffers.
    #[error("body index {index} out of range for velocity buffers of length {len}")]
    IndexOutOfRange {
        /// The offending body index.
        index: usize,
        /// Length of the bound velocity buffers.
        len: usize,
    },

    /// Invalid solver configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl SolverError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error names a specific body.
    #[must_use]
    pub fn body(&self) -> Option<BodyId> {
        match self {
            Self::UnknownBody(id) | Self::UnmappedBody(id) => Some(*id),
            _ => None,
        }
    }
}
