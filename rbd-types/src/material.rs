//! Surface materials and contact-pair mixing rules.
//!
//! A contact couples two bodies with possibly different surface
//! properties; the solver needs a single restitution, friction, and
//! rolling-resistance value per manifold. How the two sides combine is
//! an engine policy, expressed here as a [`MixRule`] per property so it
//! stays pluggable without trait machinery.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Scalar;

/// Surface properties of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution (bounciness), in [0, 1].
    pub restitution: Scalar,
    /// Coulomb friction coefficient, >= 0.
    pub friction: Scalar,
    /// Rolling resistance factor, >= 0 (0 disables the constraint).
    pub rolling_resistance: Scalar,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            friction: 0.3,
            rolling_resistance: 0.0,
        }
    }
}

impl Material {
    /// Create a material with the given properties.
    #[must_use]
    pub const fn new(restitution: Scalar, friction: Scalar, rolling_resistance: Scalar) -> Self {
        Self {
            restitution,
            friction,
            rolling_resistance,
        }
    }

    /// A perfectly inelastic, frictionless material.
    #[must_use]
    pub const fn frictionless() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Validate that all properties are in range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err("restitution must be in [0, 1]");
        }
        if !(self.friction >= 0.0 && self.friction.is_finite()) {
            return Err("friction must be non-negative and finite");
        }
        if !(self.rolling_resistance >= 0.0 && self.rolling_resistance.is_finite()) {
            return Err("rolling resistance must be non-negative and finite");
        }
        Ok(())
    }
}

/// How a scalar property of two touching surfaces combines into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MixRule {
    /// The smaller of the two values.
    Minimum,
    /// The larger of the two values.
    Maximum,
    /// Arithmetic mean.
    Average,
    /// Geometric mean, sqrt(a * b).
    GeometricMean,
    /// Product of the two values.
    Multiply,
}

impl MixRule {
    /// Combine two property values under this rule.
    #[must_use]
    pub fn apply(self, a: Scalar, b: Scalar) -> Scalar {
        match self {
            Self::Minimum => a.min(b),
            Self::Maximum => a.max(b),
            Self::Average => 0.5 * (a + b),
            Self::GeometricMean => (a * b).sqrt(),
            Self::Multiply => a * b,
        }
    }
}

/// Per-property mixing rules for a contact pair.
///
/// The defaults reproduce the common engine policy: the bouncier
/// surface wins, friction combines as a geometric mean, and rolling
/// resistance averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixingRules {
    /// Rule for the restitution coefficient.
    pub restitution: MixRule,
    /// Rule for the friction coefficient.
    pub friction: MixRule,
    /// Rule for the rolling-resistance factor.
    pub rolling_resistance: MixRule,
}

impl Default for MixingRules {
    fn default() -> Self {
        Self {
            restitution: MixRule::Maximum,
            friction: MixRule::GeometricMean,
            rolling_resistance: MixRule::Average,
        }
    }
}

impl MixingRules {
    /// Combine the materials of the two bodies of a contact pair.
    #[must_use]
    pub fn mix(&self, a: &Material, b: &Material) -> Material {
        Material {
            restitution: self.restitution.apply(a.restitution, b.restitution),
            friction: self.friction.apply(a.friction, b.friction),
            rolling_resistance: self
                .rolling_resistance
                .apply(a.rolling_resistance, b.rolling_resistance),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mix_rules() {
        assert_eq!(MixRule::Minimum.apply(0.2, 0.8), 0.2);
        assert_eq!(MixRule::Maximum.apply(0.2, 0.8), 0.8);
        assert_relative_eq!(MixRule::Average.apply(0.2, 0.8), 0.5, epsilon = 1e-12);
        assert_relative_eq!(MixRule::GeometricMean.apply(0.4, 0.9), 0.6, epsilon = 1e-12);
        assert_relative_eq!(MixRule::Multiply.apply(0.5, 0.5), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_geometric_mean_with_zero_kills_friction() {
        // An ice-like surface with zero friction should dominate the pair.
        let rules = MixingRules::default();
        let ice = Material::new(0.0, 0.0, 0.0);
        let rubber = Material::new(0.9, 1.2, 0.01);

        assert_eq!(rules.mix(&ice, &rubber).friction, 0.0);
    }

    #[test]
    fn test_mixing_is_symmetric() {
        let rules = MixingRules::default();
        let a = Material::new(0.1, 0.5, 0.02);
        let b = Material::new(0.7, 0.8, 0.04);

        assert_eq!(rules.mix(&a, &b), rules.mix(&b, &a));
    }

    #[test]
    fn test_material_validation() {
        assert!(Material::default().validate().is_ok());
        assert!(Material::frictionless().validate().is_ok());

        assert!(Material::new(1.5, 0.3, 0.0).validate().is_err());
        assert!(Material::new(0.5, -0.1, 0.0).validate().is_err());
        assert!(Material::new(0.5, 0.3, -0.1).validate().is_err());
    }
}
