//! Linear scale codec between raw integers and physical quantities.

use serde::{Deserialize, Serialize};

use super::{CodecError, CodecResult};
use crate::capability::CapabilityValue;

fn default_scale() -> f64 {
    1.0
}

/// Hard limits of a numeric setting, in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    /// UI step; not enforced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: None,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// `quantity = raw / scale`, `raw = round(quantity * scale)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericCodec {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Default for NumericCodec {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            bounds: None,
            unit: None,
        }
    }
}

impl NumericCodec {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Describe why this codec cannot round-trip values, if it cannot.
    pub fn check(&self) -> Result<(), String> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(format!("scale must be finite and positive, got {}", self.scale));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.min.is_finite() || !bounds.max.is_finite() || bounds.min > bounds.max {
                return Err(format!("empty bounds [{}, {}]", bounds.min, bounds.max));
            }
        }
        Ok(())
    }

    /// Device reports are taken as-is, never clamped to the bounds.
    pub fn decode(&self, raw: i64) -> CapabilityValue {
        CapabilityValue::Quantity(raw as f64 / self.scale)
    }

    /// Bounds are checked on the physical quantity, before scaling.
    pub fn encode(&self, quantity: f64) -> CodecResult<i64> {
        if !quantity.is_finite() {
            return Err(CodecError::OutOfRange(format!("{} is not finite", quantity)));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.contains(quantity) {
                return Err(CodecError::OutOfRange(format!(
                    "{} not in [{}, {}]",
                    quantity, bounds.min, bounds.max
                )));
            }
        }
        let raw = (quantity * self.scale).round();
        if raw < i64::MIN as f64 || raw > i64::MAX as f64 {
            return Err(CodecError::OutOfRange(format!(
                "{} overflows after scaling by {}",
                quantity, self.scale
            )));
        }
        Ok(raw as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn threshold() -> NumericCodec {
        NumericCodec::new(100.0)
            .with_bounds(Bounds::new(0.2, 3.0).with_step(0.1))
            .with_unit("°C")
    }

    #[test]
    fn test_decode_scales_down() {
        assert_eq!(threshold().decode(150), CapabilityValue::Quantity(1.5));
    }

    #[test]
    fn test_encode_rounds() {
        assert_eq!(threshold().encode(0.2).unwrap(), 20);
        assert_eq!(threshold().encode(1.234).unwrap(), 123);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let codec = threshold();
        assert_eq!(codec.encode(3.0).unwrap(), 300);
        assert_eq!(codec.encode(0.2).unwrap(), 20);
        assert!(matches!(codec.encode(3.0 + 0.1), Err(CodecError::OutOfRange(_))));
        assert!(matches!(codec.encode(0.1), Err(CodecError::OutOfRange(_))));
    }

    #[test]
    fn test_step_is_not_enforced() {
        // 0.25 is off the 0.1 grid but inside the bounds.
        assert_eq!(threshold().encode(0.25).unwrap(), 25);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(threshold().encode(f64::NAN).is_err());
        assert!(NumericCodec::default().encode(f64::INFINITY).is_err());
    }

    #[test]
    fn test_unbounded_codec() {
        let codec = NumericCodec::new(1000.0);
        assert_eq!(codec.encode(3600.0).unwrap(), 3_600_000);
        assert_eq!(codec.decode(500), CapabilityValue::Quantity(0.5));
    }

    #[test]
    fn test_check_rejects_degenerate_scale() {
        assert!(threshold().check().is_ok());
        assert!(NumericCodec::new(0.0).check().is_err());
        assert!(NumericCodec::new(-10.0).check().is_err());
        assert!(NumericCodec::new(f64::NAN).check().is_err());
        assert!(NumericCodec::new(f64::INFINITY).check().is_err());
        assert!(NumericCodec::default()
            .with_bounds(Bounds::new(5.0, 1.0))
            .check()
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_roundtrip_within_one_unit(quantity in 0.2f64..=3.0) {
            let codec = threshold();
            let raw = codec.encode(quantity).unwrap();
            let back = codec.decode(raw).as_f64().unwrap();
            prop_assert!((back - quantity).abs() <= 1.0 / codec.scale);
        }
    }
}
