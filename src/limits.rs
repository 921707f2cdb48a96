//! Output parameter limit checking for signal generators
//!
//! Every generator setter validates against these ranges before anything is
//! written to the device. The bounds start at the family's factory values and
//! may be tightened (or widened -- at the caller's own risk) one bound at a
//! time. Changing a bound emits a `warn!` advisory since it moves the safety
//! net for every later setter call.
//!
//! Bounds are taken exactly as given: `min <= max` is not enforced, and an
//! inverted pair simply rejects every value until corrected or reset.

use crate::error::ValidationError;

/// Quantities guarded by a [`ParameterLimits`] set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedQuantity
{
    Frequency,
    Amplitude,
    Offset,
    Phase,
}

impl LimitedQuantity
{
    fn label(&self) -> &'static str
    {
        match self {
            Self::Frequency => "frequency",
            Self::Amplitude => "amplitude",
            Self::Offset => "offset",
            Self::Phase => "phase",
        }
    }
}

/// An inclusive `[min, max]` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range
{
    pub min: f64,
    pub max: f64,
}

impl Range
{
    pub const fn new(min: f64, max: f64) -> Self
    {
        Self {
            min: min,
            max: max,
        }
    }

    fn contains(&self, value: f64) -> bool
    {
        self.min <= value && value <= self.max
    }
}

/// Factory bounds for one generator family
#[derive(Debug, Clone, Copy)]
pub struct FactoryLimits
{
    pub frequency: Range,
    pub amplitude: Range,
    pub offset: Range,
    pub phase: Range,
}

/// Factory bounds of the SDG-series generators
pub const SDG_FACTORY_LIMITS: FactoryLimits = FactoryLimits {
    frequency: Range::new(1e-6, 4e7),
    amplitude: Range::new(0.002, 20.0),
    offset: Range::new(-10.0, 10.0),
    phase: Range::new(0.0, 360.0),
};

/// Factory bounds of the PM5139 function generator
pub const PM5139_FACTORY_LIMITS: FactoryLimits = FactoryLimits {
    frequency: Range::new(1e-4, 2e7),
    amplitude: Range::new(0.0, 20.0),
    offset: Range::new(-10.0, 10.0),
    phase: Range::new(0.0, 360.0),
};

/// The mutable limit set carried by a generator facade
#[derive(Debug, Clone)]
pub struct ParameterLimits
{
    frequency: Range,
    amplitude: Range,
    offset: Range,
    phase: Range,
    factory: FactoryLimits,
}

impl ParameterLimits
{
    pub fn with_factory(factory: FactoryLimits) -> Self
    {
        Self {
            frequency: factory.frequency,
            amplitude: factory.amplitude,
            offset: factory.offset,
            phase: factory.phase,
            factory: factory,
        }
    }

    pub fn range(&self, quantity: LimitedQuantity) -> Range
    {
        match quantity {
            LimitedQuantity::Frequency => self.frequency,
            LimitedQuantity::Amplitude => self.amplitude,
            LimitedQuantity::Offset => self.offset,
            LimitedQuantity::Phase => self.phase,
        }
    }

    pub fn set_min(&mut self, quantity: LimitedQuantity, min: f64)
    {
        log::warn!(
            "changing {} lower limit to {}; later setter calls validate against the new bound",
            quantity.label(),
            min
        );
        self.range_mut(quantity).min = min;
    }

    pub fn set_max(&mut self, quantity: LimitedQuantity, max: f64)
    {
        log::warn!(
            "changing {} upper limit to {}; later setter calls validate against the new bound",
            quantity.label(),
            max
        );
        self.range_mut(quantity).max = max;
    }

    /// Restores every bound to the family factory values
    pub fn reset_to_defaults(&mut self)
    {
        self.frequency = self.factory.frequency;
        self.amplitude = self.factory.amplitude;
        self.offset = self.factory.offset;
        self.phase = self.factory.phase;
    }

    /// Rejects `value` when it falls outside the current bounds
    pub fn check(&self, quantity: LimitedQuantity, value: f64) -> Result<(), ValidationError>
    {
        let range = self.range(quantity);

        if range.contains(value) {
            Ok(())
        }
        else {
            Err(ValidationError::OutOfRange {
                quantity: quantity.label(),
                value: value,
                min: range.min,
                max: range.max,
            })
        }
    }

    fn range_mut(&mut self, quantity: LimitedQuantity) -> &mut Range
    {
        match quantity {
            LimitedQuantity::Frequency => &mut self.frequency,
            LimitedQuantity::Amplitude => &mut self.amplitude,
            LimitedQuantity::Offset => &mut self.offset,
            LimitedQuantity::Phase => &mut self.phase,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn factory_bounds_accept_in_range_values()
    {
        let limits = ParameterLimits::with_factory(SDG_FACTORY_LIMITS);
        assert!(limits.check(LimitedQuantity::Frequency, 1000.0).is_ok());
        assert!(limits.check(LimitedQuantity::Frequency, 1e-6).is_ok());
        assert!(limits.check(LimitedQuantity::Frequency, 4e7).is_ok());
        assert!(limits.check(LimitedQuantity::Phase, 360.0).is_ok());
    }

    #[test]
    fn out_of_range_names_quantity_and_bounds()
    {
        let limits = ParameterLimits::with_factory(SDG_FACTORY_LIMITS);

        match limits.check(LimitedQuantity::Amplitude, 25.0).unwrap_err() {
            ValidationError::OutOfRange { quantity, value, min, max } => {
                assert_eq!(quantity, "amplitude");
                assert_eq!(value, 25.0);
                assert_eq!(min, 0.002);
                assert_eq!(max, 20.0);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn tightened_bound_applies_to_later_checks()
    {
        let mut limits = ParameterLimits::with_factory(SDG_FACTORY_LIMITS);
        limits.set_max(LimitedQuantity::Frequency, 1e6);

        assert!(limits.check(LimitedQuantity::Frequency, 2e6).is_err());
        assert!(limits.check(LimitedQuantity::Frequency, 5e5).is_ok());
    }

    #[test]
    fn inverted_bounds_reject_everything()
    {
        let mut limits = ParameterLimits::with_factory(SDG_FACTORY_LIMITS);
        limits.set_min(LimitedQuantity::Offset, 5.0);
        limits.set_max(LimitedQuantity::Offset, -5.0);

        for value in [-10.0, 0.0, 10.0] {
            assert!(limits.check(LimitedQuantity::Offset, value).is_err());
        }
    }

    #[test]
    fn reset_restores_factory_values()
    {
        let mut limits = ParameterLimits::with_factory(PM5139_FACTORY_LIMITS);
        limits.set_max(LimitedQuantity::Amplitude, 1.0);
        limits.reset_to_defaults();

        assert_eq!(limits.range(LimitedQuantity::Amplitude), Range::new(0.0, 20.0));
        assert_eq!(limits.range(LimitedQuantity::Frequency), Range::new(1e-4, 2e7));
    }
}
