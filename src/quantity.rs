//! Typed physical quantities for measurement results
//!
//! Instruments reply with a number and, on some dialects, a unit suffix such
//! as `KHZ` or `MV`. Callers choose at facade construction how readings come
//! back:
//!
//! - [`UnitMode::Pair`]: the raw `(value, suffix)` exactly as received
//! - [`UnitMode::Quantity`]: a [`Quantity`] with the suffix resolved into a
//!   metric prefix and base unit, so `1` + `KHZ` scales to 1000 Hz via
//!   [`Quantity::in_base`]

use std::fmt;

/// Base unit of a measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit
{
    Hertz,
    Volt,
    Ampere,
    Ohm,
    Second,
    Degree,
    Percent,
    Watt,
    /// The reply carried no recognizable unit suffix
    Unitless,
}

impl Unit
{
    pub fn notation(&self) -> &'static str
    {
        match self {
            Self::Hertz => "Hz",
            Self::Volt => "V",
            Self::Ampere => "A",
            Self::Ohm => "Ω",
            Self::Second => "s",
            Self::Degree => "°",
            Self::Percent => "%",
            Self::Watt => "W",
            Self::Unitless => "",
        }
    }
}

/// Metric prefix carried by a unit suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix
{
    Nano,
    Micro,
    Milli,
    Base,
    Kilo,
    Mega,
}

impl Prefix
{
    pub fn multiplier(&self) -> f64
    {
        match self {
            Self::Nano => 1e-9,
            Self::Micro => 1e-6,
            Self::Milli => 1e-3,
            Self::Base => 1.0,
            Self::Kilo => 1e3,
            Self::Mega => 1e6,
        }
    }

    pub fn notation(&self) -> &'static str
    {
        match self {
            Self::Nano => "n",
            Self::Micro => "µ",
            Self::Milli => "m",
            Self::Base => "",
            Self::Kilo => "k",
            Self::Mega => "M",
        }
    }

    /// Resolves a reply's unit suffix into a prefix
    ///
    /// Case-insensitive substring scan. Markers are checked longest-first so
    /// that `MHZ` resolves to mega before the bare `M` of millivolts can
    /// shadow it.
    pub fn classify(suffix: &str) -> Self
    {
        const MARKERS: &[(&str, Prefix)] = &[
            ("KHZ", Prefix::Kilo),
            ("MHZ", Prefix::Mega),
            ("MV", Prefix::Milli),
            ("UV", Prefix::Micro),
            ("US", Prefix::Micro),
            ("MS", Prefix::Milli),
            ("NS", Prefix::Nano),
        ];

        let upper = suffix.to_ascii_uppercase();

        for (marker, prefix) in MARKERS {
            if upper.contains(marker) {
                return *prefix;
            }
        }

        Prefix::Base
    }
}

/// A value with its resolved prefix and base unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity
{
    pub value: f64,
    pub prefix: Prefix,
    pub unit: Unit,
}

impl Quantity
{
    pub fn new(value: f64, prefix: Prefix, unit: Unit) -> Self
    {
        Self {
            value: value,
            prefix: prefix,
            unit: unit,
        }
    }

    /// The value scaled into the base unit, e.g. `1 kHz` -> `1000.0`
    pub fn in_base(&self) -> f64
    {
        self.value * self.prefix.multiplier()
    }
}

impl fmt::Display for Quantity
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} {}{}", self.value, self.prefix.notation(), self.unit.notation())
    }
}

/// How a facade renders readings back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitMode
{
    /// Raw `(value, suffix)` pair, suffix exactly as the device sent it
    #[default]
    Pair,
    /// Resolved [`Quantity`]
    Quantity,
}

/// A measurement rendered according to the facade's [`UnitMode`]
#[derive(Debug, Clone, PartialEq)]
pub enum Reading
{
    Pair(f64, String),
    Quantity(Quantity),
}

impl Reading
{
    /// Builds a reading from a parsed value and raw suffix, resolving the
    /// suffix only when the mode asks for typed quantities
    pub fn from_parts(mode: UnitMode, value: f64, suffix: String, base_unit: Unit) -> Self
    {
        match mode {
            UnitMode::Pair => Self::Pair(value, suffix),
            UnitMode::Quantity => {
                let unit = if suffix.is_empty() { Unit::Unitless } else { base_unit };
                Self::Quantity(Quantity::new(value, Prefix::classify(&suffix), unit))
            }
        }
    }

    /// The numeric value scaled to the base unit where known
    pub fn in_base(&self) -> f64
    {
        match self {
            Self::Pair(value, suffix) => value * Prefix::classify(suffix).multiplier(),
            Self::Quantity(quantity) => quantity.in_base(),
        }
    }

    /// The value exactly as parsed, without prefix scaling
    pub fn raw_value(&self) -> f64
    {
        match self {
            Self::Pair(value, _) => *value,
            Self::Quantity(quantity) => quantity.value,
        }
    }
}
