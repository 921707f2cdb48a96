//! Uniform command selections and per-family dialect tokens
//!
//! Every instrument family here is driven through the same small set of
//! selection enums. Each family owns a static [`CapabilityMap`] translating a
//! selection into its dialect token; a selection with no entry is rejected
//! with a [`ValidationError::Unsupported`] naming the family and what it does
//! accept, before anything touches the wire.

use crate::error::ValidationError;
use std::fmt;

/// Measurement function of a bench multimeter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function
{
    VoltsDc,
    VoltsAc,
    VoltsAcDc,
    CurrentDc,
    CurrentAc,
    CurrentAcDc,
    Resistance,
    Frequency,
    Diode,
    Continuity,
}

impl fmt::Display for Function
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::VoltsDc => "VDC",
            Self::VoltsAc => "VAC",
            Self::VoltsAcDc => "VACDC",
            Self::CurrentDc => "ADC",
            Self::CurrentAc => "AAC",
            Self::CurrentAcDc => "AACDC",
            Self::Resistance => "OHMS",
            Self::Frequency => "FREQ",
            Self::Diode => "DIODE",
            Self::Continuity => "CONT",
        };
        f.write_str(name)
    }
}

/// Function shown on the secondary display of dual-display meters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryFunction
{
    VoltsDc,
    VoltsAc,
    CurrentDc,
    CurrentAc,
    Resistance,
    Frequency,
    Diode,
    /// Blank the secondary display
    Clear,
}

impl fmt::Display for SecondaryFunction
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::VoltsDc => "VDC2",
            Self::VoltsAc => "VAC2",
            Self::CurrentDc => "ADC2",
            Self::CurrentAc => "AAC2",
            Self::Resistance => "OHMS2",
            Self::Frequency => "FREQ2",
            Self::Diode => "DIODE2",
            Self::Clear => "CLR2",
        };
        f.write_str(name)
    }
}

/// Reading rate, traded against resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate
{
    Slow,
    Medium,
    Fast,
}

impl fmt::Display for Rate
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::Slow => "SLOW",
            Self::Medium => "MEDIUM",
            Self::Fast => "FAST",
        };
        f.write_str(name)
    }
}

/// Measurement trigger source of the dual-display meters
///
/// The numeric codes are the `TRIGGER <n>` arguments of the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode
{
    /// Continuous internal triggering
    Internal,
    ExternalNoDelay,
    ExternalDelay,
    ExternalRearNoDelay,
    ExternalRearDelay,
}

impl TriggerMode
{
    pub fn code(&self) -> u8
    {
        match self {
            Self::Internal => 1,
            Self::ExternalNoDelay => 2,
            Self::ExternalDelay => 3,
            Self::ExternalRearNoDelay => 4,
            Self::ExternalRearDelay => 5,
        }
    }
}

/// Output waveform shape of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform
{
    Sine,
    Square,
    Ramp,
    Pulse,
    Noise,
    Arb,
    Dc,
    Prbs,
    Iq,
}

impl fmt::Display for Waveform
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::Sine => "SINE",
            Self::Square => "SQUARE",
            Self::Ramp => "RAMP",
            Self::Pulse => "PULSE",
            Self::Noise => "NOISE",
            Self::Arb => "ARB",
            Self::Dc => "DC",
            Self::Prbs => "PRBS",
            Self::Iq => "IQ",
        };
        f.write_str(name)
    }
}

/// Output channel of a multi-channel power supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsuChannel
{
    Ch1,
    Ch2,
    Ch3,
}

impl PsuChannel
{
    pub fn number(&self) -> u32
    {
        match self {
            Self::Ch1 => 1,
            Self::Ch2 => 2,
            Self::Ch3 => 3,
        }
    }
}

impl fmt::Display for PsuChannel
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "CH{}", self.number())
    }
}

/// Translates uniform selections into one family's dialect tokens
pub struct CapabilityMap<K: 'static>
{
    family: &'static str,
    entries: &'static [(K, &'static str)],
}

impl<K> CapabilityMap<K>
    where K: Copy + PartialEq + fmt::Display
{
    pub const fn new(family: &'static str, entries: &'static [(K, &'static str)]) -> Self
    {
        Self {
            family: family,
            entries: entries,
        }
    }

    /// The dialect token for `selection`, or `Unsupported` naming what the
    /// family does accept
    pub fn token(&self, selection: K) -> Result<&'static str, ValidationError>
    {
        for (candidate, token) in self.entries {
            if *candidate == selection {
                return Ok(token);
            }
        }

        Err(ValidationError::Unsupported {
            requested: selection.to_string(),
            family: self.family,
            supported: self.supported(),
        })
    }

    /// Reverse lookup used when decoding device replies
    pub fn selection(&self, token: &str) -> Option<K>
    {
        self.entries
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(token))
            .map(|(selection, _)| *selection)
    }

    /// Comma-joined uniform names of every supported selection
    pub fn supported(&self) -> String
    {
        let names: Vec<String> = self.entries.iter().map(|(selection, _)| selection.to_string()).collect();
        names.join(", ")
    }

    pub fn family(&self) -> &'static str
    {
        self.family
    }
}

/// Dual-display meter function words
pub static FLUKE45_FUNCTIONS: CapabilityMap<Function> = CapabilityMap::new(
    "Fluke 45",
    &[
        (Function::VoltsDc, "VDC"),
        (Function::VoltsAc, "VAC"),
        (Function::VoltsAcDc, "VACDC"),
        (Function::CurrentDc, "ADC"),
        (Function::CurrentAc, "AAC"),
        (Function::CurrentAcDc, "AACDC"),
        (Function::Resistance, "OHMS"),
        (Function::Frequency, "FREQ"),
        (Function::Diode, "DIODE"),
        (Function::Continuity, "CONT"),
    ],
);

/// Dual-display meter secondary-display words
pub static FLUKE45_SECONDARY: CapabilityMap<SecondaryFunction> = CapabilityMap::new(
    "Fluke 45",
    &[
        (SecondaryFunction::VoltsDc, "VDC2"),
        (SecondaryFunction::VoltsAc, "VAC2"),
        (SecondaryFunction::CurrentDc, "ADC2"),
        (SecondaryFunction::CurrentAc, "AAC2"),
        (SecondaryFunction::Resistance, "OHMS2"),
        (SecondaryFunction::Frequency, "FREQ2"),
        (SecondaryFunction::Diode, "DIODE2"),
        (SecondaryFunction::Clear, "CLR2"),
    ],
);

/// Dual-display meter `RATE` arguments
pub static FLUKE45_RATES: CapabilityMap<Rate> = CapabilityMap::new(
    "Fluke 45",
    &[
        (Rate::Slow, "S"),
        (Rate::Medium, "M"),
        (Rate::Fast, "F"),
    ],
);

/// SCPI meter `CONF:` subsystem names
///
/// Combined AC+DC and continuity have no SCPI equivalent on this family and
/// are deliberately absent.
pub static SCPI_DMM_FUNCTIONS: CapabilityMap<Function> = CapabilityMap::new(
    "Fluke 8845A/8846A",
    &[
        (Function::VoltsDc, "VOLT:DC"),
        (Function::VoltsAc, "VOLT:AC"),
        (Function::CurrentDc, "CURR:DC"),
        (Function::CurrentAc, "CURR:AC"),
        (Function::Resistance, "RES"),
        (Function::Frequency, "FREQ"),
        (Function::Diode, "DIOD"),
    ],
);

/// SCPI meter integration times in power line cycles
pub static SCPI_DMM_RATES: CapabilityMap<Rate> = CapabilityMap::new(
    "Fluke 8845A/8846A",
    &[
        (Rate::Slow, "10"),
        (Rate::Medium, "1"),
        (Rate::Fast, "0.2"),
    ],
);

/// SDG-series waveform names (the dialect uses the uniform names directly)
pub static SDG_WAVEFORMS: CapabilityMap<Waveform> = CapabilityMap::new(
    "Siglent SDG",
    &[
        (Waveform::Sine, "SINE"),
        (Waveform::Square, "SQUARE"),
        (Waveform::Ramp, "RAMP"),
        (Waveform::Pulse, "PULSE"),
        (Waveform::Noise, "NOISE"),
        (Waveform::Arb, "ARB"),
        (Waveform::Dc, "DC"),
        (Waveform::Prbs, "PRBS"),
        (Waveform::Iq, "IQ"),
    ],
);

/// PM5139 waveform keywords
pub static PM5139_WAVEFORMS: CapabilityMap<Waveform> = CapabilityMap::new(
    "Philips PM5139",
    &[
        (Waveform::Sine, "SINE"),
        (Waveform::Square, "SQUARE"),
        (Waveform::Ramp, "TRNGLE"),
        (Waveform::Pulse, "POSPULSE"),
        (Waveform::Arb, "ARB"),
        (Waveform::Dc, "DC"),
    ],
);

/// Serializes a settings value the way these dialects expect
///
/// Whole numbers keep a trailing `.0` (`FRQ,1000.0` rather than `FRQ,1000`),
/// matching the style the instruments echo back.
pub(crate) fn display_num(value: f64) -> String
{
    format!("{:?}", value)
}

/// `ON` / `OFF` switch argument
pub(crate) fn on_off(state: bool) -> &'static str
{
    if state { "ON" } else { "OFF" }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn fluke45_function_words()
    {
        assert_eq!(FLUKE45_FUNCTIONS.token(Function::VoltsAcDc).unwrap(), "VACDC");
        assert_eq!(FLUKE45_FUNCTIONS.token(Function::Continuity).unwrap(), "CONT");
        assert_eq!(FLUKE45_SECONDARY.token(SecondaryFunction::Clear).unwrap(), "CLR2");
    }

    #[test]
    fn scpi_meter_rejects_combined_acdc()
    {
        match SCPI_DMM_FUNCTIONS.token(Function::VoltsAcDc).unwrap_err() {
            ValidationError::Unsupported { requested, family, supported } => {
                assert_eq!(requested, "VACDC");
                assert_eq!(family, "Fluke 8845A/8846A");
                assert!(supported.contains("VDC"));
                assert!(!supported.contains("VACDC"));
            }
            other => panic!("expected Unsupported, got {:?}", other),
        }
    }

    #[test]
    fn scpi_rate_maps_to_power_line_cycles()
    {
        assert_eq!(SCPI_DMM_RATES.token(Rate::Fast).unwrap(), "0.2");
        assert_eq!(SCPI_DMM_RATES.token(Rate::Slow).unwrap(), "10");
    }

    #[test]
    fn pm5139_waveform_round_trip()
    {
        assert_eq!(PM5139_WAVEFORMS.token(Waveform::Ramp).unwrap(), "TRNGLE");
        assert_eq!(PM5139_WAVEFORMS.selection("TRNGLE"), Some(Waveform::Ramp));
        assert_eq!(PM5139_WAVEFORMS.selection("posPulse"), Some(Waveform::Pulse));
        assert!(PM5139_WAVEFORMS.token(Waveform::Noise).is_err());
    }

    #[test]
    fn trigger_codes_match_dialect_arguments()
    {
        assert_eq!(TriggerMode::Internal.code(), 1);
        assert_eq!(TriggerMode::ExternalRearNoDelay.code(), 4);
        assert_eq!(TriggerMode::ExternalRearDelay.code(), 5);
    }

    #[test]
    fn whole_numbers_keep_decimal_point()
    {
        assert_eq!(display_num(1000.0), "1000.0");
        assert_eq!(display_num(0.2), "0.2");
    }
}
