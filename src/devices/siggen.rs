//! Signal generators: SDG-series and the legacy PM5139
//!
//! Both families program the same physical quantities, so they share the
//! [`SignalGenerator`] contract and either can stand in for the other on a
//! bench. The dialects could hardly differ more, though:
//!
//! - The SDG speaks channel-prefixed key/value commands (`C1:BSWV FRQ,1000.0`)
//!   and reports every setting through one `C<n>:BSWV?` reply.
//! - The PM5139 speaks bare keyword commands (`FREQ 1000.0`, `ACON`), is
//!   single-channel, and reports its state through an `*IDN?`-era `*LRN?`
//!   learn string.
//!
//! Every setter validates against the facade's [`ParameterLimits`] (or the
//! 0-100 % rule for percent parameters) before anything is written. The
//! PM5139 rejects the parameters it physically lacks -- phase, pulse width,
//! rise and fall time -- up front as missing capabilities.

use crate::cmd::{self, Waveform, PM5139_WAVEFORMS, SDG_WAVEFORMS};
use crate::devices::{self, IdnMatch};
use crate::error::{CommandError, Result, ValidationError};
use crate::limits::{LimitedQuantity, ParameterLimits, PM5139_FACTORY_LIMITS, SDG_FACTORY_LIMITS};
use crate::quantity::{Reading, Unit, UnitMode};
use crate::response::{self, StoredWaveform};
use crate::transport::{ResourceManager, Transport};
use std::time::Duration;

/// Output termination of a generator channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadImpedance
{
    HighZ,
    Ohms(f64),
}

/// Which stored arbitrary waveform to activate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbSelect
{
    Index(u32),
    Name(String),
}

/// The capability set shared by every generator family
pub trait SignalGenerator
{
    /// Selects the channel later operations act on
    fn set_channel(&mut self, channel: u32) -> Result<()>;
    fn channel(&self) -> u32;

    fn limits(&self) -> &ParameterLimits;
    fn limits_mut(&mut self) -> &mut ParameterLimits;

    fn frequency(&mut self) -> Result<Reading>;
    fn set_frequency(&mut self, hz: f64) -> Result<()>;
    fn amplitude(&mut self) -> Result<Reading>;
    fn set_amplitude(&mut self, volts: f64) -> Result<()>;
    fn offset(&mut self) -> Result<Reading>;
    fn set_offset(&mut self, volts: f64) -> Result<()>;
    fn phase(&mut self) -> Result<Reading>;
    fn set_phase(&mut self, degrees: f64) -> Result<()>;

    fn waveform(&mut self) -> Result<Waveform>;
    fn set_waveform(&mut self, waveform: Waveform) -> Result<()>;

    fn output(&mut self) -> Result<bool>;
    fn set_output(&mut self, enabled: bool) -> Result<()>;

    fn load_impedance(&mut self) -> Result<LoadImpedance>;
    fn set_load_impedance(&mut self, load: LoadImpedance) -> Result<()>;

    fn duty_cycle(&mut self) -> Result<Reading>;
    fn set_duty_cycle(&mut self, percent: f64) -> Result<()>;
    fn symmetry(&mut self) -> Result<Reading>;
    fn set_symmetry(&mut self, percent: f64) -> Result<()>;

    fn pulse_width(&mut self) -> Result<Reading>;
    fn set_pulse_width(&mut self, seconds: f64) -> Result<()>;
    fn rise_time(&mut self) -> Result<Reading>;
    fn set_rise_time(&mut self, seconds: f64) -> Result<()>;
    fn fall_time(&mut self) -> Result<Reading>;
    fn set_fall_time(&mut self, seconds: f64) -> Result<()>;

    fn select_arbitrary(&mut self, selection: ArbSelect) -> Result<()>;

    /// Programs shape, frequency, amplitude, offset, and phase together
    fn configure_waveform(
        &mut self,
        waveform: Waveform,
        hz: f64,
        volts: f64,
        offset: f64,
        phase: f64,
    ) -> Result<()>;

    /// The device's raw settings dump, shape unspecified across families
    fn all_parameters(&mut self) -> Result<String>;
}

fn check_percent(what: &'static str, value: f64) -> Result<()>
{
    if (0.0..=100.0).contains(&value) {
        Ok(())
    }
    else {
        Err(ValidationError::BadArgument(format!(
            "{} must be between 0 and 100 %, got {}",
            what, value
        ))
        .into())
    }
}

fn check_non_negative(what: &'static str, value: f64) -> Result<()>
{
    if value >= 0.0 {
        Ok(())
    }
    else {
        Err(ValidationError::BadArgument(format!("{} cannot be negative, got {}", what, value)).into())
    }
}

// ---------------------------------------------------------------------------
// SDG series
// ---------------------------------------------------------------------------

const SDG_IDN: IdnMatch = IdnMatch {
    vendors: &["SIGLENT"],
    models: &["SDG"],
    description: "Siglent SDG waveform generator",
};

/// Facade over one Siglent SDG2000X-series generator
///
/// Addressing priority on [`connect`](crate::devices::Instrument::connect):
/// raw resource string, then auto-discovery across every visible address.
pub struct SiglentSdg2000x<R: ResourceManager>
{
    manager: R,
    link: Option<R::Link>,
    resource_name: Option<String>,
    timeout: Duration,
    unit_mode: UnitMode,
    limits: ParameterLimits,
    active_channel: u32,
}

impl<R: ResourceManager> SiglentSdg2000x<R>
{
    pub fn new(manager: R) -> Self
    {
        Self {
            manager: manager,
            link: None,
            resource_name: None,
            timeout: Duration::from_secs(5),
            unit_mode: UnitMode::default(),
            limits: ParameterLimits::with_factory(SDG_FACTORY_LIMITS),
            active_channel: 1,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self
    {
        self.resource_name = Some(resource.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self
    {
        self.timeout = timeout;
        self
    }

    pub fn with_unit_mode(mut self, mode: UnitMode) -> Self
    {
        self.unit_mode = mode;
        self
    }

    fn establish(&mut self) -> Result<(R::Link, String)>
    {
        if let Some(resource) = self.resource_name.clone() {
            return devices::open_trusted(&mut self.manager, &resource, self.timeout, &SDG_IDN);
        }

        devices::discover(&mut self.manager, &[], self.timeout, &SDG_IDN)
    }

    /// Reads one field of the channel's `BSWV?` settings reply
    fn bswv_param(&mut self, key: &str, base_unit: Unit) -> Result<Reading>
    {
        let reply = self.ask(&format!("C{}:BSWV?", self.active_channel))?;
        let params = response::decode_key_values(&reply);

        let raw = params
            .get(key)
            .ok_or_else(|| CommandError::malformed(reply.clone(), format!("no {} field in settings reply", key)))?;
        let (value, suffix) = response::split_value_unit(raw)?;

        Ok(Reading::from_parts(self.unit_mode, value, suffix, base_unit))
    }

    fn bswv_set(&mut self, key: &str, value: &str) -> Result<()>
    {
        self.send(&format!("C{}:BSWV {},{}", self.active_channel, key, value))
    }

    /// The stored arbitrary waveform catalog (`STL?`)
    pub fn list_waveforms(&mut self) -> Result<Vec<StoredWaveform>>
    {
        let reply = self.ask("STL?")?;
        Ok(response::decode_stored_list(&reply)?)
    }
}

impl<R: ResourceManager> SignalGenerator for SiglentSdg2000x<R>
{
    fn set_channel(&mut self, channel: u32) -> Result<()>
    {
        if !(1..=2).contains(&channel) {
            return Err(ValidationError::BadArgument(format!(
                "channel must be 1 or 2 on this generator, got {}",
                channel
            ))
            .into());
        }

        self.active_channel = channel;
        Ok(())
    }

    fn channel(&self) -> u32
    {
        self.active_channel
    }

    fn limits(&self) -> &ParameterLimits
    {
        &self.limits
    }

    fn limits_mut(&mut self) -> &mut ParameterLimits
    {
        &mut self.limits
    }

    fn frequency(&mut self) -> Result<Reading>
    {
        self.bswv_param("FRQ", Unit::Hertz)
    }

    fn set_frequency(&mut self, hz: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Frequency, hz)?;
        self.bswv_set("FRQ", &cmd::display_num(hz))
    }

    fn amplitude(&mut self) -> Result<Reading>
    {
        self.bswv_param("AMP", Unit::Volt)
    }

    fn set_amplitude(&mut self, volts: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Amplitude, volts)?;
        self.bswv_set("AMP", &cmd::display_num(volts))
    }

    fn offset(&mut self) -> Result<Reading>
    {
        self.bswv_param("OFST", Unit::Volt)
    }

    fn set_offset(&mut self, volts: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Offset, volts)?;
        self.bswv_set("OFST", &cmd::display_num(volts))
    }

    fn phase(&mut self) -> Result<Reading>
    {
        self.bswv_param("PHSE", Unit::Degree)
    }

    fn set_phase(&mut self, degrees: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Phase, degrees)?;
        self.bswv_set("PHSE", &cmd::display_num(degrees))
    }

    fn waveform(&mut self) -> Result<Waveform>
    {
        let reply = self.ask(&format!("C{}:BSWV?", self.active_channel))?;
        let params = response::decode_key_values(&reply);

        let token = params
            .get("WVTP")
            .ok_or_else(|| CommandError::malformed(reply.clone(), "no WVTP field in settings reply"))?;

        SDG_WAVEFORMS
            .selection(token)
            .ok_or_else(|| CommandError::malformed(reply.clone(), format!("unknown waveform {:?}", token)).into())
    }

    fn set_waveform(&mut self, waveform: Waveform) -> Result<()>
    {
        let token = SDG_WAVEFORMS.token(waveform)?;
        self.bswv_set("WVTP", token)
    }

    fn output(&mut self) -> Result<bool>
    {
        let reply = self.ask(&format!("C{}:OUTP?", self.active_channel))?;
        let state = match reply.split_once(',') {
            Some((first, _)) => first,
            None => reply.as_str(),
        };

        // the reply echoes a C<n>:OUTP header ahead of the state word
        let state = state.rsplit(char::is_whitespace).next().unwrap_or(state);
        Ok(state.trim() == "ON")
    }

    fn set_output(&mut self, enabled: bool) -> Result<()>
    {
        self.send(&format!("C{}:OUTP {}", self.active_channel, cmd::on_off(enabled)))
    }

    fn load_impedance(&mut self) -> Result<LoadImpedance>
    {
        let reply = self.ask(&format!("C{}:OUTP?", self.active_channel))?;
        let fields: Vec<&str> = reply.split(',').map(str::trim).collect();

        for pair in fields.windows(2) {
            if pair[0].contains("LOAD") {
                if pair[1] == "HZ" {
                    return Ok(LoadImpedance::HighZ);
                }

                return pair[1]
                    .parse::<f64>()
                    .map(LoadImpedance::Ohms)
                    .map_err(|parse_err| CommandError::malformed(reply.clone(), parse_err.to_string()).into());
            }
        }

        Err(CommandError::malformed(reply, "no LOAD field in output reply").into())
    }

    fn set_load_impedance(&mut self, load: LoadImpedance) -> Result<()>
    {
        // the OUTP command resets the on/off state, so it is read back and
        // repeated alongside the new load
        let state = self.output()?;
        let load_str = match load {
            LoadImpedance::HighZ => "HZ".to_string(),
            LoadImpedance::Ohms(ohms) => cmd::display_num(ohms),
        };

        self.send(&format!(
            "C{}:OUTP {},LOAD,{}",
            self.active_channel,
            cmd::on_off(state),
            load_str
        ))
    }

    fn duty_cycle(&mut self) -> Result<Reading>
    {
        self.bswv_param("DUTY", Unit::Percent)
    }

    fn set_duty_cycle(&mut self, percent: f64) -> Result<()>
    {
        check_percent("duty cycle", percent)?;
        self.bswv_set("DUTY", &cmd::display_num(percent))
    }

    fn symmetry(&mut self) -> Result<Reading>
    {
        self.bswv_param("SYM", Unit::Percent)
    }

    fn set_symmetry(&mut self, percent: f64) -> Result<()>
    {
        check_percent("symmetry", percent)?;
        self.bswv_set("SYM", &cmd::display_num(percent))
    }

    fn pulse_width(&mut self) -> Result<Reading>
    {
        self.bswv_param("WIDTH", Unit::Second)
    }

    fn set_pulse_width(&mut self, seconds: f64) -> Result<()>
    {
        check_non_negative("pulse width", seconds)?;
        self.bswv_set("WIDTH", &cmd::display_num(seconds))
    }

    fn rise_time(&mut self) -> Result<Reading>
    {
        self.bswv_param("RISE", Unit::Second)
    }

    fn set_rise_time(&mut self, seconds: f64) -> Result<()>
    {
        check_non_negative("rise time", seconds)?;
        self.bswv_set("RISE", &cmd::display_num(seconds))
    }

    fn fall_time(&mut self) -> Result<Reading>
    {
        self.bswv_param("FALL", Unit::Second)
    }

    fn set_fall_time(&mut self, seconds: f64) -> Result<()>
    {
        check_non_negative("fall time", seconds)?;
        self.bswv_set("FALL", &cmd::display_num(seconds))
    }

    fn select_arbitrary(&mut self, selection: ArbSelect) -> Result<()>
    {
        match selection {
            ArbSelect::Index(index) => self.send(&format!("C{}:ARWV INDEX,{}", self.active_channel, index)),
            ArbSelect::Name(name) => self.send(&format!("C{}:ARWV NAME,\"{}\"", self.active_channel, name)),
        }
    }

    fn configure_waveform(
        &mut self,
        waveform: Waveform,
        hz: f64,
        volts: f64,
        offset: f64,
        phase: f64,
    ) -> Result<()>
    {
        let token = SDG_WAVEFORMS.token(waveform)?;
        self.limits.check(LimitedQuantity::Frequency, hz)?;
        self.limits.check(LimitedQuantity::Amplitude, volts)?;
        self.limits.check(LimitedQuantity::Offset, offset)?;

        self.send(&format!(
            "C{}:BSWV WVTP,{},FRQ,{},AMP,{},OFST,{},PHSE,{}",
            self.active_channel,
            token,
            cmd::display_num(hz),
            cmd::display_num(volts),
            cmd::display_num(offset),
            cmd::display_num(phase)
        ))
    }

    fn all_parameters(&mut self) -> Result<String>
    {
        self.ask(&format!("C{}:BSWV?", self.active_channel))
    }
}

devices::impl_instrument!(SiglentSdg2000x);
devices::impl_exchange!(SiglentSdg2000x);
devices::impl_ieee488!(SiglentSdg2000x: reset);

// ---------------------------------------------------------------------------
// PM5139
// ---------------------------------------------------------------------------

const PM_IDN: IdnMatch = IdnMatch {
    vendors: &["PHILIPS", "FLUKE"],
    models: &["PM5139"],
    description: "Philips PM5139 function generator",
};

const PM_FAMILY: &str = "Philips PM5139";

/// `WAVEFORM?` reply keywords beyond the ones this crate writes itself
const PM_WAVEFORM_ALIASES: &[(&str, Waveform)] = &[
    ("SQR", Waveform::Square),
    ("POSSAWTOOTH", Waveform::Ramp),
    ("SAWTOOTH", Waveform::Ramp),
    ("NEGSAWTOOTH", Waveform::Ramp),
    ("NEGPULSE", Waveform::Pulse),
    ("HAVERSINE", Waveform::Sine),
];

/// Facade over one Philips/Fluke PM5139 function generator
///
/// Single-channel; connects by raw resource string or auto-discovery. Serial
/// links get the `ESC 2` remote-mode escape right after opening, which the
/// front panel needs before it accepts bus commands.
pub struct PhilipsPm5139<R: ResourceManager>
{
    manager: R,
    link: Option<R::Link>,
    resource_name: Option<String>,
    timeout: Duration,
    unit_mode: UnitMode,
    limits: ParameterLimits,
}

impl<R: ResourceManager> PhilipsPm5139<R>
{
    pub fn new(manager: R) -> Self
    {
        Self {
            manager: manager,
            link: None,
            resource_name: None,
            timeout: Duration::from_secs(5),
            unit_mode: UnitMode::default(),
            limits: ParameterLimits::with_factory(PM5139_FACTORY_LIMITS),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self
    {
        self.resource_name = Some(resource.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self
    {
        self.timeout = timeout;
        self
    }

    pub fn with_unit_mode(mut self, mode: UnitMode) -> Self
    {
        self.unit_mode = mode;
        self
    }

    fn establish(&mut self) -> Result<(R::Link, String)>
    {
        if let Some(resource) = self.resource_name.clone() {
            let (mut link, idn) = devices::open_trusted(&mut self.manager, &resource, self.timeout, &PM_IDN)?;

            if resource.to_ascii_uppercase().starts_with("ASRL") {
                // best effort; a generator already in remote mode may not ack
                let _ = link.write("\x1B2");
            }

            return Ok((link, idn));
        }

        devices::discover(&mut self.manager, &[], self.timeout, &PM_IDN)
    }

    fn learn_map(&mut self) -> Result<std::collections::HashMap<String, String>>
    {
        let lrn = self.ask("*LRN?")?;
        Ok(response::decode_learn_string(&lrn))
    }

    /// Reads a voltage setting, preferring the learn string and falling back
    /// to the direct query when the keyword is absent
    fn voltage_setting(&mut self, keys: &[&str], query: &str) -> Result<Reading>
    {
        let map = self.learn_map()?;

        for key in keys {
            if let Some(raw) = map.get(*key) {
                let (value, _) = response::split_value_unit(raw)?;
                return Ok(Reading::from_parts(self.unit_mode, value, "V".to_string(), Unit::Volt));
            }
        }

        let reply = self.ask(query)?;
        let (value, suffix) = response::split_value_unit(&reply)?;
        let suffix = if suffix.is_empty() { "V".to_string() } else { suffix };
        Ok(Reading::from_parts(self.unit_mode, value, suffix, Unit::Volt))
    }

    fn missing(capability: &'static str) -> ValidationError
    {
        ValidationError::MissingCapability {
            capability: capability,
            family: PM_FAMILY,
        }
    }
}

impl<R: ResourceManager> SignalGenerator for PhilipsPm5139<R>
{
    fn set_channel(&mut self, channel: u32) -> Result<()>
    {
        if channel != 1 {
            return Err(ValidationError::BadArgument(format!(
                "this generator is single-channel; channel must be 1, got {}",
                channel
            ))
            .into());
        }

        Ok(())
    }

    fn channel(&self) -> u32
    {
        1
    }

    fn limits(&self) -> &ParameterLimits
    {
        &self.limits
    }

    fn limits_mut(&mut self) -> &mut ParameterLimits
    {
        &mut self.limits
    }

    fn frequency(&mut self) -> Result<Reading>
    {
        let reply = self.ask("FREQ?")?;
        let (value, suffix) = response::split_value_unit(&reply)?;
        Ok(Reading::from_parts(self.unit_mode, value, suffix, Unit::Hertz))
    }

    fn set_frequency(&mut self, hz: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Frequency, hz)?;
        self.send(&format!("FREQ {}", cmd::display_num(hz)))
    }

    fn amplitude(&mut self) -> Result<Reading>
    {
        self.voltage_setting(&["AMPLTUDE", "AMPLT"], "AMPLTUDE?")
    }

    fn set_amplitude(&mut self, volts: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Amplitude, volts)?;
        self.send(&format!("AMPLTUDE {}", cmd::display_num(volts)))
    }

    fn offset(&mut self) -> Result<Reading>
    {
        self.voltage_setting(&["DCOFFSET", "DCOFF"], "DCOFFSET?")
    }

    fn set_offset(&mut self, volts: f64) -> Result<()>
    {
        self.limits.check(LimitedQuantity::Offset, volts)?;
        self.send(&format!("DCOFFSET {}", cmd::display_num(volts)))
    }

    fn phase(&mut self) -> Result<Reading>
    {
        Err(Self::missing("phase").into())
    }

    fn set_phase(&mut self, _degrees: f64) -> Result<()>
    {
        Err(Self::missing("phase").into())
    }

    fn waveform(&mut self) -> Result<Waveform>
    {
        let reply = self.ask("WAVEFORM?")?;
        let token = reply.trim().to_ascii_uppercase();

        if let Some(waveform) = PM5139_WAVEFORMS.selection(&token) {
            return Ok(waveform);
        }

        PM_WAVEFORM_ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, waveform)| *waveform)
            .ok_or_else(|| CommandError::malformed(reply, "unknown waveform keyword").into())
    }

    fn set_waveform(&mut self, waveform: Waveform) -> Result<()>
    {
        let token = PM5139_WAVEFORMS.token(waveform)?;

        // DC is not a WAVEFORM argument on this generator; it is reached by
        // zeroing the AC amplitude and enabling the DC path
        if waveform == Waveform::Dc {
            self.send("AMPLTUDE 0")?;
            return self.send("DCON");
        }

        self.send(&format!("WAVEFORM {}", token))
    }

    fn output(&mut self) -> Result<bool>
    {
        let map = self.learn_map()?;

        if map.contains_key("ACOFF") {
            return Ok(false);
        }

        Ok(map.contains_key("ACON"))
    }

    fn set_output(&mut self, enabled: bool) -> Result<()>
    {
        if enabled {
            self.send("ACON; DCON")
        }
        else {
            self.send("ACOFF; DCOFF")
        }
    }

    fn load_impedance(&mut self) -> Result<LoadImpedance>
    {
        let map = self.learn_map()?;

        match map.get("LOWIMP") {
            Some(state) if state.eq_ignore_ascii_case("OFF") => Ok(LoadImpedance::Ohms(50.0)),
            _ => Ok(LoadImpedance::HighZ),
        }
    }

    fn set_load_impedance(&mut self, load: LoadImpedance) -> Result<()>
    {
        match load {
            LoadImpedance::HighZ => self.send("LOWIMP ON"),
            LoadImpedance::Ohms(ohms) if (ohms - 50.0).abs() < 0.1 => self.send("LOWIMP OFF"),
            LoadImpedance::Ohms(ohms) => Err(ValidationError::BadArgument(format!(
                "this generator terminates into 50 Ω or HiZ only, got {} Ω",
                ohms
            ))
            .into()),
        }
    }

    fn duty_cycle(&mut self) -> Result<Reading>
    {
        if let Ok(reply) = self.ask("DUTYCYCLE?") {
            if let Ok((value, suffix)) = response::split_value_unit(&reply) {
                let suffix = if suffix.is_empty() { "%".to_string() } else { suffix };
                return Ok(Reading::from_parts(self.unit_mode, value, suffix, Unit::Percent));
            }
        }

        // older firmware answers only through the learn string; a generator
        // fresh from reset reports neither and runs at 50 %
        let map = self.learn_map()?;

        if let Some(raw) = map.get("DUTYCYCLE") {
            let (value, _) = response::split_value_unit(raw)?;
            return Ok(Reading::from_parts(self.unit_mode, value, "%".to_string(), Unit::Percent));
        }

        Ok(Reading::from_parts(self.unit_mode, 50.0, "%".to_string(), Unit::Percent))
    }

    fn set_duty_cycle(&mut self, percent: f64) -> Result<()>
    {
        check_percent("duty cycle", percent)?;
        self.send(&format!("DUTYCYCLE {}", cmd::display_num(percent)))
    }

    fn symmetry(&mut self) -> Result<Reading>
    {
        let map = self.learn_map()?;

        if let Some(state) = map.get("SYMMETRY") {
            if state.eq_ignore_ascii_case("ON") {
                return Ok(Reading::from_parts(self.unit_mode, 50.0, "%".to_string(), Unit::Percent));
            }
        }

        self.duty_cycle()
    }

    fn set_symmetry(&mut self, percent: f64) -> Result<()>
    {
        check_percent("symmetry", percent)?;

        // 50 % is the hardware's symmetric mode; anything else is expressed
        // through the duty cycle
        if (percent - 50.0).abs() < 0.01 {
            self.send("SYMMETRY ON")
        }
        else {
            self.send("SYMMETRY OFF")?;
            self.send(&format!("DUTYCYCLE {}", cmd::display_num(percent)))
        }
    }

    fn pulse_width(&mut self) -> Result<Reading>
    {
        Err(Self::missing("pulse width").into())
    }

    fn set_pulse_width(&mut self, _seconds: f64) -> Result<()>
    {
        Err(Self::missing("pulse width").into())
    }

    fn rise_time(&mut self) -> Result<Reading>
    {
        Err(Self::missing("rise time").into())
    }

    fn set_rise_time(&mut self, _seconds: f64) -> Result<()>
    {
        Err(Self::missing("rise time").into())
    }

    fn fall_time(&mut self) -> Result<Reading>
    {
        Err(Self::missing("fall time").into())
    }

    fn set_fall_time(&mut self, _seconds: f64) -> Result<()>
    {
        Err(Self::missing("fall time").into())
    }

    fn select_arbitrary(&mut self, selection: ArbSelect) -> Result<()>
    {
        let index = match selection {
            ArbSelect::Index(index) => index,
            ArbSelect::Name(name) => {
                let upper = name.to_ascii_uppercase();
                match upper.strip_prefix("ARB").and_then(|digits| digits.parse::<u32>().ok()) {
                    Some(index) => index,
                    None => {
                        return Err(ValidationError::BadArgument(format!(
                            "this generator selects stored waveforms by index; the name must be ARB<n>, got {:?}",
                            name
                        ))
                        .into());
                    }
                }
            }
        };

        if !(1..=24).contains(&index) {
            return Err(ValidationError::BadArgument(format!(
                "stored waveform index must be 1-24, got {}",
                index
            ))
            .into());
        }

        self.send(&format!("ARBITRARY {}", index))
    }

    fn configure_waveform(
        &mut self,
        waveform: Waveform,
        hz: f64,
        volts: f64,
        offset: f64,
        phase: f64,
    ) -> Result<()>
    {
        let token = PM5139_WAVEFORMS.token(waveform)?;
        self.limits.check(LimitedQuantity::Frequency, hz)?;
        self.limits.check(LimitedQuantity::Amplitude, volts)?;
        self.limits.check(LimitedQuantity::Offset, offset)?;

        if phase != 0.0 {
            return Err(Self::missing("phase").into());
        }

        // the output stage clips beyond ±10 V, so the AC peak plus the DC
        // offset must fit inside it
        if offset.abs() + volts / 2.0 > 10.0 {
            return Err(ValidationError::BadArgument(format!(
                "AC peak plus DC offset must stay within ±10 V, got |{}| + {}/2",
                offset, volts
            ))
            .into());
        }

        if waveform == Waveform::Dc {
            self.send("AMPLTUDE 0")?;
            self.send("DCOFFSET 0")?;
            return self.send("DCON");
        }

        self.send(&format!(
            "WAVEFORM {}; FREQ {}; AMPLTUDE {}; DCOFFSET {}",
            token,
            cmd::display_num(hz),
            cmd::display_num(volts),
            cmd::display_num(offset)
        ))
    }

    fn all_parameters(&mut self) -> Result<String>
    {
        self.ask("*LRN?")
    }
}

devices::impl_instrument!(PhilipsPm5139);
devices::impl_exchange!(PhilipsPm5139);
devices::impl_ieee488!(PhilipsPm5139: reset);
