//! Multi-channel bench power supply (Rigol DP800 dialect)
//!
//! The supply is SCPI-flavored but channel addressing is split: the source
//! subsystem works on whichever channel `:INSTrument:NSELect` selected last,
//! while apply, measurement, output, and protection commands name the
//! channel inline (`:MEASure:VOLTage? CH2`). The facade keeps an active
//! channel for the selected-channel commands and passes the channel
//! explicitly where the dialect does.

use crate::cmd::{self, PsuChannel};
use crate::devices::{self, IdnMatch};
use crate::error::{CommandError, Result};
use crate::response;
use crate::transport::ResourceManager;
use std::time::Duration;

const IDN: IdnMatch = IdnMatch {
    vendors: &["RIGOL"],
    models: &["DP8"],
    description: "Rigol DP800 power supply",
};

/// Voltage and current settings of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSettings
{
    pub volts: f64,
    pub amps: f64,
}

/// One full measurement of a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelMeasurement
{
    pub volts: f64,
    pub amps: f64,
    pub watts: f64,
}

/// Facade over one Rigol DP800-series supply
///
/// Addressing priority on [`connect`](crate::devices::Instrument::connect):
/// USB serial number, then IP address, then GPIB address, then raw resource
/// string, then auto-discovery across every visible address.
pub struct RigolDp800<R: ResourceManager>
{
    manager: R,
    link: Option<R::Link>,
    usb_serial: Option<String>,
    ip_address: Option<String>,
    gpib_address: Option<u32>,
    resource_name: Option<String>,
    timeout: Duration,
    active: PsuChannel,
}

impl<R: ResourceManager> RigolDp800<R>
{
    pub fn new(manager: R) -> Self
    {
        Self {
            manager: manager,
            link: None,
            usb_serial: None,
            ip_address: None,
            gpib_address: None,
            resource_name: None,
            timeout: Duration::from_secs(5),
            active: PsuChannel::Ch1,
        }
    }

    pub fn with_usb_serial(mut self, serial: impl Into<String>) -> Self
    {
        self.usb_serial = Some(serial.into());
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self
    {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_gpib_address(mut self, address: u32) -> Self
    {
        self.gpib_address = Some(address);
        self
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

    fn establish(&mut self) -> Result<(R::Link, String)>
    {
        if let Some(serial) = self.usb_serial.clone() {
            let address = format!("USB0::0x1AB1::0x0E11::{}::INSTR", serial);
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(ip) = self.ip_address.clone() {
            let address = format!("TCPIP0::{}::INSTR", ip);
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(address) = self.gpib_address {
            let address = format!("GPIB0::{}::INSTR", address);
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(resource) = self.resource_name.clone() {
            return devices::open_trusted(&mut self.manager, &resource, self.timeout, &IDN);
        }

        devices::discover(&mut self.manager, &[], self.timeout, &IDN)
    }

    /// Channel used by the source-subsystem getters and setters
    pub fn active_channel(&self) -> PsuChannel
    {
        self.active
    }

    /// Selects the channel for later source-subsystem operations
    ///
    /// The selection is also sent ahead of each such operation, so this only
    /// changes facade state.
    pub fn set_active_channel(&mut self, channel: PsuChannel)
    {
        self.active = channel;
    }

    fn select_active(&mut self) -> Result<()>
    {
        self.send(&format!(":INSTrument:NSELect {}", self.active.number()))
    }

    /// Programmed voltage of the active channel
    pub fn voltage(&mut self) -> Result<f64>
    {
        self.select_active()?;
        let reply = self.ask(":SOURce:VOLTage?")?;
        Ok(response::parse_float(&reply)?)
    }

    pub fn set_voltage(&mut self, volts: f64) -> Result<()>
    {
        self.select_active()?;
        self.send(&format!(":SOURce:VOLTage {}", cmd::display_num(volts)))
    }

    /// Programmed current limit of the active channel
    pub fn current(&mut self) -> Result<f64>
    {
        self.select_active()?;
        let reply = self.ask(":SOURce:CURRent?")?;
        Ok(response::parse_float(&reply)?)
    }

    pub fn set_current(&mut self, amps: f64) -> Result<()>
    {
        self.select_active()?;
        self.send(&format!(":SOURce:CURRent {}", cmd::display_num(amps)))
    }

    /// Programs voltage and current limit together in a single write
    pub fn apply(&mut self, channel: PsuChannel, volts: f64, amps: f64) -> Result<()>
    {
        self.send(&format!(
            ":APPLy {},{},{}",
            channel,
            cmd::display_num(volts),
            cmd::display_num(amps)
        ))
    }

    /// Reads back the programmed settings of a channel
    ///
    /// The supply answers something like `CH1:12.000V,1.0000A`; the channel
    /// header and unit letters are stripped before parsing.
    pub fn settings(&mut self, channel: PsuChannel) -> Result<ChannelSettings>
    {
        let reply = self.ask(&format!(":APPLy? {}", channel))?;

        let body = match reply.split_once(':') {
            Some((_, rest)) => rest,
            None => reply.as_str(),
        };
        let body = body.replace(['V', 'A'], "");
        let values = response::split_floats(&body, 2).map_err(|_| {
            CommandError::malformed(reply.clone(), "expected CH<n>:<volts>,<amps>")
        })?;

        Ok(ChannelSettings {
            volts: values[0],
            amps: values[1],
        })
    }

    pub fn measured_voltage(&mut self, channel: PsuChannel) -> Result<f64>
    {
        let reply = self.ask(&format!(":MEASure:VOLTage? {}", channel))?;
        Ok(response::parse_float(&reply)?)
    }

    pub fn measured_current(&mut self, channel: PsuChannel) -> Result<f64>
    {
        let reply = self.ask(&format!(":MEASure:CURRent? {}", channel))?;
        Ok(response::parse_float(&reply)?)
    }

    pub fn measured_power(&mut self, channel: PsuChannel) -> Result<f64>
    {
        let reply = self.ask(&format!(":MEASure:POWer? {}", channel))?;
        Ok(response::parse_float(&reply)?)
    }

    /// Voltage, current, and power of a channel in one query
    pub fn measure_all(&mut self, channel: PsuChannel) -> Result<ChannelMeasurement>
    {
        let reply = self.ask(&format!(":MEASure:ALL? {}", channel))?;
        let values = response::split_floats(&reply, 3)?;

        Ok(ChannelMeasurement {
            volts: values[0],
            amps: values[1],
            watts: values[2],
        })
    }

    /// Whether a channel's output is switched on (`ON` or `1` both count)
    pub fn output(&mut self, channel: PsuChannel) -> Result<bool>
    {
        let reply = self.ask(&format!(":OUTPut:STATe? {}", channel))?;
        Ok(reply == "ON" || reply == "1")
    }

    pub fn set_output(&mut self, channel: PsuChannel, enabled: bool) -> Result<()>
    {
        self.send(&format!(":OUTPut {},{}", channel, cmd::on_off(enabled)))
    }

    /// Sets the over-voltage protection trip level
    pub fn set_ovp_level(&mut self, channel: PsuChannel, volts: f64) -> Result<()>
    {
        self.send(&format!(":OUTPut:OVP:VALue {},{}", channel, cmd::display_num(volts)))
    }

    pub fn set_ovp(&mut self, channel: PsuChannel, enabled: bool) -> Result<()>
    {
        self.send(&format!(":OUTPut:OVP {},{}", channel, cmd::on_off(enabled)))
    }

    /// Sets the over-current protection trip level
    pub fn set_ocp_level(&mut self, channel: PsuChannel, amps: f64) -> Result<()>
    {
        self.send(&format!(":OUTPut:OCP:VALue {},{}", channel, cmd::display_num(amps)))
    }

    pub fn set_ocp(&mut self, channel: PsuChannel, enabled: bool) -> Result<()>
    {
        self.send(&format!(":OUTPut:OCP {},{}", channel, cmd::on_off(enabled)))
    }
}

devices::impl_instrument!(RigolDp800);
devices::impl_exchange!(RigolDp800);
devices::impl_ieee488!(RigolDp800: reset, clear_status, self_test);
