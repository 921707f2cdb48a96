//! SCPI bench multimeter (Fluke 8845A/8846A dialect)
//!
//! Unlike the dual-display meter this family is configured through the SCPI
//! `CONFigure` tree, and range, auto-range, and rate are sub-commands of the
//! active function (`VOLT:DC:RANG 10`). The facade therefore remembers which
//! function was last configured and refuses those operations until one is,
//! without sending anything.
//!
//! The meter has no secondary display; those operations are rejected up
//! front as missing capabilities.

use crate::cmd::{self, Function, Rate};
use crate::cmd::{SCPI_DMM_FUNCTIONS, SCPI_DMM_RATES};
use crate::devices::{self, IdnMatch};
use crate::error::{CommandError, Result, ValidationError};
use crate::response;
use crate::transport::ResourceManager;
use std::time::Duration;

const IDN: IdnMatch = IdnMatch {
    vendors: &["FLUKE"],
    models: &["8845", "8846"],
    description: "Fluke 8845A/8846A multimeter",
};

const FAMILY: &str = "Fluke 8845A/8846A";

/// Facade over one Fluke 8845A or 8846A
///
/// Addressing priority on [`connect`](crate::devices::Instrument::connect):
/// IP address, then GPIB address, then raw resource string, then TCPIP/GPIB
/// auto-discovery.
pub struct Fluke884x<R: ResourceManager>
{
    manager: R,
    link: Option<R::Link>,
    ip_address: Option<String>,
    gpib_address: Option<u32>,
    resource_name: Option<String>,
    timeout: Duration,
    /// SCPI subsystem name of the function configured since the last connect
    configured: Option<&'static str>,
}

impl<R: ResourceManager> Fluke884x<R>
{
    pub fn new(manager: R) -> Self
    {
        Self {
            manager: manager,
            link: None,
            ip_address: None,
            gpib_address: None,
            resource_name: None,
            timeout: Duration::from_secs(5),
            configured: None,
        }
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
        // the function sub-state belongs to the link, not the facade
        self.configured = None;

        if let Some(ip) = self.ip_address.clone() {
            let address = format!("TCPIP0::{}::inst0::INSTR", ip);
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(address) = self.gpib_address {
            let address = format!("GPIB0::{}::INSTR", address);
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(resource) = self.resource_name.clone() {
            return devices::open_trusted(&mut self.manager, &resource, self.timeout, &IDN);
        }

        devices::discover(&mut self.manager, &["TCPIP", "GPIB"], self.timeout, &IDN)
    }

    /// The subsystem name to hang range/rate commands off, or the ordering
    /// error when no function was configured yet
    fn subsystem(&self, attempted: &'static str) -> Result<&'static str>
    {
        match self.configured {
            Some(token) => Ok(token),
            None => Err(CommandError::FunctionNotConfigured {
                attempted: attempted,
            }
            .into()),
        }
    }

    /// Configures the measurement function (`CONF:<subsystem>`)
    pub fn set_primary_function(&mut self, function: Function) -> Result<()>
    {
        let token = SCPI_DMM_FUNCTIONS.token(function)?;
        self.send(&format!("CONF:{}", token))?;
        self.configured = Some(token);
        Ok(())
    }

    /// The function configured since the last connect, if any
    pub fn primary_function(&self) -> Option<Function>
    {
        self.configured.and_then(|token| SCPI_DMM_FUNCTIONS.selection(token))
    }

    pub fn set_auto_range(&mut self, enabled: bool) -> Result<()>
    {
        let subsystem = self.subsystem("auto range")?;
        self.send(&format!("{}:RANG:AUTO {}", subsystem, cmd::on_off(enabled)))
    }

    /// Sets a manual range in the active function's units
    pub fn set_range(&mut self, range: f64) -> Result<()>
    {
        let subsystem = self.subsystem("range")?;
        self.send(&format!("{}:RANG {}", subsystem, cmd::display_num(range)))
    }

    /// Sets the reading rate as an integration time in power line cycles
    pub fn set_rate(&mut self, rate: Rate) -> Result<()>
    {
        let subsystem = self.subsystem("rate")?;
        let nplc = SCPI_DMM_RATES.token(rate)?;
        self.send(&format!("{}:NPLC {}", subsystem, nplc))
    }

    /// Triggers and reads a fresh measurement (`READ?`)
    pub fn primary(&mut self) -> Result<f64>
    {
        let reply = self.ask("READ?")?;
        Ok(response::parse_float(&reply)?)
    }

    /// Reads the last completed measurement without triggering (`FETCH?`)
    pub fn primary_value(&mut self) -> Result<f64>
    {
        let reply = self.ask("FETCH?")?;
        Ok(response::parse_float(&reply)?)
    }

    pub fn secondary(&mut self) -> Result<f64>
    {
        Err(Self::no_secondary_display("secondary display measurement").into())
    }

    pub fn secondary_value(&mut self) -> Result<f64>
    {
        Err(Self::no_secondary_display("secondary display value").into())
    }

    pub fn both(&mut self) -> Result<(f64, f64)>
    {
        Err(Self::no_secondary_display("dual display measurement").into())
    }

    fn no_secondary_display(capability: &'static str) -> ValidationError
    {
        ValidationError::MissingCapability {
            capability: capability,
            family: FAMILY,
        }
    }
}

devices::impl_instrument!(Fluke884x);
devices::impl_exchange!(Fluke884x);
devices::impl_ieee488!(Fluke884x: reset, clear_status, self_test, trigger);

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::devices::Instrument;
    use crate::error::Error;
    use crate::mock::MockBench;

    const LAN: &str = "TCPIP0::10.0.0.5::inst0::INSTR";
    const IDN_REPLY: &str = "FLUKE, 8846A, 9209017, 08/02/10-11:53";

    fn lan_meter(bench: &MockBench) -> Fluke884x<MockBench>
    {
        bench.add_device(LAN, IDN_REPLY);
        Fluke884x::new(bench.clone()).with_ip_address("10.0.0.5")
    }

    #[test]
    fn ip_address_builds_lan_resource()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);

        meter.connect().unwrap();
        assert!(meter.is_connected());
        assert_eq!(bench.queries(LAN), vec!["*IDN?".to_string()]);
    }

    #[test]
    fn explicit_ip_address_must_identify_as_the_family()
    {
        use crate::error::ConnectionError;

        let bench = MockBench::new();
        bench.add_device(LAN, "RIGOL TECHNOLOGIES,DM3068,X,1.0");
        let mut meter = Fluke884x::new(bench.clone()).with_ip_address("10.0.0.5");

        assert!(matches!(
            meter.connect().unwrap_err(),
            Error::Connection(ConnectionError::IdentityMismatch { .. })
        ));
        assert!(!meter.is_connected());
        assert_eq!(bench.closes(LAN), 1);
    }

    #[test]
    fn range_requires_a_configured_function()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);
        meter.connect().unwrap();
        let traffic_after_connect = bench.traffic(LAN);

        match meter.set_range(10.0).unwrap_err() {
            Error::Command(CommandError::FunctionNotConfigured { attempted }) => {
                assert_eq!(attempted, "range");
            }
            other => panic!("expected FunctionNotConfigured, got {:?}", other),
        }

        assert_eq!(bench.traffic(LAN), traffic_after_connect);
    }

    #[test]
    fn configured_function_prefixes_sub_commands()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);
        meter.connect().unwrap();

        meter.set_primary_function(Function::VoltsDc).unwrap();
        meter.set_auto_range(false).unwrap();
        meter.set_range(10.0).unwrap();
        meter.set_rate(Rate::Slow).unwrap();

        assert_eq!(
            bench.writes(LAN),
            vec![
                "CONF:VOLT:DC".to_string(),
                "VOLT:DC:RANG:AUTO OFF".to_string(),
                "VOLT:DC:RANG 10.0".to_string(),
                "VOLT:DC:NPLC 10".to_string(),
            ]
        );
        assert_eq!(meter.primary_function(), Some(Function::VoltsDc));
    }

    #[test]
    fn combined_acdc_function_is_unsupported()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);
        meter.connect().unwrap();
        let traffic_after_connect = bench.traffic(LAN);

        assert!(matches!(
            meter.set_primary_function(Function::VoltsAcDc),
            Err(Error::Validation(ValidationError::Unsupported { .. }))
        ));
        assert_eq!(bench.traffic(LAN), traffic_after_connect);
    }

    #[test]
    fn secondary_display_operations_are_missing_capabilities()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);
        meter.connect().unwrap();
        let traffic_after_connect = bench.traffic(LAN);

        assert!(matches!(
            meter.secondary(),
            Err(Error::Validation(ValidationError::MissingCapability { .. }))
        ));
        assert!(matches!(
            meter.both(),
            Err(Error::Validation(ValidationError::MissingCapability { .. }))
        ));
        assert_eq!(bench.traffic(LAN), traffic_after_connect);
    }

    #[test]
    fn read_and_fetch_parse_floats()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);
        bench.script_reply(LAN, "READ?", "+4.99993E+00");
        bench.script_reply(LAN, "FETCH?", "+5.00001E+00");

        meter.connect().unwrap();
        assert!((meter.primary().unwrap() - 4.99993).abs() < 1e-9);
        assert!((meter.primary_value().unwrap() - 5.00001).abs() < 1e-9);
    }

    #[test]
    fn reconnecting_forgets_the_configured_function()
    {
        let bench = MockBench::new();
        let mut meter = lan_meter(&bench);

        meter.connect().unwrap();
        meter.set_primary_function(Function::Resistance).unwrap();
        meter.disconnect().unwrap();
        meter.connect().unwrap();

        assert!(matches!(
            meter.set_rate(Rate::Fast),
            Err(Error::Command(CommandError::FunctionNotConfigured { .. }))
        ));
    }

    #[test]
    fn discovery_accepts_lan_and_gpib_models()
    {
        let bench = MockBench::new();
        bench.add_device("ASRL1::INSTR", IDN_REPLY);
        bench.add_device("GPIB0::7::INSTR", "FLUKE, 8845A, 123, 1.0");

        let mut meter = Fluke884x::new(bench.clone());
        meter.connect().unwrap();

        // the serial twin is outside this family's discovery scope
        assert_eq!(bench.traffic("ASRL1::INSTR"), 0);
        assert_eq!(bench.closes("GPIB0::7::INSTR"), 0);
        assert!(meter.is_connected());
    }
}
