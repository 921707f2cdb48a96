//! Dual-display bench multimeter (Fluke 45 dialect)
//!
//! The meter speaks bare command words (`VDC`, `RANGE 3`, `MEAS1?`). Over
//! RS-232 it terminates every exchange with a status prompt -- `=>` for
//! success, `?>` for a command it understood but could not execute, `!>` for
//! one it did not understand -- which this facade consumes and checks after
//! each plain command. Over GPIB the prompts do not appear and commands are
//! plain writes.

use crate::cmd::{self, Function, Rate, SecondaryFunction, TriggerMode};
use crate::cmd::{FLUKE45_FUNCTIONS, FLUKE45_RATES, FLUKE45_SECONDARY};
use crate::devices::{self, IdnMatch};
use crate::error::{CommandError, ConnectionError, Result, ValidationError};
use crate::response;
use crate::transport::{ResourceManager, Transport};
use std::time::Duration;

/// Reference impedances the `DBREF` command accepts, in ohms
pub const DB_REFERENCES: &[u32] = &[
    50, 75, 93, 110, 125, 135, 150, 250, 300, 500, 600, 800, 900, 1000, 1200, 8000,
];

const IDN: IdnMatch = IdnMatch {
    vendors: &["FLUKE"],
    models: &["45"],
    description: "Fluke 45 dual-display multimeter",
};

/// Min/max tracking control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinMaxMode
{
    Min,
    Max,
    Clear,
}

/// Outcome of a `COMP?` comparison query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult
{
    High,
    Low,
    Pass,
}

/// Facade over one Fluke 45 on the bench
///
/// Addressing priority on [`connect`](crate::devices::Instrument::connect):
/// GPIB address, then serial port, then raw resource string, then GPIB
/// auto-discovery.
pub struct Fluke45<R: ResourceManager>
{
    manager: R,
    link: Option<R::Link>,
    gpib_address: Option<u32>,
    serial_port: Option<String>,
    resource_name: Option<String>,
    timeout: Duration,
    /// Serial links answer every command with a status prompt
    prompt_mode: bool,
}

impl<R: ResourceManager> Fluke45<R>
{
    pub fn new(manager: R) -> Self
    {
        Self {
            manager: manager,
            link: None,
            gpib_address: None,
            serial_port: None,
            resource_name: None,
            timeout: Duration::from_secs(5),
            prompt_mode: false,
        }
    }

    pub fn with_gpib_address(mut self, address: u32) -> Self
    {
        self.gpib_address = Some(address);
        self
    }

    pub fn with_serial_port(mut self, port: impl Into<String>) -> Self
    {
        self.serial_port = Some(port.into());
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
        self.prompt_mode = false;

        if let Some(address) = self.gpib_address {
            let address = format!("GPIB0::{}::INSTR", address);
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(port) = self.serial_port.clone() {
            let address = format!("ASRL{}::INSTR", port);
            self.prompt_mode = true;
            return devices::open_link(&mut self.manager, &address, self.timeout, &IDN);
        }

        if let Some(resource) = self.resource_name.clone() {
            self.prompt_mode = resource.to_ascii_uppercase().starts_with("ASRL");
            return devices::open_trusted(&mut self.manager, &resource, self.timeout, &IDN);
        }

        devices::discover(&mut self.manager, &["GPIB"], self.timeout, &IDN)
    }

    fn link(&mut self) -> Result<&mut R::Link>
    {
        match self.link.as_mut() {
            Some(link) => Ok(link),
            None => Err(ConnectionError::NotConnected.into()),
        }
    }

    /// Sends a plain command, consuming and checking the status prompt on
    /// serial links
    fn send(&mut self, command: &str) -> Result<()>
    {
        if self.prompt_mode {
            let link = self.link()?;
            let reply = link
                .query(command)
                .map_err(|fault| CommandError::transport(format!("failed to send {:?}", command), fault))?;
            response::strip_prompt(&reply)?;
            Ok(())
        }
        else {
            let link = self.link()?;
            link.write(command)
                .map_err(|fault| CommandError::transport(format!("failed to send {:?}", command), fault))?;
            Ok(())
        }
    }

    fn ask(&mut self, command: &str) -> Result<String>
    {
        let link = self.link()?;
        let reply = link
            .query(command)
            .map_err(|fault| CommandError::transport(format!("no reply to {:?}", command), fault))?;
        Ok(reply.trim().to_string())
    }

    /// Selects the primary display function
    pub fn set_primary_function(&mut self, function: Function) -> Result<()>
    {
        let token = FLUKE45_FUNCTIONS.token(function)?;
        self.send(token)
    }

    /// Selects the secondary display function, or blanks it with
    /// [`SecondaryFunction::Clear`]
    pub fn set_secondary_function(&mut self, function: SecondaryFunction) -> Result<()>
    {
        let token = FLUKE45_SECONDARY.token(function)?;
        self.send(token)
    }

    /// Enables autoranging, or drops back to a fixed mid-scale range
    pub fn set_auto_range(&mut self, enabled: bool) -> Result<()>
    {
        // the dialect has no auto-off word; selecting a manual range
        // (mid-scale 4) leaves auto mode
        if enabled {
            self.send("AUTO")
        }
        else {
            self.send("RANGE 4")
        }
    }

    pub fn auto_range(&mut self) -> Result<bool>
    {
        let reply = self.ask("AUTO?")?;
        Ok(reply == "1")
    }

    /// Selects a manual range by code (1 through 7; meaning depends on the
    /// active function)
    pub fn set_range(&mut self, code: u8) -> Result<()>
    {
        if !(1..=7).contains(&code) {
            return Err(ValidationError::OutOfRange {
                quantity: "range code",
                value: code as f64,
                min: 1.0,
                max: 7.0,
            }
            .into());
        }

        self.send(&format!("RANGE {}", code))
    }

    pub fn set_rate(&mut self, rate: Rate) -> Result<()>
    {
        let token = FLUKE45_RATES.token(rate)?;
        self.send(&format!("RATE {}", token))
    }

    /// Triggers (if armed) and reads the primary display
    pub fn primary(&mut self) -> Result<f64>
    {
        let reply = self.ask("MEAS1?")?;
        Ok(response::parse_float(&reply)?)
    }

    /// Triggers (if armed) and reads the secondary display
    pub fn secondary(&mut self) -> Result<f64>
    {
        let reply = self.ask("MEAS2?")?;
        Ok(response::parse_float(&reply)?)
    }

    /// Triggers (if armed) and reads both displays; the reply must hold
    /// exactly two values
    pub fn both(&mut self) -> Result<(f64, f64)>
    {
        let reply = self.ask("MEAS?")?;
        let values = response::split_floats_exact(&reply, 2)?;
        Ok((values[0], values[1]))
    }

    /// Reads the primary display without triggering a new measurement
    pub fn primary_value(&mut self) -> Result<f64>
    {
        let reply = self.ask("VAL1?")?;
        Ok(response::parse_float(&reply)?)
    }

    /// Reads the secondary display without triggering a new measurement
    pub fn secondary_value(&mut self) -> Result<f64>
    {
        let reply = self.ask("VAL2?")?;
        Ok(response::parse_float(&reply)?)
    }

    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<()>
    {
        self.send(&format!("TRIGGER {}", mode.code()))
    }

    /// Enables or clears relative (offset-nulled) readings
    pub fn set_relative_mode(&mut self, enabled: bool) -> Result<()>
    {
        self.send(if enabled { "REL" } else { "RELCLR" })
    }

    /// Sets the offset used by relative mode
    pub fn set_relative_offset(&mut self, offset: f64) -> Result<()>
    {
        self.send(&format!("RELSET {}", cmd::display_num(offset)))
    }

    /// Enables or clears decibel display
    pub fn set_db_mode(&mut self, enabled: bool) -> Result<()>
    {
        self.send(if enabled { "DB" } else { "DBCLR" })
    }

    /// Sets the dB reference impedance; only values from [`DB_REFERENCES`]
    /// are accepted
    pub fn set_db_reference(&mut self, ohms: u32) -> Result<()>
    {
        if !DB_REFERENCES.contains(&ohms) {
            return Err(ValidationError::BadArgument(format!(
                "dB reference {} Ω is not one of the meter's fixed impedances {:?}",
                ohms, DB_REFERENCES
            ))
            .into());
        }

        self.send(&format!("DBREF {}", ohms))
    }

    /// Freezes or releases the displayed reading
    pub fn set_hold_mode(&mut self, enabled: bool) -> Result<()>
    {
        self.send(if enabled { "HOLD" } else { "HOLDCLR" })
    }

    pub fn set_min_max(&mut self, mode: MinMaxMode) -> Result<()>
    {
        let token = match mode {
            MinMaxMode::Min => "MIN",
            MinMaxMode::Max => "MAX",
            MinMaxMode::Clear => "MMCLR",
        };
        self.send(token)
    }

    /// Puts the meter into comparison mode against the `COMPHI`/`COMPLO`
    /// limits
    pub fn enable_compare(&mut self) -> Result<()>
    {
        self.send("COMP")
    }

    pub fn set_compare_high(&mut self, limit: f64) -> Result<()>
    {
        self.send(&format!("COMPHI {}", cmd::display_num(limit)))
    }

    pub fn set_compare_low(&mut self, limit: f64) -> Result<()>
    {
        self.send(&format!("COMPLO {}", cmd::display_num(limit)))
    }

    /// Reads the latest comparison verdict
    pub fn compare_result(&mut self) -> Result<CompareResult>
    {
        let reply = self.ask("COMP?")?;

        match reply.as_str() {
            "HI" => Ok(CompareResult::High),
            "LO" => Ok(CompareResult::Low),
            "PASS" => Ok(CompareResult::Pass),
            _ => Err(CommandError::malformed(reply, "expected HI, LO, or PASS").into()),
        }
    }
}

devices::impl_instrument!(Fluke45);
devices::impl_ieee488!(Fluke45: reset, clear_status, self_test, trigger, status_byte, event_status);

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::devices::Instrument;
    use crate::error::Error;
    use crate::mock::MockBench;

    const GPIB: &str = "GPIB0::3::INSTR";
    const SERIAL: &str = "ASRL/dev/ttyUSB0::INSTR";
    const IDN_REPLY: &str = "FLUKE, 45, 9080025, 2.0 D2.0";

    fn gpib_meter(bench: &MockBench) -> Fluke45<MockBench>
    {
        bench.add_device(GPIB, IDN_REPLY);
        Fluke45::new(bench.clone()).with_gpib_address(3)
    }

    fn serial_meter(bench: &MockBench) -> Fluke45<MockBench>
    {
        bench.add_device(SERIAL, IDN_REPLY);
        Fluke45::new(bench.clone()).with_serial_port("/dev/ttyUSB0")
    }

    #[test]
    fn gpib_address_builds_visa_resource()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);

        meter.connect().unwrap();
        assert!(meter.is_connected());
        assert_eq!(bench.queries(GPIB), vec!["*IDN?".to_string()]);
    }

    #[test]
    fn explicit_gpib_address_must_identify_as_the_family()
    {
        let bench = MockBench::new();
        bench.add_device(GPIB, "KEITHLEY INSTRUMENTS INC., MODEL 2000, 123, A19");
        let mut meter = Fluke45::new(bench.clone()).with_gpib_address(3);

        match meter.connect().unwrap_err() {
            Error::Connection(ConnectionError::IdentityMismatch { idn, .. }) => {
                assert!(idn.contains("KEITHLEY"));
            }
            other => panic!("expected IdentityMismatch, got {:?}", other),
        }

        // the impostor was released and no command words went at it
        assert!(!meter.is_connected());
        assert_eq!(bench.closes(GPIB), 1);
        assert!(bench.writes(GPIB).is_empty());
    }

    #[test]
    fn raw_resource_string_is_trusted()
    {
        let bench = MockBench::new();
        bench.add_device(GPIB, "HP 3478A REV B");
        let mut meter = Fluke45::new(bench.clone()).with_resource(GPIB);

        // a deliberately supplied resource only has to answer *IDN?
        meter.connect().unwrap();
        assert!(meter.is_connected());
    }

    #[test]
    fn disconnect_twice_is_a_no_op()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);

        meter.connect().unwrap();
        meter.disconnect().unwrap();
        meter.disconnect().unwrap();

        assert!(!meter.is_connected());
        assert_eq!(bench.closes(GPIB), 1);
    }

    #[test]
    fn gpib_commands_are_plain_writes()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        meter.connect().unwrap();

        meter.set_primary_function(Function::VoltsDc).unwrap();
        meter.set_rate(Rate::Fast).unwrap();
        meter.set_range(3).unwrap();

        assert_eq!(
            bench.writes(GPIB),
            vec!["VDC".to_string(), "RATE F".to_string(), "RANGE 3".to_string()]
        );
    }

    #[test]
    fn serial_commands_consume_the_ack_prompt()
    {
        let bench = MockBench::new();
        let mut meter = serial_meter(&bench);
        bench.script_reply(SERIAL, "VDC", "=>");

        meter.connect().unwrap();
        meter.set_primary_function(Function::VoltsDc).unwrap();

        // command went out as a query so the prompt line came back with it
        assert!(bench.queries(SERIAL).contains(&"VDC".to_string()));
        assert!(bench.writes(SERIAL).is_empty());
    }

    #[test]
    fn serial_error_prompt_becomes_device_fault()
    {
        let bench = MockBench::new();
        let mut meter = serial_meter(&bench);
        bench.script_reply(SERIAL, "RATE F", "?>");

        meter.connect().unwrap();

        match meter.set_rate(Rate::Fast).unwrap_err() {
            Error::Command(CommandError::DeviceFault { raw }) => assert_eq!(raw, "?>"),
            other => panic!("expected DeviceFault, got {:?}", other),
        }
    }

    #[test]
    fn operations_while_disconnected_send_nothing()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);

        match meter.primary().unwrap_err() {
            Error::Connection(ConnectionError::NotConnected) => {}
            other => panic!("expected NotConnected, got {:?}", other),
        }

        assert_eq!(bench.traffic(GPIB), 0);
    }

    #[test]
    fn both_displays_parse_as_two_floats()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        bench.script_reply(GPIB, "MEAS?", "+1.00E0,+2.50E-1");

        meter.connect().unwrap();
        assert_eq!(meter.both().unwrap(), (1.0, 0.25));
    }

    #[test]
    fn extra_display_value_is_an_arity_error()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        bench.script_reply(GPIB, "MEAS?", "+1.0E0,+2.0E0,+3.0E0");

        meter.connect().unwrap();
        match meter.both().unwrap_err() {
            Error::Command(CommandError::Arity { expected, actual, .. }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected Arity, got {:?}", other),
        }
    }

    #[test]
    fn range_code_is_validated_before_io()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        meter.connect().unwrap();
        let traffic_after_connect = bench.traffic(GPIB);

        assert!(matches!(
            meter.set_range(8),
            Err(Error::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(bench.traffic(GPIB), traffic_after_connect);
    }

    #[test]
    fn db_reference_must_come_from_the_fixed_table()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        meter.connect().unwrap();
        let traffic_after_connect = bench.traffic(GPIB);

        assert!(meter.set_db_reference(600).is_ok());
        assert!(matches!(
            meter.set_db_reference(60),
            Err(Error::Validation(ValidationError::BadArgument(_)))
        ));
        assert_eq!(bench.traffic(GPIB), traffic_after_connect + 1);
    }

    #[test]
    fn discovery_skips_non_matching_instruments()
    {
        let bench = MockBench::new();
        bench.add_device("GPIB0::1::INSTR", "KEITHLEY INSTRUMENTS INC., MODEL 2000, 123, A19");
        bench.add_device("GPIB0::5::INSTR", IDN_REPLY);
        bench.add_device("TCPIP0::10.0.0.9::INSTR", IDN_REPLY);

        let mut meter = Fluke45::new(bench.clone());
        meter.connect().unwrap();

        // the mismatch was probed and released; the TCPIP twin was never
        // considered because this family only discovers over GPIB
        assert_eq!(bench.closes("GPIB0::1::INSTR"), 1);
        assert_eq!(bench.traffic("TCPIP0::10.0.0.9::INSTR"), 0);
        assert_eq!(bench.closes("GPIB0::5::INSTR"), 0);
    }

    #[test]
    fn discovery_with_empty_bench_reports_what_was_sought()
    {
        let bench = MockBench::new();
        let mut meter = Fluke45::new(bench.clone());

        match meter.connect().unwrap_err() {
            Error::Connection(ConnectionError::NoInstrumentFound { searched_for }) => {
                assert!(searched_for.contains("Fluke 45"));
            }
            other => panic!("expected NoInstrumentFound, got {:?}", other),
        }
    }

    #[test]
    fn session_releases_the_link_when_the_body_fails()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);

        // MEAS1? is unscripted, so the body errors out mid-session
        let outcome = meter.session(|meter| meter.primary());

        assert!(outcome.is_err());
        assert!(!meter.is_connected());
        assert_eq!(bench.closes(GPIB), 1);
    }

    #[test]
    fn compare_verdicts_parse_and_reject_garbage()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        bench.script_reply(GPIB, "COMP?", "PASS");

        meter.connect().unwrap();
        assert_eq!(meter.compare_result().unwrap(), CompareResult::Pass);

        bench.script_reply(GPIB, "COMP?", "MAYBE");
        assert!(matches!(
            meter.compare_result(),
            Err(Error::Command(CommandError::Malformed { .. }))
        ));
    }

    #[test]
    fn self_test_passes_on_zero()
    {
        let bench = MockBench::new();
        let mut meter = gpib_meter(&bench);
        bench.script_reply(GPIB, "*TST?", "0");

        meter.connect().unwrap();
        assert!(meter.self_test().unwrap());

        bench.script_reply(GPIB, "*TST?", "1");
        assert!(!meter.self_test().unwrap());
    }
}
