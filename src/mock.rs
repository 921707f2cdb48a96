//! Scripted in-memory bench used by the unit tests
//!
//! [`MockBench`] plays the role of the external I/O stack: it lists scripted
//! addresses, opens [`MockLink`]s, answers queries from canned replies, and
//! records every command each device received so tests can assert on exact
//! traffic (including its absence).

use crate::transport::{ResourceManager, Transport, TransportError, TransportErrorKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

enum Reply
{
    Text(String),
    /// Simulate a transport fault for this query
    Fault,
}

#[derive(Default)]
struct DeviceScript
{
    idn: String,
    replies: HashMap<String, Reply>,
    writes: Vec<String>,
    queries: Vec<String>,
    closes: usize,
    refuse_open: bool,
}

struct BenchState
{
    addresses: Vec<String>,
    devices: HashMap<String, DeviceScript>,
}

/// A scripted resource manager shared by value with the facade under test
#[derive(Clone)]
pub struct MockBench
{
    state: Rc<RefCell<BenchState>>,
}

impl MockBench
{
    pub fn new() -> Self
    {
        Self {
            state: Rc::new(RefCell::new(BenchState {
                addresses: Vec::new(),
                devices: HashMap::new(),
            })),
        }
    }

    /// Registers a device at `address` answering `*IDN?` with `idn`
    pub fn add_device(&self, address: &str, idn: &str)
    {
        let mut state = self.state.borrow_mut();
        state.addresses.push(address.to_string());
        state.devices.insert(
            address.to_string(),
            DeviceScript {
                idn: idn.to_string(),
                ..DeviceScript::default()
            },
        );
    }

    /// Cans the reply a device gives to an exact query string
    pub fn script_reply(&self, address: &str, command: &str, reply: &str)
    {
        self.state
            .borrow_mut()
            .devices
            .get_mut(address)
            .expect("no such scripted device")
            .replies
            .insert(command.to_string(), Reply::Text(reply.to_string()));
    }

    /// Makes a specific query fail at the transport layer
    pub fn script_fault(&self, address: &str, command: &str)
    {
        self.state
            .borrow_mut()
            .devices
            .get_mut(address)
            .expect("no such scripted device")
            .replies
            .insert(command.to_string(), Reply::Fault);
    }

    /// Makes `open` on this address fail (device listed but unreachable)
    pub fn refuse_open(&self, address: &str)
    {
        self.state
            .borrow_mut()
            .devices
            .get_mut(address)
            .expect("no such scripted device")
            .refuse_open = true;
    }

    /// Every plain write the device at `address` has received
    pub fn writes(&self, address: &str) -> Vec<String>
    {
        self.state.borrow().devices[address].writes.clone()
    }

    /// Every query the device at `address` has received
    pub fn queries(&self, address: &str) -> Vec<String>
    {
        self.state.borrow().devices[address].queries.clone()
    }

    /// Total writes plus queries seen by the device at `address`
    pub fn traffic(&self, address: &str) -> usize
    {
        let state = self.state.borrow();
        state.devices[address].writes.len() + state.devices[address].queries.len()
    }

    /// How many times the link to `address` was closed
    pub fn closes(&self, address: &str) -> usize
    {
        self.state.borrow().devices[address].closes
    }
}

impl ResourceManager for MockBench
{
    type Link = MockLink;

    fn open(&mut self, address: &str) -> Result<MockLink, TransportError>
    {
        let state = self.state.borrow();
        let script = state
            .devices
            .get(address)
            .ok_or_else(|| TransportError::new(TransportErrorKind::NotFound, format!("no device at {}", address)))?;

        if script.refuse_open {
            return Err(TransportError::new(
                TransportErrorKind::Io,
                format!("device at {} refused the connection", address),
            ));
        }

        Ok(MockLink {
            address: address.to_string(),
            state: Rc::clone(&self.state),
            closed: false,
        })
    }

    fn list_addresses(&mut self) -> Result<Vec<String>, TransportError>
    {
        Ok(self.state.borrow().addresses.clone())
    }
}

/// One scripted link handed out by [`MockBench::open`]
pub struct MockLink
{
    address: String,
    state: Rc<RefCell<BenchState>>,
    closed: bool,
}

impl MockLink
{
    fn guard_open(&self) -> Result<(), TransportError>
    {
        if self.closed {
            Err(TransportError::new(TransportErrorKind::Closed, "link already closed"))
        }
        else {
            Ok(())
        }
    }
}

impl Transport for MockLink
{
    fn write(&mut self, command: &str) -> Result<(), TransportError>
    {
        self.guard_open()?;
        let mut state = self.state.borrow_mut();
        let script = state.devices.get_mut(&self.address).expect("scripted device vanished");
        script.writes.push(command.to_string());
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError>
    {
        self.guard_open()?;
        let mut state = self.state.borrow_mut();
        let script = state.devices.get_mut(&self.address).expect("scripted device vanished");
        script.queries.push(command.to_string());

        if command == "*IDN?" && !script.replies.contains_key("*IDN?") {
            return Ok(script.idn.clone());
        }

        match script.replies.get(command) {
            Some(Reply::Text(reply)) => Ok(reply.clone()),
            Some(Reply::Fault) => Err(TransportError::new(
                TransportErrorKind::Io,
                format!("scripted fault for {:?}", command),
            )),
            None => Err(TransportError::new(
                TransportErrorKind::Timeout,
                format!("no scripted reply for {:?}", command),
            )),
        }
    }

    fn close(&mut self) -> Result<(), TransportError>
    {
        self.guard_open()?;
        self.closed = true;
        let mut state = self.state.borrow_mut();
        state.devices.get_mut(&self.address).expect("scripted device vanished").closes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn records_traffic_per_device()
    {
        let mut bench = MockBench::new();
        bench.add_device("GPIB0::3::INSTR", "FLUKE, 45, 9080025, 1.6 D1.0");
        bench.script_reply("GPIB0::3::INSTR", "MEAS1?", "+1.0E0");

        let mut link = bench.open("GPIB0::3::INSTR").unwrap();
        link.write("VDC").unwrap();
        assert_eq!(link.query("MEAS1?").unwrap(), "+1.0E0");
        assert_eq!(link.query("*IDN?").unwrap(), "FLUKE, 45, 9080025, 1.6 D1.0");

        assert_eq!(bench.writes("GPIB0::3::INSTR"), vec!["VDC".to_string()]);
        assert_eq!(bench.queries("GPIB0::3::INSTR").len(), 2);
        assert_eq!(bench.traffic("GPIB0::3::INSTR"), 3);
    }

    #[test]
    fn closed_link_refuses_traffic()
    {
        let mut bench = MockBench::new();
        bench.add_device("GPIB0::3::INSTR", "X");

        let mut link = bench.open("GPIB0::3::INSTR").unwrap();
        link.close().unwrap();
        assert_eq!(bench.closes("GPIB0::3::INSTR"), 1);
        assert!(link.write("VDC").is_err());
    }

    #[test]
    fn unscripted_query_times_out()
    {
        let mut bench = MockBench::new();
        bench.add_device("GPIB0::3::INSTR", "X");

        let mut link = bench.open("GPIB0::3::INSTR").unwrap();
        let err = link.query("BOGUS?").unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Timeout);
    }
}
