//! Interface discovery: per-interface byte counters, busiest-interface selection and
//! the addresses that make up the local-address registry.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, space0},
    combinator::map_res,
    multi::count,
    sequence::preceded,
    IResult, Parser,
};
use tracing::{debug, warn};

use netrain_config::CaptureConfig;
use netrain_core::registry::LocalAddressRegistry;

use crate::error::CaptureError;

/// Interface used when the counter file cannot be read at all.
pub const FALLBACK_INTERFACE: &str = "eth0";
const LOOPBACK: &str = "lo";

/// One row of `/proc/net/dev`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl InterfaceCounters {
    #[inline]
    pub fn total(&self) -> u64 {
        self.rx_bytes.saturating_add(self.tx_bytes)
    }
}

fn counter(input: &str) -> IResult<&str, u64> {
    preceded(space0, map_res(digit1, |s: &str| s.parse::<u64>())).parse(input)
}

/// `  eth0: 1234 12 0 0 0 0 0 0 5678 ...`; rx bytes is field 0, tx bytes field 8.
fn counters_line(input: &str) -> IResult<&str, InterfaceCounters> {
    let (input, _) = space0.parse(input)?;
    let (input, name) = take_while1(|c: char| c != ':' && !c.is_whitespace()).parse(input)?;
    let (input, _) = tag(":").parse(input)?;
    let (input, fields) = count(counter, 9).parse(input)?;

    Ok((
        input,
        InterfaceCounters {
            name: name.to_string(),
            rx_bytes: fields[0],
            tx_bytes: fields[8],
        },
    ))
}

/// Parses the full contents of `/proc/net/dev`.
///
/// The two header lines are skipped; rows that do not parse are ignored.
pub fn parse_proc_net_dev(contents: &str) -> Result<Vec<InterfaceCounters>, CaptureError> {
    let mut lines = contents.lines();
    if lines.next().is_none() || lines.next().is_none() {
        return Err(CaptureError::CounterFormat("missing header lines".into()));
    }

    Ok(lines
        .filter_map(|line| match counters_line(line) {
            Ok((_, row)) => Some(row),
            Err(_) => {
                debug!(line, "Skipping unparsable counter row");
                None
            }
        })
        .collect())
}

fn read_counters(path: &Path) -> Result<Vec<InterfaceCounters>, CaptureError> {
    let contents = fs::read_to_string(path).map_err(|source| CaptureError::CounterRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_proc_net_dev(&contents)
}

/// Non-loopback interface with the largest rx+tx total.
///
/// Returns loopback when no other interface has moved any bytes.
pub fn busiest_interface(rows: &[InterfaceCounters]) -> String {
    rows.iter()
        .filter(|row| row.name != LOOPBACK && row.total() > 0)
        .max_by_key(|row| row.total())
        .map(|row| row.name.clone())
        .unwrap_or_else(|| LOOPBACK.to_string())
}

/// Picks the configured interface, else the busiest one, else [`FALLBACK_INTERFACE`].
pub fn select_interface(config: &CaptureConfig) -> String {
    if !config.interface.is_empty() {
        return config.interface.clone();
    }

    match read_counters(Path::new(&config.proc_net_dev)) {
        Ok(rows) => {
            let name = busiest_interface(&rows);
            debug!(interface = %name, "Selected busiest interface");
            name
        }
        Err(e) => {
            warn!(error = %e, fallback = FALLBACK_INTERFACE, "Interface detection failed");
            FALLBACK_INTERFACE.to_string()
        }
    }
}

/// IPv4 addresses assigned to `interface`, as reported by the capture library.
pub fn interface_addresses(interface: &str) -> Result<Vec<Ipv4Addr>, CaptureError> {
    let device = pcap::Device::list()?
        .into_iter()
        .find(|d| d.name == interface)
        .ok_or_else(|| CaptureError::InterfaceNotFound(interface.to_string()))?;

    Ok(device
        .addresses
        .iter()
        .filter_map(|a| match a.addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .collect())
}

/// Builds the registry from the interface's own addresses followed by configured extras.
pub fn build_registry<I>(discovered: I, config: &CaptureConfig) -> LocalAddressRegistry
where
    I: IntoIterator<Item = Ipv4Addr>,
{
    let mut registry = LocalAddressRegistry::with_capacity(config.max_local_addresses);
    registry.extend(discovered);
    registry.extend(config.local_addresses.iter().copied());
    registry
}

/// Byte counters the throughput sampler reads.
pub trait CounterSource {
    /// Current rx+tx byte total of the monitored interface.
    fn read_total_bytes(&mut self) -> Result<u64, CaptureError>;
}

/// Reads one interface's counters from a `/proc/net/dev` style file.
#[derive(Clone, Debug)]
pub struct ProcNetDev {
    path: PathBuf,
    interface: String,
}

impl ProcNetDev {
    pub fn new(path: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            interface: interface.into(),
        }
    }
}

impl CounterSource for ProcNetDev {
    fn read_total_bytes(&mut self) -> Result<u64, CaptureError> {
        read_counters(&self.path)?
            .into_iter()
            .find(|row| row.name == self.interface)
            .map(|row| row.total())
            .ok_or_else(|| CaptureError::InterfaceNotFound(self.interface.clone()))
    }
}
