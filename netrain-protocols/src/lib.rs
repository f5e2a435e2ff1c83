//! # Netrain Protocol Parsers
//!
//! Zero-copy classification of captured link-layer frames: Ethernet II, IPv4, and the
//! TCP/UDP port fields needed to label a flow.

pub mod frame;
pub mod ports;

pub use frame::{classify, Classified, Protocol, Rejected};
pub use ports::{is_encrypted_flow, is_encrypted_port, ENCRYPTED_PORTS};
