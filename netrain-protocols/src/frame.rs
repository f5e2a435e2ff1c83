//! ## netrain-protocols::frame
//! Ethernet II / IPv4 / TCP / UDP header classifier.
//!
//! Every read is preceded by a length check against the captured length, so a frame that
//! claims more header than was captured is rejected instead of being read past its end.

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::ports::is_encrypted_flow;

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const IPV4_MIN_HEADER_LEN: usize = 20;
pub const TCP_MIN_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;

const ETHERTYPE_IPV4: u16 = 0x0800;

/// Reasons a frame cannot be classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Rejected {
    /// Fewer bytes than an Ethernet II header.
    #[error("frame shorter than an Ethernet header ({0} bytes captured)")]
    TruncatedEthernet(usize),
    /// Link layer carries something other than IPv4.
    #[error("unsupported ethertype {0:#06x}")]
    NotIpv4(u16),
    /// Not enough bytes for the fixed IPv4 header.
    #[error("frame too short for an IPv4 header ({0} bytes captured)")]
    TruncatedIpv4(usize),
    /// IHL field describes a header shorter than the IPv4 minimum.
    #[error("invalid IPv4 header length {0}")]
    BadHeaderLength(usize),
    /// IHL field describes options that were not captured.
    #[error("IPv4 options truncated: need {needed} bytes, captured {captured}")]
    TruncatedIpOptions { needed: usize, captured: usize },
}

/// IP payload protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Other(u8),
}

impl Protocol {
    pub fn from_number(number: u8) -> Self {
        match number {
            1 => Protocol::Icmp,
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            other => Protocol::Other(other),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Protocol::Icmp => 1,
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Other(n) => *n,
        }
    }

    /// Short label used in display lines.
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
            Protocol::Other(_) => "IP",
        }
    }
}

/// Header fields of an accepted frame, borrowing the payload from the frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classified<'a> {
    pub protocol: Protocol,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    /// Zero when the transport is not TCP/UDP or its header was truncated.
    pub src_port: u16,
    /// Zero when the transport is not TCP/UDP or its header was truncated.
    pub dst_port: u16,
    /// Bytes after the transport header; empty when no transport header was read.
    pub payload: &'a [u8],
}

impl Classified<'_> {
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        is_encrypted_flow(self.src_port, self.dst_port)
    }
}

#[inline]
fn be_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

/// Classifies a link-layer frame.
///
/// Only the first `min(captured_len, frame.len())` bytes are considered. A truncated
/// TCP/UDP header does not reject the frame: the ports stay zero and no payload is exposed.
pub fn classify(frame: &[u8], captured_len: usize) -> Result<Classified<'_>, Rejected> {
    let captured = captured_len.min(frame.len());
    let frame = &frame[..captured];

    if captured < ETHERNET_HEADER_LEN {
        return Err(Rejected::TruncatedEthernet(captured));
    }
    let ethertype = be_u16(frame, 12);
    if ethertype != ETHERTYPE_IPV4 {
        return Err(Rejected::NotIpv4(ethertype));
    }

    if captured < ETHERNET_HEADER_LEN + IPV4_MIN_HEADER_LEN {
        return Err(Rejected::TruncatedIpv4(captured));
    }
    let ip = &frame[ETHERNET_HEADER_LEN..];
    let ip_header_len = usize::from(ip[0] & 0x0f) * 4;
    if ip_header_len < IPV4_MIN_HEADER_LEN {
        return Err(Rejected::BadHeaderLength(ip_header_len));
    }
    if ip.len() < ip_header_len {
        return Err(Rejected::TruncatedIpOptions {
            needed: ETHERNET_HEADER_LEN + ip_header_len,
            captured,
        });
    }

    let protocol = Protocol::from_number(ip[9]);
    let src_addr = Ipv4Addr::new(ip[12], ip[13], ip[14], ip[15]);
    let dst_addr = Ipv4Addr::new(ip[16], ip[17], ip[18], ip[19]);

    let transport = &ip[ip_header_len..];
    let (src_port, dst_port, transport_header_len) = match protocol {
        Protocol::Tcp if transport.len() >= TCP_MIN_HEADER_LEN => {
            let data_offset = usize::from(transport[12] >> 4) * 4;
            (
                be_u16(transport, 0),
                be_u16(transport, 2),
                data_offset.max(TCP_MIN_HEADER_LEN),
            )
        }
        Protocol::Udp if transport.len() >= UDP_HEADER_LEN => {
            (be_u16(transport, 0), be_u16(transport, 2), UDP_HEADER_LEN)
        }
        _ => (0, 0, 0),
    };

    // A TCP data offset may point past the captured bytes; that leaves no payload.
    let payload = if transport_header_len > 0 {
        transport.get(transport_header_len..).unwrap_or(&[])
    } else {
        &[]
    };

    Ok(Classified {
        protocol,
        src_addr,
        dst_addr,
        src_port,
        dst_port,
        payload,
    })
}
