//! # Frame builders
//!
//! Writes Ethernet II + IPv4 frames into a reusable buffer. The IPv4 header checksum is
//! filled in; transport checksums are left at zero, as offloading NICs hand them to taps.

use std::net::{Ipv4Addr, SocketAddrV4};

use netrain_protocols::Protocol;

const ETHERTYPE_IPV4: u16 = 0x0800;
const DEFAULT_TTL: u8 = 64;

const LOCAL_MAC: [u8; 6] = [0x02, 0x6e, 0x72, 0x00, 0x00, 0x01];
const GATEWAY_MAC: [u8; 6] = [0x02, 0x6e, 0x72, 0x00, 0x00, 0xfe];

/// One's-complement sum over a header, as used by IPv4.
pub fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks(2)
        .map(|pair| {
            let hi = u32::from(pair[0]) << 8;
            let lo = pair.get(1).copied().map(u32::from).unwrap_or(0);
            hi | lo
        })
        .sum();
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

fn write_ethernet(buf: &mut Vec<u8>, ethertype: u16) {
    buf.extend_from_slice(&GATEWAY_MAC);
    buf.extend_from_slice(&LOCAL_MAC);
    buf.extend_from_slice(&ethertype.to_be_bytes());
}

fn write_ipv4(buf: &mut Vec<u8>, src: Ipv4Addr, dst: Ipv4Addr, protocol: Protocol, body_len: usize) {
    let start = buf.len();
    let total_len = u16::try_from(20 + body_len).unwrap_or(u16::MAX);

    buf.extend_from_slice(&[0x45, 0x00]);
    buf.extend_from_slice(&total_len.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x00, 0x40, 0x00]); // id, DF
    buf.push(DEFAULT_TTL);
    buf.push(protocol.number());
    buf.extend_from_slice(&[0x00, 0x00]);
    buf.extend_from_slice(&src.octets());
    buf.extend_from_slice(&dst.octets());

    let checksum = ipv4_checksum(&buf[start..start + 20]);
    buf[start + 10..start + 12].copy_from_slice(&checksum.to_be_bytes());
}

/// Writes a TCP segment (PSH|ACK, no options).
pub fn write_tcp_frame(buf: &mut Vec<u8>, src: SocketAddrV4, dst: SocketAddrV4, payload: &[u8]) {
    buf.clear();
    write_ethernet(buf, ETHERTYPE_IPV4);
    write_ipv4(buf, *src.ip(), *dst.ip(), Protocol::Tcp, 20 + payload.len());
    buf.extend_from_slice(&src.port().to_be_bytes());
    buf.extend_from_slice(&dst.port().to_be_bytes());
    buf.extend_from_slice(&1u32.to_be_bytes()); // seq
    buf.extend_from_slice(&1u32.to_be_bytes()); // ack
    buf.extend_from_slice(&[0x50, 0x18, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00]);
    buf.extend_from_slice(payload);
}

pub fn write_udp_frame(buf: &mut Vec<u8>, src: SocketAddrV4, dst: SocketAddrV4, payload: &[u8]) {
    buf.clear();
    write_ethernet(buf, ETHERTYPE_IPV4);
    write_ipv4(buf, *src.ip(), *dst.ip(), Protocol::Udp, 8 + payload.len());
    let udp_len = u16::try_from(8 + payload.len()).unwrap_or(u16::MAX);
    buf.extend_from_slice(&src.port().to_be_bytes());
    buf.extend_from_slice(&dst.port().to_be_bytes());
    buf.extend_from_slice(&udp_len.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x00]);
    buf.extend_from_slice(payload);
}

/// Writes an ICMP echo request carrying `payload`.
pub fn write_icmp_frame(buf: &mut Vec<u8>, src: Ipv4Addr, dst: Ipv4Addr, payload: &[u8]) {
    buf.clear();
    write_ethernet(buf, ETHERTYPE_IPV4);
    write_ipv4(buf, src, dst, Protocol::Icmp, 8 + payload.len());
    buf.extend_from_slice(&[0x08, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01]);
    buf.extend_from_slice(payload);
}

/// Writes an ARP request, which the header parser must reject as non-IPv4.
pub fn write_arp_frame(buf: &mut Vec<u8>, sender: Ipv4Addr, target: Ipv4Addr) {
    buf.clear();
    write_ethernet(buf, 0x0806);
    buf.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
    buf.extend_from_slice(&LOCAL_MAC);
    buf.extend_from_slice(&sender.octets());
    buf.extend_from_slice(&[0; 6]);
    buf.extend_from_slice(&target.octets());
}
