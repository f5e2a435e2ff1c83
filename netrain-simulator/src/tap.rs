//! Seeded synthetic tap.
//!
//! Produces a reproducible mix of encrypted and cleartext flows between one local address
//! and random peers, plus occasional malformed frames. Frames come in bursts of
//! `burst`, each followed by one idle poll, so the capture loop sees realistic pacing.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use netrain_capture::{CaptureError, CounterSource, FrameSource};
use netrain_config::SimulatorConfig;
use netrain_protocols::ENCRYPTED_PORTS;

use crate::frames;

/// Largest synthetic payload.
pub const MAX_PAYLOAD: usize = 512;

/// Cleartext services and whether they ride on UDP.
const CLEARTEXT_SERVICES: [(u16, bool); 7] = [
    (80, false),
    (8080, false),
    (25, false),
    (53, true),
    (123, true),
    (5353, true),
    (1900, true),
];

const EPHEMERAL_PORTS: std::ops::RangeInclusive<u16> = 32768..=60999;
const ICMP_SHARE: f64 = 0.05;

/// Byte total of everything the tap has emitted; stands in for interface counters.
#[derive(Clone, Debug, Default)]
pub struct TapCounters {
    bytes: Arc<AtomicU64>,
}

impl TapCounters {
    fn add(&self, bytes: usize) {
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl CounterSource for TapCounters {
    fn read_total_bytes(&mut self) -> Result<u64, CaptureError> {
        Ok(self.total_bytes())
    }
}

pub struct SyntheticTap {
    rng: SmallRng,
    local: Ipv4Addr,
    burst: usize,
    malformed_ratio: f64,
    encrypted_ratio: f64,
    emitted_in_burst: usize,
    frame: Vec<u8>,
    payload: Vec<u8>,
    counters: TapCounters,
}

impl SyntheticTap {
    pub fn new(config: &SimulatorConfig) -> Self {
        debug!(seed = config.seed, local = %config.local_address, "Synthetic tap created");
        Self {
            rng: SmallRng::seed_from_u64(config.seed),
            local: config.local_address,
            burst: config.burst.max(1),
            malformed_ratio: config.malformed_ratio.clamp(0.0, 1.0),
            encrypted_ratio: config.encrypted_ratio.clamp(0.0, 1.0),
            emitted_in_burst: 0,
            frame: Vec::with_capacity(1514),
            payload: Vec::with_capacity(MAX_PAYLOAD),
            counters: TapCounters::default(),
        }
    }

    pub fn local_address(&self) -> Ipv4Addr {
        self.local
    }

    /// Shared handle on the emitted byte total.
    pub fn counters(&self) -> TapCounters {
        self.counters.clone()
    }

    fn random_peer(&mut self) -> Ipv4Addr {
        loop {
            let peer = Ipv4Addr::new(
                self.rng.random_range(1..=223),
                self.rng.random(),
                self.rng.random(),
                self.rng.random_range(1..=254),
            );
            if peer != self.local && !peer.is_loopback() {
                return peer;
            }
        }
    }

    fn fill_payload(&mut self) {
        let len = self.rng.random_range(0..=MAX_PAYLOAD);
        self.payload.resize(len, 0);
        self.rng.fill(&mut self.payload[..]);
    }

    fn write_malformed(&mut self) {
        let peer = self.random_peer();
        match self.rng.random_range(0..3) {
            0 => {
                let len = self.rng.random_range(0..14);
                self.frame.clear();
                self.frame.resize(len, 0);
            }
            1 => frames::write_arp_frame(&mut self.frame, self.local, peer),
            _ => {
                // Valid frame whose IHL claims a 12-byte header.
                frames::write_icmp_frame(&mut self.frame, peer, self.local, &[]);
                self.frame[14] = 0x43;
            }
        }
    }

    fn write_flow(&mut self) {
        let peer = self.random_peer();
        let inbound = self.rng.random_bool(0.5);
        self.fill_payload();

        let encrypted = self.rng.random_bool(self.encrypted_ratio);
        if !encrypted && self.rng.random_bool(ICMP_SHARE) {
            let (src, dst) = if inbound { (peer, self.local) } else { (self.local, peer) };
            frames::write_icmp_frame(&mut self.frame, src, dst, &self.payload);
            return;
        }

        let (service, udp) = if encrypted {
            (ENCRYPTED_PORTS[self.rng.random_range(0..ENCRYPTED_PORTS.len())], false)
        } else {
            CLEARTEXT_SERVICES[self.rng.random_range(0..CLEARTEXT_SERVICES.len())]
        };
        let ephemeral = self.rng.random_range(EPHEMERAL_PORTS);

        let remote = SocketAddrV4::new(peer, service);
        let local = SocketAddrV4::new(self.local, ephemeral);
        let (src, dst) = if inbound { (remote, local) } else { (local, remote) };

        if udp {
            frames::write_udp_frame(&mut self.frame, src, dst, &self.payload);
        } else {
            frames::write_tcp_frame(&mut self.frame, src, dst, &self.payload);
        }
    }
}

impl FrameSource for SyntheticTap {
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        if self.emitted_in_burst >= self.burst {
            self.emitted_in_burst = 0;
            return Ok(None);
        }
        self.emitted_in_burst += 1;

        if self.rng.random_bool(self.malformed_ratio) {
            self.write_malformed();
        } else {
            self.write_flow();
        }

        self.counters.add(self.frame.len());
        Ok(Some(&self.frame))
    }
}
