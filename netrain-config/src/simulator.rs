//! Synthetic tap configuration used by the `simulate` command.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulatorConfig {
    /// Seed for deterministic frame generation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Address the synthetic host owns; frames towards it are inbound.
    #[serde(default = "default_local_address")]
    pub local_address: Ipv4Addr,

    /// Frames produced before the tap reports an idle poll.
    #[validate(range(min = 1, max = 4096))]
    #[serde(default = "default_burst")]
    pub burst: usize,

    /// Share of frames deliberately truncated or non-IPv4.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_malformed_ratio")]
    pub malformed_ratio: f64,

    /// Share of flows using an encrypted port.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_encrypted_ratio")]
    pub encrypted_ratio: f64,
}

fn default_seed() -> u64 {
    42
}

fn default_local_address() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, 10)
}

fn default_burst() -> usize {
    8
}

fn default_malformed_ratio() -> f64 {
    0.02
}

fn default_encrypted_ratio() -> f64 {
    0.6
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            local_address: default_local_address(),
            burst: default_burst(),
            malformed_ratio: default_malformed_ratio(),
            encrypted_ratio: default_encrypted_ratio(),
        }
    }
}
