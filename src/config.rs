//! Node configuration
//!
//! With the `json-config` feature the configuration is generated at build time
//! from a JSON file, otherwise the defaults defined here are used.

use crate::hal_ext::{can::BitTiming, exti::Edge};

#[cfg(feature = "json-config")]
pub use generated::CONFIG;

#[cfg(not(feature = "json-config"))]
pub use code::CONFIG;

#[cfg(feature = "json-config")]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

#[cfg(not(feature = "json-config"))]
mod code {
    use super::*;

    pub static CONFIG: NodeConfig = NodeConfig {
        bus: BusConfig {
            bitrate: Bitrate::Kbps25,
            loopback: false,
            silent: false,
        },
        tx_timeout_ms: 1000,
        trigger: TriggerConfig {
            edge: Edge::Rising,
        },
    };
}

pub struct NodeConfig {
    pub bus: BusConfig,
    /// Time limit for a single transmission attempt
    pub tx_timeout_ms: u32,
    pub trigger: TriggerConfig,
}

pub struct BusConfig {
    pub bitrate: Bitrate,
    /// Receive own frames internally, for testing a single node
    pub loopback: bool,
    /// Do not drive the bus
    pub silent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Bitrate {
    Kbps25,
    Kbps50,
    Kbps100,
    Kbps125,
    Kbps250,
    Kbps500,
    Kbps800,
    Mbps1,
}

impl Bitrate {
    pub const fn hz(&self) -> u32 {
        match self {
            Self::Kbps25 => 25_000,
            Self::Kbps50 => 50_000,
            Self::Kbps100 => 100_000,
            Self::Kbps125 => 125_000,
            Self::Kbps250 => 250_000,
            Self::Kbps500 => 500_000,
            Self::Kbps800 => 800_000,
            Self::Mbps1 => 1_000_000,
        }
    }
}

impl BusConfig {
    /// Bit timing for given CAN peripheral clock
    pub fn bit_timing(&self, pclk_hz: u32) -> Option<BitTiming> {
        BitTiming::for_bitrate(pclk_hz, self.bitrate.hz())
    }
}

/// External trigger (button) configuration
pub struct TriggerConfig {
    pub edge: Edge,
}
