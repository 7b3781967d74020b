// Network policy — consensus parameters as pure lookups
//
// This is a configuration surface, not a state machine: every function
// here is deterministic and total over the supported networks. The only
// fault it can raise is the unknown-network configuration fault when
// parsing an identifier.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Target block interval in seconds, shared by every supported network.
pub const BLOCK_TIME_SECS: u64 = 60;

/// Block heights derived from the one-minute block interval.
pub const MINUTE_HEIGHT: u64 = 60 / BLOCK_TIME_SECS;
pub const HOUR_HEIGHT: u64 = 60 * MINUTE_HEIGHT;
pub const DAY_HEIGHT: u64 = 24 * HOUR_HEIGHT;
pub const WEEK_HEIGHT: u64 = 7 * DAY_HEIGHT;
pub const YEAR_HEIGHT: u64 = 52 * WEEK_HEIGHT;

/// Block weight of a single transaction input.
pub const INPUT_WEIGHT: u64 = 1;
/// Block weight of a single transaction output.
pub const OUTPUT_WEIGHT: u64 = 21;
/// Block weight of a single transaction kernel.
pub const KERNEL_WEIGHT: u64 = 3;
/// Maximum total weight of a block.
pub const MAX_BLOCK_WEIGHT: u64 = 40_000;

/// Hard-fork interval for the Grin family (half a year of blocks).
const GRIN_HARD_FORK_INTERVAL: u64 = YEAR_HEIGHT / 2;
/// Height of the MWC C31+ fork, where headers moved to version 2.
const MWC_C31_FORK_HEIGHT: u64 = 202_500;
const MWC_FLOONET_C31_FORK_HEIGHT: u64 = 25_800;

/// A supported network. The slate protocol spans two coin families that
/// share consensus shape but differ in fees, addresses and kernel
/// feature availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    MwcMainnet,
    MwcFloonet,
    GrinMainnet,
    GrinTestnet,
}

impl Network {
    /// Parse a network identifier. Unknown identifiers are the
    /// configuration fault, not the decode fault.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "mwc" | "mwc:mainnet" => Ok(Network::MwcMainnet),
            "mwc:floonet" | "floonet" => Ok(Network::MwcFloonet),
            "grin" | "grin:mainnet" => Ok(Network::GrinMainnet),
            "grin:testnet" => Ok(Network::GrinTestnet),
            other => Err(Error::UnknownNetwork(other.to_string())),
        }
    }

    /// Reassemble a network from the legacy JSON tier's split
    /// `coin_type` / `network_type` tags.
    pub fn from_parts(coin_type: &str, network_type: &str) -> Result<Self> {
        match (coin_type, network_type) {
            ("mwc", "mainnet") => Ok(Network::MwcMainnet),
            ("mwc", "floonet") => Ok(Network::MwcFloonet),
            ("grin", "mainnet") => Ok(Network::GrinMainnet),
            ("grin", "testnet") => Ok(Network::GrinTestnet),
            _ => Err(Error::UnknownNetwork(format!(
                "{coin_type}:{network_type}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::MwcMainnet => "mwc:mainnet",
            Network::MwcFloonet => "mwc:floonet",
            Network::GrinMainnet => "grin:mainnet",
            Network::GrinTestnet => "grin:testnet",
        }
    }

    /// The `coin_type` tag of the legacy JSON tier.
    pub fn coin_type(&self) -> &'static str {
        match self {
            Network::MwcMainnet | Network::MwcFloonet => "mwc",
            Network::GrinMainnet | Network::GrinTestnet => "grin",
        }
    }

    /// The `network_type` tag of the legacy JSON tier.
    pub fn network_type(&self) -> &'static str {
        match self {
            Network::MwcMainnet | Network::GrinMainnet => "mainnet",
            Network::MwcFloonet => "floonet",
            Network::GrinTestnet => "testnet",
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::MwcMainnet | Network::GrinMainnet)
    }

    pub fn is_grin_family(&self) -> bool {
        matches!(self, Network::GrinMainnet | Network::GrinTestnet)
    }

    /// Fee charged per unit of fee-weight, in base units.
    pub fn base_fee(&self) -> u64 {
        match self {
            Network::MwcMainnet | Network::MwcFloonet => 10_000,
            Network::GrinMainnet | Network::GrinTestnet => 500_000,
        }
    }

    /// Blocks a coinbase output must wait before it is spendable.
    pub fn coinbase_maturity(&self) -> u64 {
        DAY_HEIGHT
    }

    /// Upper bound on a single transaction's fee.
    pub fn max_tx_fee(&self) -> u64 {
        (1u64 << 40) - 1
    }

    /// Maximum weight of a single transaction: a block minus the room
    /// reserved for the coinbase output and kernel.
    pub fn max_tx_weight(&self) -> u64 {
        MAX_BLOCK_WEIGHT - OUTPUT_WEIGHT - KERNEL_WEIGHT
    }

    /// Whether the no-recent-duplicate kernel feature exists on this
    /// network at all.
    pub fn nrd_enabled(&self) -> bool {
        self.is_grin_family()
    }

    /// Largest relative height an NRD kernel may reference.
    pub fn max_relative_height(&self) -> u64 {
        WEEK_HEIGHT
    }

    /// Block-header version in force at `height`. Piecewise per the
    /// network's hard-fork history.
    pub fn header_version(&self, height: u64) -> u16 {
        match self {
            Network::MwcMainnet => {
                if height < MWC_C31_FORK_HEIGHT {
                    1
                } else {
                    2
                }
            }
            Network::MwcFloonet => {
                if height < MWC_FLOONET_C31_FORK_HEIGHT {
                    1
                } else {
                    2
                }
            }
            Network::GrinMainnet | Network::GrinTestnet => {
                let era = height / GRIN_HARD_FORK_INTERVAL;
                (era.min(3) + 1) as u16
            }
        }
    }

    /// Fee required for a transaction of the given shape. Outputs cost,
    /// inputs earn back, and the floor is one unit of base fee — which
    /// also makes the result non-decreasing in outputs, weakly
    /// non-increasing in inputs, and never below the per-kernel floor.
    pub fn required_fee(&self, inputs: usize, outputs: usize, kernels: usize) -> u64 {
        let weight = (outputs as i64)
            .saturating_mul(4)
            .saturating_add(kernels as i64)
            .saturating_sub(inputs as i64)
            .max(1) as u64;
        weight.saturating_mul(self.base_fee())
    }
}

/// Block weight of a transaction of the given shape. A transaction
/// always weighs at least one kernel.
pub fn tx_weight(inputs: usize, outputs: usize, kernels: usize) -> u64 {
    (inputs as u64) * INPUT_WEIGHT
        + (outputs as u64) * OUTPUT_WEIGHT
        + (kernels.max(1) as u64) * KERNEL_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_network_is_config_fault() {
        let err = Network::from_name("doge").unwrap_err();
        assert!(matches!(err, Error::UnknownNetwork(_)));
    }

    #[test]
    fn test_name_roundtrip() {
        for net in [
            Network::MwcMainnet,
            Network::MwcFloonet,
            Network::GrinMainnet,
            Network::GrinTestnet,
        ] {
            assert_eq!(Network::from_name(net.name()).unwrap(), net);
            assert_eq!(
                Network::from_parts(net.coin_type(), net.network_type()).unwrap(),
                net
            );
        }
    }

    #[test]
    fn test_required_fee_reference_shape() {
        // 1 input, 2 outputs, 1 kernel on MWC mainnet: (4*2 + 1 - 1) * 10_000
        assert_eq!(Network::MwcMainnet.required_fee(1, 2, 1), 80_000);
    }

    #[test]
    fn test_required_fee_floor() {
        // Many inputs cannot push the fee below one unit of base fee.
        for net in [Network::MwcMainnet, Network::GrinMainnet] {
            assert_eq!(net.required_fee(500, 1, 1), net.base_fee());
        }
    }

    #[test]
    fn test_required_fee_monotonic_in_outputs() {
        let net = Network::GrinMainnet;
        let mut last = 0;
        for outputs in 1..20 {
            let fee = net.required_fee(2, outputs, 1);
            assert!(fee >= last);
            last = fee;
        }
    }

    #[test]
    fn test_required_fee_weakly_decreasing_in_inputs() {
        let net = Network::MwcFloonet;
        let mut last = u64::MAX;
        for inputs in 0..20 {
            let fee = net.required_fee(inputs, 3, 1);
            assert!(fee <= last);
            last = fee;
        }
    }

    #[test]
    fn test_header_version_boundaries() {
        assert_eq!(Network::MwcMainnet.header_version(0), 1);
        assert_eq!(Network::MwcMainnet.header_version(202_499), 1);
        assert_eq!(Network::MwcMainnet.header_version(202_500), 2);

        assert_eq!(Network::GrinMainnet.header_version(0), 1);
        assert_eq!(Network::GrinMainnet.header_version(YEAR_HEIGHT / 2), 2);
        assert_eq!(Network::GrinMainnet.header_version(YEAR_HEIGHT), 3);
        // Versions cap at 4 after the third fork.
        assert_eq!(Network::GrinMainnet.header_version(10 * YEAR_HEIGHT), 4);
    }

    #[test]
    fn test_nrd_grin_only() {
        assert!(Network::GrinMainnet.nrd_enabled());
        assert!(Network::GrinTestnet.nrd_enabled());
        assert!(!Network::MwcMainnet.nrd_enabled());
        assert!(!Network::MwcFloonet.nrd_enabled());
    }

    #[test]
    fn test_tx_weight_counts_at_least_one_kernel() {
        assert_eq!(tx_weight(0, 0, 0), KERNEL_WEIGHT);
        assert_eq!(tx_weight(2, 1, 1), 2 + 21 + 3);
    }
}
