//! Supported networks.
//!
//! The registry is built once at startup and handed around by reference.
//! Nothing in here is mutable after construction; RPC overrides are applied
//! while building.

use std::collections::BTreeMap;

use alloy::primitives::{address, Address};
use tracing::debug;

use crate::error::{Result, SwapError};

pub const ETHEREUM: u64 = 1;
pub const BNB_CHAIN: u64 = 56;
pub const BASE: u64 = 8453;
pub const ARBITRUM_ONE: u64 = 42161;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Calldata layout a chain's router expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouterKind {
    /// `SwapRouter`: `deadline` is a field of the params struct.
    #[default]
    SwapRouter,
    /// `SwapRouter02`: no deadline in the params, the call is wrapped in
    /// `multicall(deadline, data)`.
    SwapRouter02,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: String,
    pub native_currency: NativeCurrency,
    pub router: Address,
    pub router_kind: RouterKind,
    pub quoter: Address,
    /// Canonical wrapped native token (WETH, WBNB).
    pub wrapped_native: Address,
}

const ETHER: NativeCurrency = NativeCurrency {
    name: "Ether",
    symbol: "ETH",
    decimals: 18,
};

fn builtin_chains() -> Vec<ChainDescriptor> {
    vec![
        ChainDescriptor {
            chain_id: ETHEREUM,
            name: "Ethereum",
            rpc_url: "https://eth.llamarpc.com".to_string(),
            native_currency: ETHER,
            router: address!("0xE592427A0AEce92De3Edee1F18E0157C05861564"),
            router_kind: RouterKind::SwapRouter,
            quoter: address!("0xb27308f9F90D607463bb33eA1BeBb41C27CE5AB6"),
            wrapped_native: address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
        },
        ChainDescriptor {
            chain_id: BASE,
            name: "Base",
            rpc_url: "https://mainnet.base.org".to_string(),
            native_currency: ETHER,
            router: address!("0x2626664c2603336E57B271c5C0b26F421741e481"),
            router_kind: RouterKind::SwapRouter02,
            quoter: address!("0x3d4e44Eb1374240CE5F1B871ab261CD16335B76a"),
            wrapped_native: address!("0x4200000000000000000000000000000000000006"),
        },
        ChainDescriptor {
            chain_id: ARBITRUM_ONE,
            name: "Arbitrum One",
            rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
            native_currency: ETHER,
            router: address!("0xE592427A0AEce92De3Edee1F18E0157C05861564"),
            router_kind: RouterKind::SwapRouter,
            quoter: address!("0xb27308f9F90D607463bb33eA1BeBb41C27CE5AB6"),
            wrapped_native: address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
        },
        ChainDescriptor {
            chain_id: BNB_CHAIN,
            name: "BNB Smart Chain",
            rpc_url: "https://bsc-dataseed.binance.org".to_string(),
            native_currency: NativeCurrency {
                name: "BNB",
                symbol: "BNB",
                decimals: 18,
            },
            router: address!("0xB971eF87ede563556b2ED4b1C0b0019111Dd85d2"),
            router_kind: RouterKind::SwapRouter02,
            quoter: address!("0x78D78E420Da98ad378D7799bE8f4AF69033EB077"),
            wrapped_native: address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
        },
    ]
}

/// Environment variable that overrides the RPC endpoint of a chain.
pub fn rpc_env_var(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        ETHEREUM => Some("ETHEREUM_RPC_URL"),
        BASE => Some("BASE_RPC_URL"),
        ARBITRUM_ONE => Some("ARBITRUM_RPC_URL"),
        BNB_CHAIN => Some("BNB_RPC_URL"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainDescriptor>,
}

impl ChainRegistry {
    /// Registry with the public default endpoints.
    pub fn builtin() -> Self {
        Self {
            chains: builtin_chains()
                .into_iter()
                .map(|chain| (chain.chain_id, chain))
                .collect(),
        }
    }

    /// Builtin registry with `*_RPC_URL` environment overrides applied.
    pub fn from_env() -> Self {
        let overrides = builtin_chains()
            .iter()
            .filter_map(|chain| {
                let var = rpc_env_var(chain.chain_id)?;
                std::env::var(var).ok().map(|url| (chain.chain_id, url))
            })
            .collect::<BTreeMap<_, _>>();
        Self::builtin().with_rpc_overrides(&overrides)
    }

    /// Replaces RPC endpoints for the given chain ids. Unknown ids are ignored.
    pub fn with_rpc_overrides(mut self, overrides: &BTreeMap<u64, String>) -> Self {
        for (chain_id, url) in overrides {
            if let Some(chain) = self.chains.get_mut(chain_id) {
                debug!("rpc override for {}: {}", chain.name, url);
                chain.rpc_url = url.clone();
            }
        }
        self
    }

    pub fn lookup(&self, chain_id: u64) -> Result<&ChainDescriptor> {
        self.chains
            .get(&chain_id)
            .ok_or(SwapError::UnsupportedChain(chain_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.values()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
