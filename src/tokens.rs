//! Token definitions for the supported networks

use alloy::primitives::{address, Address};

use crate::chains::{ChainDescriptor, ARBITRUM_ONE, BASE, BNB_CHAIN, ETHEREUM};
use crate::error::{Result, SwapError};

/// A fungible token on a specific chain. Two tokens with the same address on
/// different chains are different tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl Token {
    pub fn new(
        chain_id: u64,
        address: Address,
        decimals: u8,
        symbol: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// `(address, decimals, symbol, name)`.
type TokenEntry = (Address, u8, &'static str, &'static str);

const ETHEREUM_TOKENS: &[TokenEntry] = &[
    (address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18, "WETH", "Wrapped Ether"),
    (address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6, "USDC", "USD Coin"),
    (address!("0xdAC17F958D2ee523a2206206994597C13D831ec7"), 6, "USDT", "Tether USD"),
    (address!("0x6B175474E89094C44Da98b954EedeAC495271d0F"), 18, "DAI", "Dai Stablecoin"),
];

const BASE_TOKENS: &[TokenEntry] = &[
    (address!("0x4200000000000000000000000000000000000006"), 18, "WETH", "Wrapped Ether"),
    (address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"), 6, "USDC", "USD Coin"),
    (address!("0xfde4C96c8593536E31F229EA8f37b2ADa2699bb2"), 6, "USDT", "Tether USD"),
    (address!("0x50c5725949A6F0c72E6C4a641F24049A917DB0Cb"), 18, "DAI", "Dai Stablecoin"),
];

const ARBITRUM_TOKENS: &[TokenEntry] = &[
    (address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"), 18, "WETH", "Wrapped Ether"),
    (address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), 6, "USDC", "USD Coin"),
    (address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"), 6, "USDT", "Tether USD"),
    (address!("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"), 18, "DAI", "Dai Stablecoin"),
];

// bridged stables use 18 decimals on BNB Smart Chain
const BNB_CHAIN_TOKENS: &[TokenEntry] = &[
    (address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"), 18, "WBNB", "Wrapped BNB"),
    (address!("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"), 18, "USDC", "USD Coin"),
    (address!("0x55d398326f99059fF775485246999027B3197955"), 18, "USDT", "Tether USD"),
    (address!("0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56"), 18, "BUSD", "Binance USD"),
];

fn builtin_tokens() -> Vec<Token> {
    [
        (ETHEREUM, ETHEREUM_TOKENS),
        (BASE, BASE_TOKENS),
        (ARBITRUM_ONE, ARBITRUM_TOKENS),
        (BNB_CHAIN, BNB_CHAIN_TOKENS),
    ]
    .into_iter()
    .flat_map(|(chain_id, entries)| {
        entries.iter().map(move |&(address, decimals, symbol, name)| {
            Token::new(chain_id, address, decimals, symbol, name)
        })
    })
    .collect()
}

/// Well-known tokens per chain.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn builtin() -> Self {
        Self {
            tokens: builtin_tokens(),
        }
    }

    pub fn on_chain(&self, chain_id: u64) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| t.chain_id == chain_id)
    }

    /// Case-insensitive symbol lookup.
    pub fn by_symbol(&self, chain_id: u64, symbol: &str) -> Result<&Token> {
        self.on_chain(chain_id)
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| {
                SwapError::invalid(format!("unknown token {} on chain {}", symbol, chain_id))
            })
    }

    pub fn by_address(&self, chain_id: u64, address: Address) -> Option<&Token> {
        self.on_chain(chain_id).find(|t| t.address == address)
    }

    /// Symbol first, then a raw address known to the registry.
    pub fn resolve(&self, chain_id: u64, symbol_or_address: &str) -> Result<&Token> {
        if let Ok(address) = symbol_or_address.parse::<Address>() {
            return self.by_address(chain_id, address).ok_or_else(|| {
                SwapError::invalid(format!(
                    "token {} is not registered on chain {}",
                    address, chain_id
                ))
            });
        }
        self.by_symbol(chain_id, symbol_or_address)
    }

    /// The wrapped native token of `chain` (WETH, WBNB).
    pub fn wrapped_native(&self, chain: &ChainDescriptor) -> Result<&Token> {
        self.by_address(chain.chain_id, chain.wrapped_native)
            .ok_or_else(|| {
                SwapError::Config(format!("no wrapped native token registered for {}", chain.name))
            })
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
