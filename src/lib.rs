/// This module contains the supported networks and the [ChainRegistry](chains::ChainRegistry).
pub mod chains;
/// This module contains the RPC-backed read-only and signing clients.
pub mod client;
/// This module contains TOML configuration loading.
pub mod config;
/// This module contains the SwapRouter calldata encoder.
pub mod encoder;
pub mod error;
/// This module contains the [QuotePreparer](preparer::QuotePreparer), which turns
/// a swap request into a ready-to-sign router call.
pub mod preparer;
/// This module contains the on-chain QuoterV2 [quote provider](types::QuoteProvider).
pub mod quoter;
pub mod tokens;
/// This module contains the core type definitions and collaborator traits.
pub mod types;
/// This module contains exact decimal/base-unit conversion.
pub mod units;

pub use error::{Result, SwapError};
