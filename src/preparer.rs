//! Quote-to-calldata preparation for single-hop exact-input swaps.
//!
//! [`QuotePreparer::prepare`] validates a [`SwapRequest`], asks the quote
//! provider for the expected output, derives the slippage-guarded minimum,
//! and encodes a router call. It needs no signer and keeps no state between
//! calls.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::U256;
use tracing::{debug, info};

use crate::chains::ChainDescriptor;
use crate::error::{Result, SwapError};
use crate::types::{
    ExactInputSingle, FeeTier, NativeInput, PreparedTransaction, Quote, QuoteProvider,
    SlippageTolerance, SwapRequest, TransactionEncoder,
};
use crate::units::parse_amount;

/// Every swap goes through the 0.3% pool.
pub const SWAP_FEE_TIER: FeeTier = FeeTier::Medium;

pub struct QuotePreparer<Q, E> {
    chain: ChainDescriptor,
    quoter: Q,
    encoder: E,
}

/// Request fields after validation, in base units.
#[derive(Debug)]
struct Checked {
    slippage: SlippageTolerance,
    amount_in: U256,
    deadline_secs: u64,
}

impl<Q, E> QuotePreparer<Q, E>
where
    Q: QuoteProvider,
    E: TransactionEncoder,
{
    pub fn new(chain: &ChainDescriptor, quoter: Q, encoder: E) -> Self {
        Self {
            chain: chain.clone(),
            quoter,
            encoder,
        }
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn quoter(&self) -> &Q {
        &self.quoter
    }

    /// Prepares the router call using the current wall clock for the deadline.
    pub async fn prepare(&self, request: &SwapRequest) -> Result<PreparedTransaction> {
        self.prepare_at(request, unix_now()?).await
    }

    /// Same as [`prepare`](Self::prepare) with an explicit "now" in seconds
    /// since the epoch.
    pub async fn prepare_at(
        &self,
        request: &SwapRequest,
        now_secs: u64,
    ) -> Result<PreparedTransaction> {
        self.prepare_quoted_at(request, now_secs)
            .await
            .map(|(tx, _)| tx)
    }

    /// Prepares the router call and hands back the quote it was built from.
    pub async fn prepare_quoted(
        &self,
        request: &SwapRequest,
    ) -> Result<(PreparedTransaction, Quote)> {
        self.prepare_quoted_at(request, unix_now()?).await
    }

    pub async fn prepare_quoted_at(
        &self,
        request: &SwapRequest,
        now_secs: u64,
    ) -> Result<(PreparedTransaction, Quote)> {
        let checked = self.check(request)?;
        let (symbol_in, symbol_out) = request.pair();

        let quote = self
            .quoter
            .quote(
                &request.token_in,
                &request.token_out,
                &request.amount_in,
                SWAP_FEE_TIER,
            )
            .await
            .map_err(|e| match e {
                e @ SwapError::QuoteUnavailable { .. } => e,
                other => quote_unavailable(&symbol_in, &symbol_out, other.to_string()),
            })?;

        let amount_out = parse_amount(&quote.amount_out, request.token_out.decimals)
            .map_err(|e| quote_unavailable(&symbol_in, &symbol_out, e.to_string()))?;
        if amount_out.is_zero() {
            return Err(quote_unavailable(&symbol_in, &symbol_out, "quoted output is zero"));
        }

        let amount_out_minimum = checked.slippage.min_amount_out(amount_out);
        let deadline = now_secs
            .checked_add(checked.deadline_secs)
            .ok_or_else(|| SwapError::invalid("deadline overflows u64 seconds"))?;

        debug!(
            "{} {} -> {} {} (min {} base units, slippage {})",
            request.amount_in, symbol_in, quote.amount_out, symbol_out, amount_out_minimum,
            checked.slippage
        );

        let params = ExactInputSingle {
            token_in: request.token_in.address,
            token_out: request.token_out.address,
            fee: SWAP_FEE_TIER.as_u32(),
            recipient: request.recipient,
            deadline: U256::from(deadline),
            amount_in: checked.amount_in,
            amount_out_minimum,
            sqrt_price_limit_x96: U256::ZERO,
        };

        let data = self.encoder.encode_exact_input_single(&params).map_err(|e| match e {
            e @ SwapError::EncodingError(_) => e,
            other => SwapError::EncodingError(format!(
                "{} -> {}: {}",
                symbol_in, symbol_out, other
            )),
        })?;

        let value = if self.attaches_native_value(request) {
            checked.amount_in
        } else {
            U256::ZERO
        };

        info!(
            "prepared {} -> {} on {}: value {} wei, {} bytes calldata",
            symbol_in,
            symbol_out,
            self.chain.name,
            value,
            data.len()
        );

        let tx = PreparedTransaction {
            to: self.chain.router,
            data,
            value,
            gas_estimate: quote.gas_estimate,
        };
        Ok((tx, quote))
    }

    /// Native value is attached when the input token is the chain's wrapped
    /// native token, unless the request opts into ERC-20 spending.
    pub fn attaches_native_value(&self, request: &SwapRequest) -> bool {
        request.native_input == NativeInput::Auto
            && request.token_in.address == self.chain.wrapped_native
    }

    fn check(&self, request: &SwapRequest) -> Result<Checked> {
        let slippage = SlippageTolerance::from_percent(request.slippage_percent)?;

        if request.deadline_secs <= 0 {
            return Err(SwapError::invalid(format!(
                "deadline must be a positive number of seconds, got {}",
                request.deadline_secs
            )));
        }

        for token in [&request.token_in, &request.token_out] {
            if token.chain_id != self.chain.chain_id {
                return Err(SwapError::invalid(format!(
                    "{} is on chain {}, expected {} ({})",
                    token.symbol, token.chain_id, self.chain.chain_id, self.chain.name
                )));
            }
        }
        if request.token_in.address == request.token_out.address {
            return Err(SwapError::invalid(format!(
                "cannot swap {} for itself",
                request.token_in.symbol
            )));
        }

        let amount_in = parse_amount(&request.amount_in, request.token_in.decimals)?;
        if amount_in.is_zero() {
            return Err(SwapError::invalid("amount in must be greater than zero"));
        }

        Ok(Checked {
            slippage,
            amount_in,
            deadline_secs: request.deadline_secs as u64,
        })
    }
}

fn quote_unavailable(token_in: &str, token_out: &str, reason: impl Into<String>) -> SwapError {
    SwapError::QuoteUnavailable {
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        reason: reason.into(),
    }
}

pub fn unix_now() -> Result<u64> {
    secs_since_epoch(SystemTime::now())
}

fn secs_since_epoch(time: SystemTime) -> Result<u64> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| SwapError::Config(format!("system clock before unix epoch: {}", e)))
}
