use std::sync::Arc;

use alloy::{
    primitives::{
        aliases::{U160, U24},
        Address,
    },
    providers::Provider,
    sol,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Result, SwapError};
use crate::tokens::Token;
use crate::types::{FeeTier, Quote, QuoteProvider};
use crate::units::{format_amount, parse_amount};

sol! {
    #[sol(rpc)]
    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external
            returns (
                uint256 amountOut,
                uint160 sqrtPriceX96After,
                uint32 initializedTicksCrossed,
                uint256 gasEstimate
            );
    }
}

/// Price impact is not derived from pool state; quotes carry this flat figure.
pub const ESTIMATED_PRICE_IMPACT_PERCENT: f64 = 0.1;

/// Quotes through the QuoterV2 contract with `eth_call`.
pub struct QuoterV2Provider<P> {
    provider: Arc<P>,
    quoter: Address,
}

impl<P> QuoterV2Provider<P> {
    pub fn new(provider: Arc<P>, quoter: Address) -> Self {
        Self { provider, quoter }
    }
}

#[async_trait]
impl<P> QuoteProvider for QuoterV2Provider<P>
where
    P: Provider + 'static,
{
    async fn quote(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: &str,
        fee: FeeTier,
    ) -> Result<Quote> {
        let unavailable = |reason: String| SwapError::QuoteUnavailable {
            token_in: token_in.symbol.clone(),
            token_out: token_out.symbol.clone(),
            reason,
        };

        let amount_in_units = parse_amount(amount_in, token_in.decimals)?;
        debug!(
            "quoting {} {} -> {} via {} (fee {})",
            amount_in, token_in.symbol, token_out.symbol, self.quoter, fee
        );

        let params = IQuoterV2::QuoteExactInputSingleParams {
            tokenIn: token_in.address,
            tokenOut: token_out.address,
            amountIn: amount_in_units,
            fee: U24::from(fee.as_u32()),
            sqrtPriceLimitX96: U160::ZERO,
        };

        let quoter = IQuoterV2::new(self.quoter, &*self.provider);
        let result = quoter
            .quoteExactInputSingle(params)
            .call()
            .await
            .map_err(|e| {
                warn!("quote {} -> {} failed: {}", token_in.symbol, token_out.symbol, e);
                unavailable(e.to_string())
            })?;

        let amount_out = format_amount(result.amountOut, token_out.decimals)?;

        Ok(Quote {
            amount_out,
            gas_estimate: result.gasEstimate,
            price_impact_percent: ESTIMATED_PRICE_IMPACT_PERCENT,
            route: vec![token_in.symbol.clone(), token_out.symbol.clone()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{ChainRegistry, BASE};
    use crate::tokens::TokenRegistry;
    use alloy::{
        primitives::{Bytes, U256},
        providers::{mock::Asserter, DynProvider, ProviderBuilder},
        sol_types::SolCall,
    };

    fn base_quoter(asserter: &Asserter) -> QuoterV2Provider<DynProvider> {
        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased();
        let chains = ChainRegistry::builtin();
        QuoterV2Provider::new(Arc::new(provider), chains.lookup(BASE).unwrap().quoter)
    }

    fn base_token(symbol: &str) -> Token {
        TokenRegistry::builtin()
            .by_symbol(BASE, symbol)
            .unwrap()
            .clone()
    }

    fn quoter_returns(amount_out: u64, gas_estimate: u64) -> Bytes {
        let ret = IQuoterV2::quoteExactInputSingleReturn {
            amountOut: U256::from(amount_out),
            sqrtPriceX96After: U160::ZERO,
            initializedTicksCrossed: 1,
            gasEstimate: U256::from(gas_estimate),
        };
        IQuoterV2::quoteExactInputSingleCall::abi_encode_returns(&ret).into()
    }

    #[tokio::test]
    async fn test_quote_formats_output_decimals() {
        let asserter = Asserter::new();
        asserter.push_success(&quoter_returns(250_123_456, 150_000));
        let quoter = base_quoter(&asserter);

        let quote = quoter
            .quote(&base_token("WETH"), &base_token("USDT"), "0.1", FeeTier::Medium)
            .await
            .unwrap();

        assert_eq!(quote.amount_out, "250.123456");
        assert_eq!(quote.gas_estimate, U256::from(150_000u64));
        assert_eq!(quote.price_impact_percent, ESTIMATED_PRICE_IMPACT_PERCENT);
        assert_eq!(quote.route, vec!["WETH".to_string(), "USDT".to_string()]);
    }

    #[tokio::test]
    async fn test_revert_is_quote_unavailable() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("execution reverted");
        let quoter = base_quoter(&asserter);

        let err = quoter
            .quote(&base_token("WETH"), &base_token("USDT"), "0.1", FeeTier::Medium)
            .await
            .unwrap_err();

        match err {
            SwapError::QuoteUnavailable {
                token_in,
                token_out,
                reason,
            } => {
                assert_eq!(token_in, "WETH");
                assert_eq!(token_out, "USDT");
                assert!(reason.contains("execution reverted"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_amount_never_reaches_the_node() {
        // nothing queued: any request would fail with a transport error
        let asserter = Asserter::new();
        let quoter = base_quoter(&asserter);

        let err = quoter
            .quote(&base_token("USDT"), &base_token("WETH"), "1.0000001", FeeTier::Medium)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidParameter(_)));
    }
}
