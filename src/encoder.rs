use alloy::{
    primitives::{
        aliases::{U160, U24},
        Bytes,
    },
    sol,
    sol_types::SolCall,
};

use crate::chains::RouterKind;
use crate::error::{Result, SwapError};
use crate::types::{ExactInputSingle, TransactionEncoder};

sol! {
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

sol! {
    interface ISwapRouter02 {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
        function multicall(uint256 deadline, bytes[] calldata data) external payable returns (bytes[] memory results);
    }
}

const MAX_UINT24: u32 = (1 << 24) - 1;

/// ABI encoder for the router `exactInputSingle` call.
///
/// [`SolEncoder::new`] emits the `SwapRouter` layout with the deadline inside
/// the params (selector `0x414bf389`). `SwapRouter02` deployments (Base, BNB
/// Chain) have no such selector and revert on it; use
/// [`SolEncoder::for_router`] with the chain's [`RouterKind`] to get
/// `multicall(deadline, [exactInputSingle])` there instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolEncoder {
    router: RouterKind,
}

impl SolEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_router(router: RouterKind) -> Self {
        Self { router }
    }

    pub fn router(&self) -> RouterKind {
        self.router
    }

    fn checked_limits(params: &ExactInputSingle) -> Result<(U24, U160)> {
        if params.fee > MAX_UINT24 {
            return Err(SwapError::EncodingError(format!(
                "fee {} exceeds uint24",
                params.fee
            )));
        }
        let fee = U24::from(params.fee);
        let sqrt_price_limit =
            U160::checked_from_limbs_slice(params.sqrt_price_limit_x96.as_limbs()).ok_or_else(
                || {
                    SwapError::EncodingError(format!(
                        "sqrtPriceLimitX96 {} exceeds uint160",
                        params.sqrt_price_limit_x96
                    ))
                },
            )?;
        Ok((fee, sqrt_price_limit))
    }

    fn encode_swap_router(params: &ExactInputSingle) -> Result<Bytes> {
        let (fee, sqrt_price_limit) = Self::checked_limits(params)?;
        let params = ISwapRouter::ExactInputSingleParams {
            tokenIn: params.token_in,
            tokenOut: params.token_out,
            fee,
            recipient: params.recipient,
            deadline: params.deadline,
            amountIn: params.amount_in,
            amountOutMinimum: params.amount_out_minimum,
            sqrtPriceLimitX96: sqrt_price_limit,
        };
        Ok(ISwapRouter::exactInputSingleCall { params }.abi_encode().into())
    }

    fn encode_swap_router02(params: &ExactInputSingle) -> Result<Bytes> {
        let (fee, sqrt_price_limit) = Self::checked_limits(params)?;
        let swap = ISwapRouter02::exactInputSingleCall {
            params: ISwapRouter02::ExactInputSingleParams {
                tokenIn: params.token_in,
                tokenOut: params.token_out,
                fee,
                recipient: params.recipient,
                amountIn: params.amount_in,
                amountOutMinimum: params.amount_out_minimum,
                sqrtPriceLimitX96: sqrt_price_limit,
            },
        };
        let multicall = ISwapRouter02::multicallCall {
            deadline: params.deadline,
            data: vec![swap.abi_encode().into()],
        };
        Ok(multicall.abi_encode().into())
    }
}

impl TransactionEncoder for SolEncoder {
    fn encode_exact_input_single(&self, params: &ExactInputSingle) -> Result<Bytes> {
        match self.router {
            RouterKind::SwapRouter => Self::encode_swap_router(params),
            RouterKind::SwapRouter02 => Self::encode_swap_router02(params),
        }
    }
}
