use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256, U512};
use async_trait::async_trait;

use crate::error::{Result, SwapError};
use crate::tokens::Token;

/// Uniswap V3 pool fee tiers, in hundredths of a basis point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    Lowest,
    Low,
    Medium,
    High,
}

impl FeeTier {
    pub fn as_u32(self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10_000,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Slippage tolerance in percent.
///
/// The `f64` is kept as given. It is an exact binary fraction
/// `mantissa / 2^shift`, so minimum output math runs on that fraction in
/// integers with no rounding of the tolerance itself.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SlippageTolerance {
    percent: f64,
}

impl SlippageTolerance {
    /// Above this shift `amount * mantissa < 100 * 2^shift` for every `U256`
    /// amount, so the loss is a single base unit.
    const MAX_EXACT_SHIFT: u32 = 400;

    pub const ZERO: Self = Self { percent: 0.0 };

    /// `0.5` means 0.5%. Accepts `[0, 100)`.
    pub fn from_percent(percent: f64) -> Result<Self> {
        if !percent.is_finite() || percent < 0.0 || percent >= 100.0 {
            return Err(SwapError::invalid(format!(
                "slippage tolerance {}% outside [0, 100)",
                percent
            )));
        }
        // -0.0
        if percent == 0.0 {
            return Ok(Self::ZERO);
        }
        Ok(Self { percent })
    }

    pub fn as_percent(self) -> f64 {
        self.percent
    }

    /// `percent == mantissa / 2^shift`.
    fn fraction(self) -> (u64, u32) {
        let bits = self.percent.to_bits();
        let exponent = ((bits >> 52) & 0x7ff) as i32;
        let fraction = bits & ((1 << 52) - 1);
        let (mantissa, exponent) = if exponent == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1 << 52), exponent - 1075)
        };
        if exponent >= 0 {
            // percent < 100, so this is at most 99
            (mantissa << exponent, 0)
        } else {
            (mantissa, exponent.unsigned_abs())
        }
    }

    /// `floor(amount * (1 - slippage / 100))`, exact for the `f64` given.
    pub fn min_amount_out(self, amount_out: U256) -> U256 {
        let (mantissa, shift) = self.fraction();
        if mantissa == 0 || amount_out.is_zero() {
            return amount_out;
        }
        // floor(a * (1 - m / (100 * 2^k))) == a - ceil(a * m / (100 * 2^k))
        let product = widen(amount_out) * U512::from(mantissa);
        let loss = if shift > Self::MAX_EXACT_SHIFT {
            U512::from(1u64)
        } else {
            let denominator = U512::from(100u64) << (shift as usize);
            (product + denominator - U512::from(1u64)) / denominator
        };
        // loss <= amount_out < 2^256
        amount_out - U256::from_limbs_slice(&loss.as_limbs()[..4])
    }
}

fn widen(value: U256) -> U512 {
    let mut limbs = [0u64; 8];
    limbs[..4].copy_from_slice(value.as_limbs());
    U512::from_limbs(limbs)
}

impl FromStr for SlippageTolerance {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self> {
        let percent = s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| SwapError::invalid(format!("malformed slippage {:?}", s)))?;
        Self::from_percent(percent)
    }
}

impl fmt::Display for SlippageTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

/// Whether a swap whose input is the wrapped native token should be paid in
/// native currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NativeInput {
    /// Attach native value when the input token is the chain's wrapped
    /// native token; the router wraps it.
    #[default]
    Auto,
    /// Always spend the input as an ERC-20 (requires an allowance).
    Erc20,
}

#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub token_in: Token,
    pub token_out: Token,
    /// Human readable, e.g. `"0.1"`.
    pub amount_in: String,
    pub slippage_percent: f64,
    /// Seconds from now.
    pub deadline_secs: i64,
    pub recipient: Address,
    pub native_input: NativeInput,
}

impl SwapRequest {
    pub fn new(
        token_in: Token,
        token_out: Token,
        amount_in: impl Into<String>,
        slippage_percent: f64,
        deadline_secs: i64,
        recipient: Address,
    ) -> Self {
        Self {
            token_in,
            token_out,
            amount_in: amount_in.into(),
            slippage_percent,
            deadline_secs,
            recipient,
            native_input: NativeInput::Auto,
        }
    }

    pub fn with_native_input(mut self, native_input: NativeInput) -> Self {
        self.native_input = native_input;
        self
    }

    pub fn pair(&self) -> (String, String) {
        (self.token_in.symbol.clone(), self.token_out.symbol.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Human readable output amount.
    pub amount_out: String,
    pub gas_estimate: U256,
    pub price_impact_percent: f64,
    /// Token symbols from input to output.
    pub route: Vec<String>,
}

/// Arguments of `exactInputSingle` in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactInputSingle {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: U256,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    /// Zero means no price limit.
    pub sqrt_price_limit_x96: U256,
}

/// A ready-to-sign router call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_estimate: U256,
}

#[derive(Debug, Clone)]
pub struct SwapResult {
    pub hash: B256,
    pub amount_in: String,
    pub amount_out: String,
    pub gas_used: u64,
}

/// Source of expected output amounts for a pair.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fails with [`SwapError::QuoteUnavailable`] when the pair has no route
    /// or the quote call reverts.
    async fn quote(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: &str,
        fee: FeeTier,
    ) -> Result<Quote>;
}

/// Turns swap arguments into router calldata.
pub trait TransactionEncoder: Send + Sync {
    fn encode_exact_input_single(&self, params: &ExactInputSingle) -> Result<Bytes>;
}

#[async_trait]
impl<T: QuoteProvider + ?Sized> QuoteProvider for std::sync::Arc<T> {
    async fn quote(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: &str,
        fee: FeeTier,
    ) -> Result<Quote> {
        (**self).quote(token_in, token_out, amount_in, fee).await
    }
}

impl<T: TransactionEncoder + ?Sized> TransactionEncoder for std::sync::Arc<T> {
    fn encode_exact_input_single(&self, params: &ExactInputSingle) -> Result<Bytes> {
        (**self).encode_exact_input_single(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slippage_bounds() {
        assert!(SlippageTolerance::from_percent(0.0).is_ok());
        assert!(SlippageTolerance::from_percent(99.99).is_ok());
        for bad in [100.0, 150.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    SlippageTolerance::from_percent(bad),
                    Err(SwapError::InvalidParameter(_))
                ),
                "accepted {}",
                bad
            );
        }
        // just under 100% is still a valid tolerance
        assert!(SlippageTolerance::from_percent(99.999_999_6).is_ok());
        assert!(SlippageTolerance::from_percent(-0.0).is_ok());
    }

    #[test]
    fn test_min_out_is_exact_near_bounds() {
        let amount = U256::from(10u64).pow(U256::from(24u64));

        let near_full = SlippageTolerance::from_percent(99.999_999_6).unwrap();
        assert_eq!(
            near_full.min_amount_out(amount),
            U256::from(4_000_000_046_744_389u64)
        );

        let sub_micro = SlippageTolerance::from_percent(0.000_000_4).unwrap();
        assert_eq!(
            sub_micro.min_amount_out(amount),
            U256::from(999_999_996_000_000_000_000_000u128)
        );

        let pico = SlippageTolerance::from_percent(1e-12).unwrap();
        assert_eq!(
            pico.min_amount_out(amount),
            U256::from(999_999_999_999_990_000_000_000u128)
        );
    }

    #[test]
    fn test_min_out_with_subnormal_slippage() {
        let smallest = SlippageTolerance::from_percent(f64::from_bits(1)).unwrap();
        assert_eq!(smallest.min_amount_out(U256::MAX), U256::MAX - U256::from(1u64));
        assert_eq!(smallest.min_amount_out(U256::from(1u64)), U256::ZERO);
        assert_eq!(smallest.min_amount_out(U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_half_percent() {
        let s = SlippageTolerance::from_percent(0.5).unwrap();
        assert_eq!(s.min_amount_out(U256::from(1_000_000u64)), U256::from(995_000u64));
        assert_eq!(s.to_string(), "0.5%");
    }

    #[test]
    fn test_zero_slippage_keeps_amount() {
        let amount = U256::from(123_456_789u64);
        assert_eq!(SlippageTolerance::ZERO.min_amount_out(amount), amount);
    }

    #[test]
    fn test_min_out_strictly_less() {
        let tiny = SlippageTolerance::from_percent(1e-12).unwrap();
        for amount in [1u64, 7, 1_000, 99_999_999, 100_000_001] {
            let amount = U256::from(amount);
            assert!(tiny.min_amount_out(amount) < amount);
        }
    }

    #[test]
    fn test_min_out_no_overflow() {
        let s = SlippageTolerance::from_percent(1.0).unwrap();
        let min = s.min_amount_out(U256::MAX);
        assert!(min < U256::MAX);
        assert!(min > U256::MAX / U256::from(2u64));
    }

    #[test]
    fn test_parse_slippage() {
        assert_eq!(
            "0.5%".parse::<SlippageTolerance>().unwrap(),
            SlippageTolerance::from_percent(0.5).unwrap()
        );
        assert!("abc".parse::<SlippageTolerance>().is_err());
        assert!("100".parse::<SlippageTolerance>().is_err());
    }

    #[test]
    fn test_medium_fee_tier() {
        assert_eq!(FeeTier::Medium.as_u32(), 3000);
    }
}
