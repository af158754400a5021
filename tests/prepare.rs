use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use alloy::primitives::{address, Address, Bytes, U256};
use async_trait::async_trait;
use swapper::{
    chains::{ChainRegistry, BASE, BNB_CHAIN},
    encoder::SolEncoder,
    preparer::QuotePreparer,
    tokens::{Token, TokenRegistry},
    types::{ExactInputSingle, FeeTier, Quote, QuoteProvider, SwapRequest, TransactionEncoder},
    units::parse_amount,
    SwapError,
};

const NOW: u64 = 1_700_000_000;
const RECIPIENT: Address = address!("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
const BASE_ROUTER: Address = address!("0x2626664c2603336E57B271c5C0b26F421741e481");

/// Quote provider double that counts calls and answers with a fixed amount
/// or fails.
struct StubQuoter {
    amount_out: Option<&'static str>,
    calls: AtomicUsize,
}

impl StubQuoter {
    fn returning(amount_out: &'static str) -> Arc<Self> {
        Arc::new(Self {
            amount_out: Some(amount_out),
            calls: AtomicUsize::new(0),
        })
    }

    fn illiquid() -> Arc<Self> {
        Arc::new(Self {
            amount_out: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubQuoter {
    async fn quote(
        &self,
        token_in: &Token,
        token_out: &Token,
        _amount_in: &str,
        fee: FeeTier,
    ) -> swapper::Result<Quote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(fee, FeeTier::Medium);
        match self.amount_out {
            Some(amount_out) => Ok(Quote {
                amount_out: amount_out.to_string(),
                gas_estimate: U256::from(150_000u64),
                price_impact_percent: 0.1,
                route: vec![token_in.symbol.clone(), token_out.symbol.clone()],
            }),
            None => Err(SwapError::QuoteUnavailable {
                token_in: token_in.symbol.clone(),
                token_out: token_out.symbol.clone(),
                reason: "execution reverted".to_string(),
            }),
        }
    }
}

/// Encoder double that records what it was asked to encode.
#[derive(Default)]
struct RecordingEncoder {
    seen: Mutex<Vec<ExactInputSingle>>,
}

impl TransactionEncoder for RecordingEncoder {
    fn encode_exact_input_single(&self, params: &ExactInputSingle) -> swapper::Result<Bytes> {
        self.seen.lock().unwrap().push(params.clone());
        Ok(Bytes::from_static(b"encoded"))
    }
}

struct FailingEncoder;

impl TransactionEncoder for FailingEncoder {
    fn encode_exact_input_single(&self, _params: &ExactInputSingle) -> swapper::Result<Bytes> {
        Err(SwapError::EncodingError("boom".to_string()))
    }
}

fn base_token(symbol: &str) -> Token {
    TokenRegistry::builtin()
        .by_symbol(BASE, symbol)
        .unwrap()
        .clone()
}

fn weth_to_usdt(slippage: f64, deadline: i64) -> SwapRequest {
    SwapRequest::new(
        base_token("WETH"),
        base_token("USDT"),
        "0.1",
        slippage,
        deadline,
        RECIPIENT,
    )
}

fn base_preparer<Q, E>(quoter: Q, encoder: E) -> QuotePreparer<Q, E>
where
    Q: QuoteProvider,
    E: TransactionEncoder,
{
    let chains = ChainRegistry::builtin();
    QuotePreparer::new(chains.lookup(BASE).unwrap(), quoter, encoder)
}

#[tokio::test]
async fn test_base_weth_to_usdt() {
    let quoter = StubQuoter::returning("250.123456");
    let encoder = Arc::new(RecordingEncoder::default());
    let preparer = base_preparer(quoter.clone(), encoder.clone());

    let tx = preparer
        .prepare_at(&weth_to_usdt(0.5, 1800), NOW)
        .await
        .unwrap();

    assert_eq!(tx.to, BASE_ROUTER);
    assert_eq!(tx.value, U256::from(100_000_000_000_000_000u128));
    assert_eq!(tx.gas_estimate, U256::from(150_000u64));
    assert_eq!(tx.data, Bytes::from_static(b"encoded"));
    assert_eq!(quoter.calls(), 1);

    let seen = encoder.seen.lock().unwrap();
    let params = &seen[0];
    assert_eq!(params.token_in, base_token("WETH").address);
    assert_eq!(params.token_out, base_token("USDT").address);
    assert_eq!(params.fee, 3000);
    assert_eq!(params.recipient, RECIPIENT);
    assert_eq!(params.deadline, U256::from(NOW + 1800));
    assert_eq!(params.amount_in, U256::from(100_000_000_000_000_000u128));
    // 250.123456 USDT * 0.995 = 248.87283872, floored at 6 decimals
    assert_eq!(params.amount_out_minimum, U256::from(248_872_838u64));
    assert_eq!(params.sqrt_price_limit_x96, U256::ZERO);
}

#[tokio::test]
async fn test_base_scenario_with_sol_encoder() {
    let preparer = base_preparer(StubQuoter::returning("250.123456"), SolEncoder::new());
    let tx = preparer
        .prepare_at(&weth_to_usdt(0.5, 1800), NOW)
        .await
        .unwrap();

    // exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))
    assert_eq!(&tx.data[..4], &[0x41, 0x4b, 0xf3, 0x89]);
    assert_eq!(tx.data.len(), 4 + 8 * 32);
    // amountOutMinimum is the seventh word
    let word = &tx.data[4 + 6 * 32..4 + 7 * 32];
    assert_eq!(U256::from_be_slice(word), U256::from(248_872_838u64));
}

#[tokio::test]
async fn test_min_out_never_exceeds_quote() {
    let quoted = parse_amount("250.123456", 6).unwrap();
    for slippage in [0.0, 0.000_000_4, 0.01, 0.1, 0.5, 1.0, 3.0, 50.0, 99.9, 99.999_999_6] {
        let encoder = Arc::new(RecordingEncoder::default());
        let preparer = base_preparer(StubQuoter::returning("250.123456"), encoder.clone());
        preparer
            .prepare_at(&weth_to_usdt(slippage, 60), NOW)
            .await
            .unwrap();

        let min_out = encoder.seen.lock().unwrap()[0].amount_out_minimum;
        if slippage == 0.0 {
            assert_eq!(min_out, quoted);
        } else {
            assert!(min_out < quoted, "slippage {} gave {}", slippage, min_out);
        }
    }
}

#[tokio::test]
async fn test_out_of_range_slippage_makes_no_provider_call() {
    for slippage in [100.0, 100.5, 250.0, -0.5, -100.0, f64::NAN] {
        let quoter = StubQuoter::returning("1");
        let preparer = base_preparer(quoter.clone(), RecordingEncoder::default());
        let err = preparer
            .prepare_at(&weth_to_usdt(slippage, 1800), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidParameter(_)), "slippage {}", slippage);
        assert_eq!(quoter.calls(), 0);
    }
}

#[tokio::test]
async fn test_non_positive_deadline_rejected() {
    for deadline in [0, -1, -1800] {
        let quoter = StubQuoter::returning("1");
        let preparer = base_preparer(quoter.clone(), RecordingEncoder::default());
        let err = preparer
            .prepare_at(&weth_to_usdt(0.5, deadline), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidParameter(_)));
        assert_eq!(quoter.calls(), 0);
    }
}

#[tokio::test]
async fn test_quote_unavailable_skips_encoding() {
    let encoder = Arc::new(RecordingEncoder::default());
    let preparer = base_preparer(StubQuoter::illiquid(), encoder.clone());

    let err = preparer
        .prepare_at(&weth_to_usdt(0.5, 1800), NOW)
        .await
        .unwrap_err();

    match err {
        SwapError::QuoteUnavailable {
            token_in,
            token_out,
            ..
        } => {
            assert_eq!(token_in, "WETH");
            assert_eq!(token_out, "USDT");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(encoder.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_encoding_failure_surfaces() {
    let preparer = base_preparer(StubQuoter::returning("250"), FailingEncoder);
    let err = preparer
        .prepare_at(&weth_to_usdt(0.5, 1800), NOW)
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::EncodingError(_)));
}

#[tokio::test]
async fn test_value_only_for_wrapped_native_input() {
    let tokens = TokenRegistry::builtin();
    for (token_in, token_out, expect_value) in [
        ("WETH", "USDT", true),
        ("WETH", "USDC", true),
        ("USDC", "WETH", false),
        ("DAI", "USDT", false),
    ] {
        let request = SwapRequest::new(
            tokens.by_symbol(BASE, token_in).unwrap().clone(),
            tokens.by_symbol(BASE, token_out).unwrap().clone(),
            "2",
            0.5,
            1800,
            RECIPIENT,
        );
        let amount_in = parse_amount("2", request.token_in.decimals).unwrap();
        let preparer = base_preparer(StubQuoter::returning("1"), RecordingEncoder::default());
        let tx = preparer.prepare_at(&request, NOW).await.unwrap();

        let expected = if expect_value { amount_in } else { U256::ZERO };
        assert_eq!(tx.value, expected, "{} -> {}", token_in, token_out);
    }
}

#[tokio::test]
async fn test_wrapped_native_is_per_chain() {
    let chains = ChainRegistry::builtin();
    let tokens = TokenRegistry::builtin();
    let bnb = chains.lookup(BNB_CHAIN).unwrap();
    let encoder = RecordingEncoder::default();
    let preparer = QuotePreparer::new(bnb, StubQuoter::returning("600"), encoder);

    let request = SwapRequest::new(
        tokens.by_symbol(BNB_CHAIN, "WBNB").unwrap().clone(),
        tokens.by_symbol(BNB_CHAIN, "USDT").unwrap().clone(),
        "1.5",
        1.0,
        600,
        RECIPIENT,
    );
    let tx = preparer.prepare_at(&request, NOW).await.unwrap();

    assert_eq!(tx.to, bnb.router);
    assert_eq!(tx.value, U256::from(1_500_000_000_000_000_000u128));
}

#[tokio::test]
async fn test_excess_precision_amount_rejected_before_quote() {
    let quoter = StubQuoter::returning("1");
    let preparer = base_preparer(quoter.clone(), RecordingEncoder::default());
    let request = SwapRequest::new(
        base_token("USDT"),
        base_token("WETH"),
        "1.0000001",
        0.5,
        1800,
        RECIPIENT,
    );
    let err = preparer.prepare_at(&request, NOW).await.unwrap_err();
    assert!(matches!(err, SwapError::InvalidParameter(_)));
    assert_eq!(quoter.calls(), 0);
}
