use anyhow::Result;
use alloy::primitives::address;
use swapper::{
    chains::{ChainRegistry, BASE},
    client::{ReadClient, SigningClient},
    config::{DEFAULT_DEADLINE_SECS, DEFAULT_GAS_LIMIT, DEFAULT_SLIPPAGE_PERCENT},
    tokens::TokenRegistry,
    types::SwapRequest,
};
use tracing::{info, warn, Level};
use tracing_subscriber::{filter, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = filter::Targets::new()
        .with_target("swapper", Level::INFO)
        .with_target("base_swap", Level::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    dotenv::dotenv().ok();

    let chains = ChainRegistry::from_env();
    let tokens = TokenRegistry::builtin();
    let base = chains.lookup(BASE)?;

    info!(
        "{} (chain {}) | router {} | quoter {}",
        base.name, base.chain_id, base.router, base.quoter
    );

    let reader = ReadClient::connect(base, &tokens).await?;
    let usdt = tokens.by_symbol(BASE, "USDT")?;
    let weth = reader.wrapped_native().clone();
    let wallet = address!("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    match reader.quote_native_to_token(usdt, "0.1").await {
        Ok(quote) => info!(
            "0.1 ETH -> {} USDT | gas {} | route ETH -> {}",
            quote.amount_out,
            quote.gas_estimate,
            quote.route[1..].join(" -> ")
        ),
        Err(e) => warn!("ETH -> USDT quote failed: {}", e),
    }

    match reader.quote_token_to_native(usdt, "100").await {
        Ok(quote) => info!("100 USDT -> {} ETH | gas {}", quote.amount_out, quote.gas_estimate),
        Err(e) => warn!("USDT -> ETH quote failed: {}", e),
    }

    info!("ETH balance:  {}", reader.native_balance(wallet).await?);
    info!("WETH balance: {}", reader.token_balance(weth.address, wallet).await?);
    info!("USDT balance: {}", reader.token_balance(usdt.address, wallet).await?);
    info!(
        "USDT allowance for router: {}",
        reader.allowance(usdt.address, wallet, base.router).await?
    );

    // ETH in: value attached, router wraps
    let request = SwapRequest::new(
        weth.clone(),
        usdt.clone(),
        "0.05",
        DEFAULT_SLIPPAGE_PERCENT,
        DEFAULT_DEADLINE_SECS,
        wallet,
    );
    match reader.prepare_swap(&request).await {
        Ok(tx) => info!(
            "ETH -> USDT tx: to {} | value {} | gas {} | {} bytes",
            tx.to,
            tx.value,
            tx.gas_estimate,
            tx.data.len()
        ),
        Err(e) => warn!("ETH -> USDT preparation failed: {}", e),
    }

    // USDT in: needs an allowance, no value
    let request = SwapRequest::new(
        usdt.clone(),
        weth,
        "50",
        DEFAULT_SLIPPAGE_PERCENT,
        DEFAULT_DEADLINE_SECS,
        wallet,
    );
    match reader.prepare_swap(&request).await {
        Ok(tx) => info!("USDT -> ETH tx: to {} | value {}", tx.to, tx.value),
        Err(e) => warn!("USDT -> ETH preparation failed: {}", e),
    }

    if let Ok(private_key) = std::env::var("PRIVATE_KEY") {
        let signer = SigningClient::connect(base, &tokens, &private_key, DEFAULT_GAS_LIMIT).await?;
        info!("signer {} ready; execution left to the `swap` command", signer.address());
    }

    Ok(())
}
