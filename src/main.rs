use anyhow::{Context, Result};
use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use swapper::{
    chains::{ChainDescriptor, ChainRegistry},
    client::{ReadClient, SigningClient},
    config::Config,
    tokens::{Token, TokenRegistry},
    types::{NativeInput, SwapRequest},
};
use tracing::info;
use tracing_subscriber::{filter, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "swapper", about = "Uniswap V3 swaps on Ethereum, Base, Arbitrum and BNB Chain")]
struct Cli {
    /// TOML config file; defaults apply when missing
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Chain id, overrides the config
    #[arg(long)]
    chain: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported networks
    Chains,
    /// List known tokens on the selected chain
    Tokens,
    /// Quote an exact-input swap
    Quote {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Build an unsigned swap transaction
    Prepare {
        #[command(flatten)]
        swap: SwapArgs,
    },
    /// Native and token balances of an address
    Balance {
        #[arg(long)]
        owner: Address,
        /// Symbols or addresses; all known tokens when empty
        #[arg(long)]
        token: Vec<String>,
    },
    /// Allowance granted to a spender (the router by default)
    Allowance {
        #[arg(long)]
        token: String,
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        spender: Option<Address>,
    },
    /// Approve the router to spend a token (needs PRIVATE_KEY)
    Approve {
        #[arg(long)]
        token: String,
        #[arg(long)]
        amount: String,
    },
    /// Sign and send a swap (needs PRIVATE_KEY)
    Swap {
        #[command(flatten)]
        swap: SwapArgs,
    },
}

#[derive(clap::Args, Debug)]
struct SwapArgs {
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    amount: String,
    /// Recipient; the signer's address when swapping
    #[arg(long)]
    recipient: Option<Address>,
    /// Percent, e.g. 0.5
    #[arg(long)]
    slippage: Option<f64>,
    /// Seconds from now
    #[arg(long)]
    deadline: Option<i64>,
    /// Spend the wrapped native token as an ERC-20 instead of paying native currency
    #[arg(long)]
    erc20: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    // Set up tracing
    let filter = filter::Targets::new().with_target("swapper", config.level()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let chains = config.chain_registry()?;
    let tokens = TokenRegistry::builtin();
    let chain = chains.lookup(cli.chain.unwrap_or(config.chain_id))?;

    match cli.command {
        Command::Chains => print_chains(&chains),
        Command::Tokens => {
            for token in tokens.on_chain(chain.chain_id) {
                println!("{:<6} | {:<20} | {}", token.symbol, token.name, token.address);
            }
            let native = &chain.native_currency;
            println!("{:<6} | {:<20} | native", native.symbol, format!("{} (native)", native.name));
        }
        Command::Quote { from, to, amount } => {
            let reader = ReadClient::connect(chain, &tokens).await?;
            let token_in = resolve(&reader, &tokens, chain, &from).await?;
            let token_out = resolve(&reader, &tokens, chain, &to).await?;
            let quote = reader.get_quote(&token_in, &token_out, &amount).await?;

            println!("input:        {} {}", amount, from);
            println!("output:       {} {}", quote.amount_out, to);
            println!("gas estimate: {}", quote.gas_estimate);
            println!("price impact: {}%", quote.price_impact_percent);
            println!("route:        {}", quote.route.join(" -> "));
        }
        Command::Prepare { swap } => {
            let reader = ReadClient::connect(chain, &tokens).await?;
            let recipient = swap
                .recipient
                .context("--recipient is required when preparing")?;
            let request = swap_request(&reader, &tokens, chain, &config, &swap, recipient).await?;
            let tx = reader.prepare_swap(&request).await?;

            println!("to:           {}", tx.to);
            println!("value:        {}", tx.value);
            println!("gas estimate: {}", tx.gas_estimate);
            println!("data:         {}", tx.data);
        }
        Command::Balance { owner, token } => {
            let reader = ReadClient::connect(chain, &tokens).await?;
            println!(
                "{:<6} {}",
                chain.native_currency.symbol,
                reader.native_balance(owner).await?
            );
            let selected: Vec<Token> = if token.is_empty() {
                tokens.on_chain(chain.chain_id).cloned().collect()
            } else {
                let mut selected = Vec::new();
                for t in &token {
                    selected.push(resolve(&reader, &tokens, chain, t).await?);
                }
                selected
            };
            for t in selected {
                println!("{:<6} {}", t.symbol, reader.token_balance(t.address, owner).await?);
            }
        }
        Command::Allowance {
            token,
            owner,
            spender,
        } => {
            let reader = ReadClient::connect(chain, &tokens).await?;
            let token = resolve(&reader, &tokens, chain, &token).await?;
            let spender = spender.unwrap_or(chain.router);
            let allowance = reader.allowance(token.address, owner, spender).await?;
            println!("{} allowance for {}: {}", token.symbol, spender, allowance);
        }
        Command::Approve { token, amount } => {
            let signer = signing_client(chain, &tokens, &config).await?;
            let token = resolve(signer.reader(), &tokens, chain, &token).await?;
            let hash = signer.approve(&token, chain.router, &amount).await?;
            println!("approved: {}", hash);
        }
        Command::Swap { swap } => {
            let signer = signing_client(chain, &tokens, &config).await?;
            let recipient = swap.recipient.unwrap_or(signer.address());
            let request =
                swap_request(signer.reader(), &tokens, chain, &config, &swap, recipient).await?;
            let result = signer.execute_swap(&request).await?;

            println!("hash:       {}", result.hash);
            println!("amount in:  {} {}", result.amount_in, swap.from);
            println!("amount out: ~{} {}", result.amount_out, swap.to);
            println!("gas used:   {}", result.gas_used);
        }
    }

    Ok(())
}

fn print_chains(chains: &ChainRegistry) {
    for chain in chains.iter() {
        println!(
            "{:<6} {:<16} native {:<4} router {} quoter {}",
            chain.chain_id, chain.name, chain.native_currency.symbol, chain.router, chain.quoter
        );
    }
}

async fn signing_client(
    chain: &ChainDescriptor,
    tokens: &TokenRegistry,
    config: &Config,
) -> Result<SigningClient<alloy::providers::DynProvider>> {
    let private_key = std::env::var("PRIVATE_KEY")
        .context("PRIVATE_KEY must be set to sign transactions")?;
    info!("signing enabled");
    Ok(SigningClient::connect(chain, tokens, &private_key, config.gas_limit).await?)
}

/// Symbol, native currency symbol (mapped to the wrapped token), or address.
async fn resolve<P: alloy::providers::Provider + 'static>(
    reader: &ReadClient<P>,
    tokens: &TokenRegistry,
    chain: &ChainDescriptor,
    token: &str,
) -> Result<Token> {
    if token.eq_ignore_ascii_case(chain.native_currency.symbol) {
        return Ok(reader.wrapped_native().clone());
    }
    if let Ok(found) = tokens.resolve(chain.chain_id, token) {
        return Ok(found.clone());
    }
    let address: Address = token
        .parse()
        .with_context(|| format!("unknown token {}", token))?;
    Ok(reader.token_metadata(address).await?)
}

async fn swap_request<P: alloy::providers::Provider + 'static>(
    reader: &ReadClient<P>,
    tokens: &TokenRegistry,
    chain: &ChainDescriptor,
    config: &Config,
    swap: &SwapArgs,
    recipient: Address,
) -> Result<SwapRequest> {
    let token_in = resolve(reader, tokens, chain, &swap.from).await?;
    let token_out = resolve(reader, tokens, chain, &swap.to).await?;
    let native_input = if swap.erc20 {
        NativeInput::Erc20
    } else {
        NativeInput::Auto
    };
    Ok(SwapRequest::new(
        token_in,
        token_out,
        swap.amount.clone(),
        swap.slippage.unwrap_or(config.slippage_percent),
        swap.deadline.unwrap_or(config.deadline_secs),
        recipient,
    )
    .with_native_input(native_input))
}
