//! RPC-backed clients.
//!
//! [`ReadClient`] can quote, read balances and allowances, and prepare
//! unsigned swap transactions. [`SigningClient`] wraps a reader with a wallet
//! and is the only type that can approve or send. Quote-only code never holds
//! a key.

use std::sync::Arc;

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol,
};
use tracing::{debug, info};

use crate::chains::ChainDescriptor;
use crate::encoder::SolEncoder;
use crate::error::{Result, SwapError};
use crate::preparer::QuotePreparer;
use crate::quoter::QuoterV2Provider;
use crate::tokens::{Token, TokenRegistry};
use crate::types::{
    FeeTier, PreparedTransaction, Quote, QuoteProvider, SwapRequest, SwapResult,
};
use crate::units::{format_amount, parse_amount};

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function name() external view returns (string);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Read-only access to one chain.
pub struct ReadClient<P> {
    provider: Arc<P>,
    wrapped_native: Token,
    preparer: QuotePreparer<QuoterV2Provider<P>, SolEncoder>,
}

impl ReadClient<DynProvider> {
    pub async fn connect(chain: &ChainDescriptor, tokens: &TokenRegistry) -> Result<Self> {
        info!("connecting to {} at {}", chain.name, chain.rpc_url);
        let provider = ProviderBuilder::new()
            .connect(&chain.rpc_url)
            .await
            .map_err(SwapError::rpc)?
            .erased();
        Self::new(Arc::new(provider), chain, tokens)
    }
}

impl<P> ReadClient<P>
where
    P: Provider + 'static,
{
    pub fn new(
        provider: Arc<P>,
        chain: &ChainDescriptor,
        tokens: &TokenRegistry,
    ) -> Result<Self> {
        let wrapped_native = tokens.wrapped_native(chain)?.clone();
        let quoter = QuoterV2Provider::new(provider.clone(), chain.quoter);
        Ok(Self {
            provider,
            wrapped_native,
            preparer: QuotePreparer::new(chain, quoter, SolEncoder::for_router(chain.router_kind)),
        })
    }

    pub fn chain(&self) -> &ChainDescriptor {
        self.preparer.chain()
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn wrapped_native(&self) -> &Token {
        &self.wrapped_native
    }

    pub async fn get_quote(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: &str,
    ) -> Result<Quote> {
        self.get_quote_with_fee(token_in, token_out, amount_in, FeeTier::Medium)
            .await
    }

    pub async fn get_quote_with_fee(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: &str,
        fee: FeeTier,
    ) -> Result<Quote> {
        self.preparer
            .quoter()
            .quote(token_in, token_out, amount_in, fee)
            .await
    }

    /// Quotes native currency in, routed through the wrapped native token.
    pub async fn quote_native_to_token(
        &self,
        token_out: &Token,
        amount_in: &str,
    ) -> Result<Quote> {
        self.get_quote(&self.wrapped_native, token_out, amount_in).await
    }

    /// Quotes native currency out, routed through the wrapped native token.
    pub async fn quote_token_to_native(
        &self,
        token_in: &Token,
        amount_in: &str,
    ) -> Result<Quote> {
        self.get_quote(token_in, &self.wrapped_native, amount_in).await
    }

    pub async fn prepare_swap(&self, request: &SwapRequest) -> Result<PreparedTransaction> {
        self.preparer.prepare(request).await
    }

    pub async fn prepare_swap_quoted(
        &self,
        request: &SwapRequest,
    ) -> Result<(PreparedTransaction, Quote)> {
        self.preparer.prepare_quoted(request).await
    }

    /// Reads symbol, name and decimals of an arbitrary ERC-20.
    pub async fn token_metadata(&self, address: Address) -> Result<Token> {
        let erc20 = IERC20::new(address, &*self.provider);
        let decimals = erc20.decimals().call().await.map_err(SwapError::rpc)?;
        let symbol = erc20.symbol().call().await.map_err(SwapError::rpc)?;
        let name = erc20.name().call().await.map_err(SwapError::rpc)?;
        Ok(Token::new(self.chain().chain_id, address, decimals, symbol, name))
    }

    /// ERC-20 balance formatted with the token's on-chain decimals.
    pub async fn token_balance(&self, token: Address, owner: Address) -> Result<String> {
        let erc20 = IERC20::new(token, &*self.provider);
        let balance = erc20.balanceOf(owner).call().await.map_err(SwapError::rpc)?;
        let decimals = erc20.decimals().call().await.map_err(SwapError::rpc)?;
        format_amount(balance, decimals)
    }

    pub async fn native_balance(&self, owner: Address) -> Result<String> {
        let balance = self.provider.get_balance(owner).await.map_err(SwapError::rpc)?;
        format_amount(balance, self.chain().native_currency.decimals)
    }

    pub async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<String> {
        let erc20 = IERC20::new(token, &*self.provider);
        let allowance = erc20
            .allowance(owner, spender)
            .call()
            .await
            .map_err(SwapError::rpc)?;
        let decimals = erc20.decimals().call().await.map_err(SwapError::rpc)?;
        format_amount(allowance, decimals)
    }
}

/// A reader plus a wallet. The provider must sign for `address`.
pub struct SigningClient<P> {
    reader: ReadClient<P>,
    address: Address,
    gas_limit: u64,
}

impl SigningClient<DynProvider> {
    pub async fn connect(
        chain: &ChainDescriptor,
        tokens: &TokenRegistry,
        private_key: &str,
        gas_limit: u64,
    ) -> Result<Self> {
        let signer = private_key
            .parse::<PrivateKeySigner>()
            .map_err(|e| SwapError::Config(format!("invalid private key: {}", e)))?;
        let address = signer.address();
        info!("connecting to {} as {}", chain.name, address);

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(&chain.rpc_url)
            .await
            .map_err(SwapError::rpc)?
            .erased();
        let reader = ReadClient::new(Arc::new(provider), chain, tokens)?;
        Ok(Self::new(reader, address, gas_limit))
    }
}

impl<P> SigningClient<P>
where
    P: Provider + 'static,
{
    pub fn new(reader: ReadClient<P>, address: Address, gas_limit: u64) -> Self {
        Self {
            reader,
            address,
            gas_limit,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn reader(&self) -> &ReadClient<P> {
        &self.reader
    }

    /// Approves `amount` (human readable) of `token` and waits for the receipt.
    pub async fn approve(&self, token: &Token, spender: Address, amount: &str) -> Result<B256> {
        let amount = parse_amount(amount, token.decimals)?;
        let erc20 = IERC20::new(token.address, &*self.reader.provider);
        let receipt = erc20
            .approve(spender, amount)
            .from(self.address)
            .send()
            .await
            .map_err(SwapError::rpc)?
            .get_receipt()
            .await
            .map_err(SwapError::rpc)?;
        let receipt = ensure_success(receipt)?;
        info!("approved {} {} for {}", amount, token.symbol, spender);
        Ok(receipt.transaction_hash)
    }

    /// Signs and broadcasts a prepared router call, then waits for it to be mined.
    pub async fn send_prepared(
        &self,
        prepared: &PreparedTransaction,
    ) -> Result<TransactionReceipt> {
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(prepared.to)
            .with_input(prepared.data.clone())
            .with_value(prepared.value)
            .with_gas_limit(self.gas_limit);

        let pending = self
            .reader
            .provider
            .send_transaction(tx)
            .await
            .map_err(SwapError::rpc)?;
        debug!("sent {}", pending.tx_hash());

        let receipt = pending.get_receipt().await.map_err(SwapError::rpc)?;
        ensure_success(receipt)
    }

    pub async fn execute_swap(&self, request: &SwapRequest) -> Result<SwapResult> {
        let (prepared, quote) = self.reader.prepare_swap_quoted(request).await?;
        let receipt = self.send_prepared(&prepared).await?;
        info!(
            "swapped {} {} -> ~{} {} in {}",
            request.amount_in,
            request.token_in.symbol,
            quote.amount_out,
            request.token_out.symbol,
            receipt.transaction_hash
        );
        Ok(SwapResult {
            hash: receipt.transaction_hash,
            amount_in: request.amount_in.clone(),
            amount_out: quote.amount_out,
            gas_used: receipt.gas_used,
        })
    }

    /// Pays native currency; the router wraps it.
    pub async fn execute_native_to_token(
        &self,
        token_out: &Token,
        amount_in: &str,
        slippage_percent: f64,
        deadline_secs: i64,
        recipient: Address,
    ) -> Result<SwapResult> {
        let request = SwapRequest::new(
            self.reader.wrapped_native.clone(),
            token_out.clone(),
            amount_in,
            slippage_percent,
            deadline_secs,
            recipient,
        );
        self.execute_swap(&request).await
    }

    /// Receives the wrapped native token.
    pub async fn execute_token_to_native(
        &self,
        token_in: &Token,
        amount_in: &str,
        slippage_percent: f64,
        deadline_secs: i64,
        recipient: Address,
    ) -> Result<SwapResult> {
        let request = SwapRequest::new(
            token_in.clone(),
            self.reader.wrapped_native.clone(),
            amount_in,
            slippage_percent,
            deadline_secs,
            recipient,
        );
        self.execute_swap(&request).await
    }
}

fn ensure_success(receipt: TransactionReceipt) -> Result<TransactionReceipt> {
    if receipt.status() {
        Ok(receipt)
    } else {
        Err(SwapError::Rpc(format!(
            "transaction {} reverted",
            receipt.transaction_hash
        )))
    }
}
