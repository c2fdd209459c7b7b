/// Wallet provider integration
///
/// `WalletProvider` is the capability the dashboard needs from a wallet:
/// account authorization, balance lookups, and submitting signed contract
/// calls. `EthersWallet` implements it over JSON-RPC, either against a wallet
/// that signs on its side (eth_requestAccounts / eth_sendTransaction) or with a
/// local private key through `SignerMiddleware`.

use async_trait::async_trait;
use ethers::prelude::*;
use std::fmt;
use std::sync::Arc;

use crate::core::error::WalletError;
use crate::utils::AppConfig;

abigen!(
    Erc20,
    r#"[
        function approve(address spender, uint256 value) external returns (bool)
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
    ]"#,
);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to authorize accounts; may prompt the user
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Chain the wallet is currently attached to
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Native balance in wei
    async fn get_balance(&self, account: Address) -> Result<U256, WalletError>;

    /// Submit `approve(spender, amount)` on `token` from `from` and wait for the receipt
    async fn send_approve(
        &self,
        from: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError>;

    /// Whether the wallet shows its own approval prompt before signing
    fn prompts_for_approval(&self) -> bool;
}

/// Transaction-signing capability bound to one authorized account
#[derive(Clone)]
pub struct SigningHandle {
    account: Address,
    provider: Arc<dyn WalletProvider>,
}

impl SigningHandle {
    pub fn new(account: Address, provider: Arc<dyn WalletProvider>) -> Self {
        Self { account, provider }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn provider(&self) -> Arc<dyn WalletProvider> {
        Arc::clone(&self.provider)
    }

    pub fn prompts_for_approval(&self) -> bool {
        self.provider.prompts_for_approval()
    }

    /// Set the spender's allowance on `token` to zero
    pub async fn revoke(&self, token: Address, spender: Address) -> Result<TxHash, WalletError> {
        self.provider
            .send_approve(self.account, token, spender, U256::zero())
            .await
    }
}

impl fmt::Debug for SigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningHandle")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// Parse an address pulled out of an approval record
pub fn parse_address(field: &'static str, value: Option<&str>) -> Result<Address, WalletError> {
    let raw = value.unwrap_or("").trim();
    raw.parse::<Address>().map_err(|_| WalletError::InvalidAddress {
        field,
        value: raw.to_string(),
    })
}

/// JSON-RPC wallet backed by ethers
pub struct EthersWallet {
    provider: Provider<Http>,
    local: Option<LocalWallet>,
}

impl EthersWallet {
    /// Wallet that authorizes and signs on its own side of the RPC connection
    pub fn remote(rpc_url: &str) -> Result<Self, WalletError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| WalletError::Unavailable(format!("invalid wallet RPC URL {}: {}", rpc_url, e)))?;

        Ok(Self { provider, local: None })
    }

    /// Wallet that signs locally with a hex private key
    pub fn local(rpc_url: &str, private_key: &str) -> Result<Self, WalletError> {
        let mut wallet = Self::remote(rpc_url)?;
        let key = private_key.trim().trim_start_matches("0x");
        let signer = key
            .parse::<LocalWallet>()
            .map_err(|_| WalletError::Unavailable("private key is malformed".to_string()))?;

        wallet.local = Some(signer);
        Ok(wallet)
    }
}

#[async_trait]
impl WalletProvider for EthersWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(ref signer) = self.local {
            return Ok(vec![signer.address()]);
        }

        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", Vec::<String>::new())
            .await
            .map_err(|e| WalletError::from_rpc_message(e.to_string()))
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| WalletError::Provider(e.to_string()))?;
        Ok(id.as_u64())
    }

    async fn get_balance(&self, account: Address) -> Result<U256, WalletError> {
        self.provider
            .get_balance(account, None)
            .await
            .map_err(|e| WalletError::Provider(e.to_string()))
    }

    async fn send_approve(
        &self,
        from: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        match self.local {
            Some(ref signer) => {
                let chain_id = self.chain_id().await?;
                let client = SignerMiddleware::new(
                    self.provider.clone(),
                    signer.clone().with_chain_id(chain_id),
                );
                submit_approve(Arc::new(client), from, token, spender, amount).await
            }
            None => {
                submit_approve(Arc::new(self.provider.clone()), from, token, spender, amount).await
            }
        }
    }

    fn prompts_for_approval(&self) -> bool {
        self.local.is_none()
    }
}

async fn submit_approve<M: Middleware + 'static>(
    client: Arc<M>,
    from: Address,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<TxHash, WalletError> {
    let erc20 = Erc20::new(token, client);
    let call = erc20.approve(spender, amount).from(from);

    let pending = call
        .send()
        .await
        .map_err(|e| WalletError::from_rpc_message(e.to_string()))?;

    log::info!("Submitted approve({:?}, {}) on {:?}: {:?}", spender, amount, token, *pending);

    let receipt = pending
        .await
        .map_err(|e| WalletError::Transaction(e.to_string()))?
        .ok_or(WalletError::Dropped)?;

    if receipt.status.map(|s| s.as_u64()) == Some(0) {
        return Err(WalletError::Reverted(receipt.transaction_hash));
    }

    Ok(receipt.transaction_hash)
}

/// Detect the wallet capability described by the configuration.
///
/// No RPC endpoint means no wallet. With an endpoint, a private key in the
/// configured environment variable selects local signing; otherwise the
/// endpoint itself is expected to be a signing wallet.
pub fn detect_wallet(config: &AppConfig) -> Result<Arc<dyn WalletProvider>, WalletError> {
    let rpc_url = config
        .wallet_rpc_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| {
            WalletError::Unavailable(
                "no wallet RPC endpoint configured (set wallet_rpc_url or CCC_WALLET_RPC)".to_string(),
            )
        })?;

    let wallet = match config.private_key() {
        Some(key) => {
            log::info!("Using local signer from ${} against {}", config.private_key_env, rpc_url);
            EthersWallet::local(rpc_url, &key)?
        }
        None => {
            log::info!("Using remote signing wallet at {}", rpc_url);
            EthersWallet::remote(rpc_url)?
        }
    };

    Ok(Arc::new(wallet))
}
