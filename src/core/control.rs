/// Dashboard state and operations
///
/// `ControlCenter` owns the wallet session, the selected chain, the approval
/// list and the user-facing notice queue. Each operation comes in two forms:
/// an `async fn` that runs start to finish (CLI, tests), and a `begin_*` /
/// `finish_*` pair the TUI uses to run the slow part on a spawned task and
/// apply the outcome later.

use ethers::types::{Address, TxHash, U256};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::core::approvals::{approvals_url, ApprovalRecord, ApprovalSource, SPENDER, TOKEN_ADDRESS};
use crate::core::balance::{format_native_balance, BalanceState};
use crate::core::error::{ControlError, FetchError, WalletError};
use crate::core::wallet::{parse_address, SigningHandle, WalletProvider};
use crate::utils::{chain_index, checksum, find_chain_by_id, native_symbol, ChainOption, CHAIN_OPTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Required capability missing from the environment
    Environment,
    Network,
    Transaction,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::Environment | NoticeKind::Network | NoticeKind::Transaction
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.kind {
            NoticeKind::Success => "✓",
            NoticeKind::Info => "•",
            _ => "✗",
        };
        write!(f, "{} {}", symbol, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectedWallet {
    pub account: Address,
    /// Network the wallet last reported, if it answered
    pub chain_id: Option<u64>,
    pub balance: BalanceState,
    pub handle: SigningHandle,
}

impl ConnectedWallet {
    pub fn native_symbol(&self) -> &'static str {
        native_symbol(self.chain_id)
    }
}

#[derive(Debug, Clone, Default)]
pub enum WalletSession {
    #[default]
    Disconnected,
    Connected(ConnectedWallet),
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        matches!(self, WalletSession::Connected(_))
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            WalletSession::Connected(w) => Some(w.account),
            WalletSession::Disconnected => None,
        }
    }

    pub fn balance(&self) -> Option<&str> {
        match self {
            WalletSession::Connected(w) => w.balance.amount(),
            WalletSession::Disconnected => None,
        }
    }

    pub fn wallet(&self) -> Option<&ConnectedWallet> {
        match self {
            WalletSession::Connected(w) => Some(w),
            WalletSession::Disconnected => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApprovalsState {
    pub items: Vec<ApprovalRecord>,
    pub loading: bool,
    generation: u64,
}

/// Identifies one approval fetch; only the latest ticket may write results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub base_url: &'static str,
    pub account: Address,
}

/// Follow-up work triggered by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    RefreshBalance(Address),
}

/// A validated revoke, ready to be signed
#[derive(Debug, Clone)]
pub struct RevokeRequest {
    pub token: Address,
    pub spender: Address,
    pub symbol: String,
    /// Chain selected when the revoke was requested
    pub chain_id: u64,
    handle: SigningHandle,
}

impl RevokeRequest {
    /// The wallet will not prompt, so the dashboard has to ask first
    pub fn needs_local_confirmation(&self) -> bool {
        !self.handle.prompts_for_approval()
    }

    /// Sign `approve(spender, 0)` if the wallet is still on the selected chain.
    ///
    /// The wallet's network is read again right before sending; the user can
    /// switch it at any time after connecting. A wallet that cannot report its
    /// chain is trusted as-is.
    pub async fn execute(self) -> Result<TxHash, WalletError> {
        match self.handle.provider().chain_id().await {
            Ok(current) if current != self.chain_id => {
                return Err(WalletError::ChainMismatch {
                    wallet: current,
                    selected: self.chain_id,
                });
            }
            Ok(_) => {}
            Err(e) => log::warn!("Wallet did not report its chain before revoking: {}", e),
        }

        self.handle.revoke(self.token, self.spender).await
    }
}

/// Balance of `account` plus the wallet's current network, if it answers
pub async fn read_wallet(
    provider: Arc<dyn WalletProvider>,
    account: Address,
) -> (Result<U256, WalletError>, Option<u64>) {
    let chain_id = match provider.chain_id().await {
        Ok(id) => Some(id),
        Err(e) => {
            log::debug!("Chain id unavailable during refresh: {}", e);
            None
        }
    };
    (provider.get_balance(account).await, chain_id)
}

/// Authorize with the wallet and read its active chain
pub async fn authorize(provider: Arc<dyn WalletProvider>) -> Result<(Address, Option<u64>), WalletError> {
    let accounts = provider.request_accounts().await?;
    let account = accounts.first().copied().ok_or(WalletError::NoAccounts)?;

    let chain_id = match provider.chain_id().await {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("Wallet did not report its chain: {}", e);
            None
        }
    };

    Ok((account, chain_id))
}

fn chain_name(chain_id: u64) -> String {
    find_chain_by_id(chain_id)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| format!("chain {}", chain_id))
}

pub struct ControlCenter {
    wallet: Option<Arc<dyn WalletProvider>>,
    unavailable_reason: Option<String>,
    source: Arc<dyn ApprovalSource>,
    session: WalletSession,
    chain_index: usize,
    approvals: ApprovalsState,
    notices: Vec<Notice>,
    reactions: VecDeque<Reaction>,
}

impl ControlCenter {
    pub fn new(
        wallet: Result<Arc<dyn WalletProvider>, WalletError>,
        source: Arc<dyn ApprovalSource>,
        default_chain: Option<&str>,
    ) -> Self {
        let (wallet, unavailable_reason) = match wallet {
            Ok(w) => (Some(w), None),
            Err(e) => {
                log::warn!("No wallet capability: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let chain_index = match default_chain {
            Some(id) => chain_index(id).unwrap_or_else(|| {
                log::warn!("Unknown default chain {:?}, using {}", id, CHAIN_OPTIONS[0].id);
                0
            }),
            None => 0,
        };

        Self {
            wallet,
            unavailable_reason,
            source,
            session: WalletSession::Disconnected,
            chain_index,
            approvals: ApprovalsState::default(),
            notices: Vec::new(),
            reactions: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn wallet_available(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn selected_chain(&self) -> &'static ChainOption {
        &CHAIN_OPTIONS[self.chain_index]
    }

    pub fn chain_index(&self) -> usize {
        self.chain_index
    }

    pub fn approvals(&self) -> &ApprovalsState {
        &self.approvals
    }

    pub fn source(&self) -> Arc<dyn ApprovalSource> {
        Arc::clone(&self.source)
    }

    /// Explorer URL the next fetch would hit
    pub fn approvals_url(&self) -> Option<String> {
        self.session
            .account()
            .map(|account| approvals_url(self.selected_chain().base_url, &account))
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn take_reactions(&mut self) -> Vec<Reaction> {
        self.reactions.drain(..).collect()
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notices.push(Notice { kind, message: message.into() });
    }

    /// Start a connection; `None` means there is no wallet to talk to
    pub fn begin_connect(&mut self) -> Option<Arc<dyn WalletProvider>> {
        match self.wallet {
            Some(ref wallet) => Some(Arc::clone(wallet)),
            None => {
                let reason = self
                    .unavailable_reason
                    .clone()
                    .unwrap_or_else(|| "wallet not available".to_string());
                log::error!("Connect aborted: {}", reason);
                self.notify(
                    NoticeKind::Environment,
                    format!("Wallet not available. Configure a wallet RPC endpoint ({})", reason),
                );
                None
            }
        }
    }

    pub fn finish_connect(&mut self, result: Result<(Address, Option<u64>), WalletError>) {
        let (account, chain_id) = match result {
            Ok(authorized) => authorized,
            Err(e) => {
                // Authorization failures leave the session as it was
                log::warn!("Wallet connection failed: {}", e);
                return;
            }
        };

        let Some(ref provider) = self.wallet else {
            return;
        };

        let previous = self.session.account();
        let balance = match self.session.wallet() {
            Some(w) if w.account == account => w.balance.clone(),
            _ => BalanceState::Loading,
        };

        self.session = WalletSession::Connected(ConnectedWallet {
            account,
            chain_id,
            balance,
            handle: SigningHandle::new(account, Arc::clone(provider)),
        });

        log::info!(
            "Connected {} on chain {}",
            checksum(&account),
            chain_id.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
        );

        if previous != Some(account) {
            self.clear_approvals();
        }
        self.reactions.push_back(Reaction::RefreshBalance(account));
    }

    pub async fn connect(&mut self) {
        if let Some(provider) = self.begin_connect() {
            let result = authorize(provider).await;
            self.finish_connect(result);
        }
    }

    /// Record the network the wallet reports now
    pub fn apply_wallet_chain(&mut self, account: Address, chain_id: u64) {
        let WalletSession::Connected(ref mut wallet) = self.session else {
            return;
        };
        if wallet.account != account || wallet.chain_id == Some(chain_id) {
            return;
        }

        log::info!(
            "Wallet switched to chain {} (was {})",
            chain_id,
            wallet.chain_id.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
        );
        wallet.chain_id = Some(chain_id);
    }

    pub fn balance_request(&self) -> Option<(Arc<dyn WalletProvider>, Address)> {
        self.session
            .wallet()
            .map(|w| (w.handle.provider(), w.account))
    }

    pub fn apply_balance(&mut self, account: Address, result: Result<U256, WalletError>) {
        let WalletSession::Connected(ref mut wallet) = self.session else {
            return;
        };
        if wallet.account != account {
            log::debug!("Dropping balance for previous account {}", checksum(&account));
            return;
        }

        wallet.balance = match result {
            Ok(wei) => BalanceState::Loaded(format_native_balance(wei)),
            Err(e) => {
                log::warn!("Balance query failed: {}", e);
                BalanceState::Unavailable(e.to_string())
            }
        };
    }

    /// Re-read the balance, and the wallet's network along with it
    pub async fn refresh_balance(&mut self) {
        if let Some((provider, account)) = self.balance_request() {
            let (balance, chain_id) = read_wallet(provider, account).await;
            if let Some(chain_id) = chain_id {
                self.apply_wallet_chain(account, chain_id);
            }
            self.apply_balance(account, balance);
        }
    }

    /// Run queued reactions to completion
    pub async fn process_reactions(&mut self) {
        for reaction in self.take_reactions() {
            match reaction {
                Reaction::RefreshBalance(account) if self.session.account() == Some(account) => {
                    self.refresh_balance().await;
                }
                Reaction::RefreshBalance(_) => {}
            }
        }
    }

    pub fn select_chain(&mut self, id: &str) -> Result<(), ControlError> {
        let index = chain_index(id).ok_or_else(|| ControlError::UnknownChain(id.to_string()))?;
        self.set_chain_index(index);
        Ok(())
    }

    pub fn next_chain(&mut self) {
        self.set_chain_index((self.chain_index + 1) % CHAIN_OPTIONS.len());
    }

    pub fn prev_chain(&mut self) {
        self.set_chain_index((self.chain_index + CHAIN_OPTIONS.len() - 1) % CHAIN_OPTIONS.len());
    }

    fn set_chain_index(&mut self, index: usize) {
        if index != self.chain_index {
            self.chain_index = index;
            log::info!("Selected chain {}", self.selected_chain().name);
            self.clear_approvals();
        }
    }

    fn clear_approvals(&mut self) {
        self.approvals.items.clear();
        self.approvals.loading = false;
        self.approvals.generation += 1;
    }

    /// Mark a fetch as started; `None` when no account is connected
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        let account = self.session.account()?;

        self.approvals.items.clear();
        self.approvals.loading = true;
        self.approvals.generation += 1;

        Some(FetchTicket {
            generation: self.approvals.generation,
            base_url: self.selected_chain().base_url,
            account,
        })
    }

    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<ApprovalRecord>, FetchError>) {
        if ticket.generation != self.approvals.generation {
            log::debug!("Discarding stale approval fetch #{}", ticket.generation);
            return;
        }

        self.approvals.loading = false;

        match result {
            Ok(items) => {
                self.approvals.items = items;
            }
            Err(e) => {
                log::error!("Approval fetch from {} failed: {}", ticket.base_url, e);
                self.notify(
                    NoticeKind::Network,
                    "Could not fetch approvals (cross-origin or API issue)",
                );
            }
        }
    }

    pub async fn fetch_approvals(&mut self) {
        if let Some(ticket) = self.begin_fetch() {
            let result = self
                .source
                .fetch_approvals(ticket.base_url, ticket.account)
                .await;
            self.finish_fetch(ticket, result);
        }
    }

    /// Validate a revoke against the session; the chain is checked when it is sent
    pub fn prepare_revoke(&mut self, record: &ApprovalRecord) -> Option<RevokeRequest> {
        let Some(wallet) = self.session.wallet().cloned() else {
            self.notify(NoticeKind::Transaction, "Connect wallet first");
            return None;
        };

        let addresses = parse_address(TOKEN_ADDRESS.field, record.token_address())
            .and_then(|token| parse_address(SPENDER.field, record.spender()).map(|spender| (token, spender)));

        match addresses {
            Ok((token, spender)) => Some(RevokeRequest {
                token,
                spender,
                symbol: record.token_symbol().to_string(),
                chain_id: self.selected_chain().chain_id,
                handle: wallet.handle,
            }),
            Err(e) => {
                self.finish_revoke(Err(e));
                None
            }
        }
    }

    pub fn finish_revoke(&mut self, result: Result<TxHash, WalletError>) {
        match result {
            Ok(hash) => {
                log::info!("Revoke confirmed in {:?}", hash);
                self.notify(NoticeKind::Success, format!("Revoked successfully! ({:?})", hash));
                if let Some(account) = self.session.account() {
                    self.reactions.push_back(Reaction::RefreshBalance(account));
                }
            }
            Err(WalletError::ChainMismatch { wallet, selected }) => {
                if let Some(account) = self.session.account() {
                    self.apply_wallet_chain(account, wallet);
                }

                let wallet_network = chain_name(wallet);
                let selected_network = chain_name(selected);
                log::warn!(
                    "Refusing revoke: wallet on {} but {} is selected",
                    wallet_network,
                    selected_network
                );
                self.notify(
                    NoticeKind::Transaction,
                    format!(
                        "Wallet is on {} but {} is selected; switch the wallet's network first",
                        wallet_network, selected_network
                    ),
                );
            }
            Err(e) => {
                log::error!("Revoke failed: {}", e);
                self.notify(NoticeKind::Transaction, "Transaction failed");
            }
        }
    }

    pub async fn revoke(&mut self, record: &ApprovalRecord) -> Option<TxHash> {
        let request = self.prepare_revoke(record)?;
        let result = request.execute().await;
        let hash = result.as_ref().ok().copied();
        self.finish_revoke(result);
        hash
    }
}
