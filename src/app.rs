/// Main TUI application

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ethers::types::{Address, TxHash, U256};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::approvals::{ApprovalRecord, BlockscoutClient};
use crate::core::control::{authorize, read_wallet, ControlCenter, FetchTicket, Reaction, RevokeRequest};
use crate::core::error::{FetchError, WalletError};
use crate::core::wallet::detect_wallet;
use crate::screens::Dashboard;
use crate::utils::{open_in_browser, AppConfig};

/// Result of a background task, applied on the UI loop
#[derive(Debug)]
pub enum Outcome {
    Connected(Result<(Address, Option<u64>), WalletError>),
    Balance(Address, Result<U256, WalletError>, Option<u64>),
    Approvals(FetchTicket, Result<Vec<ApprovalRecord>, FetchError>),
    Revoked(Result<TxHash, WalletError>),
}

pub struct App {
    dashboard: Dashboard,
    control: ControlCenter,
    swap_url: String,
    selected_index: usize,
    should_quit: bool,
    status_message: Option<String>,
    show_help: bool,
    // Local-key revoke waiting for y/n
    pending_revoke: Option<RevokeRequest>,
    revoking: bool,
    // Background task results
    outcome_tx: UnboundedSender<Outcome>,
    outcome_rx: UnboundedReceiver<Outcome>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let source = BlockscoutClient::new(Duration::from_secs(config.http_timeout_secs))
            .context("Failed to create block explorer client")?;

        let control = ControlCenter::new(
            detect_wallet(&config),
            Arc::new(source),
            config.default_chain.as_deref(),
        );

        Ok(Self::with_control(control, config.swap_widget_url))
    }

    pub fn with_control(control: ControlCenter, swap_url: String) -> Self {
        let (outcome_tx, outcome_rx) = unbounded_channel();

        Self {
            dashboard: Dashboard::new(swap_url.clone()),
            control,
            swap_url,
            selected_index: 0,
            should_quit: false,
            status_message: None,
            show_help: false,
            pending_revoke: None,
            revoking: false,
            outcome_tx,
            outcome_rx,
        }
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.pump();

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key_event) = event::read()? {
                    self.handle_key(key_event.code);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply finished background work, start follow-ups, surface notices
    fn pump(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }

        for reaction in self.control.take_reactions() {
            match reaction {
                Reaction::RefreshBalance(_) => self.spawn_balance_refresh(),
            }
        }

        if let Some(notice) = self.control.take_notices().pop() {
            self.set_status(notice.to_string());
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Connected(result) => {
                let rejected = result.is_err();
                self.control.finish_connect(result);
                if rejected {
                    self.set_status("Wallet connection was not authorized".to_string());
                } else {
                    self.clear_status();
                    self.selected_index = 0;
                }
            }
            Outcome::Balance(account, result, chain_id) => {
                if let Some(chain_id) = chain_id {
                    self.control.apply_wallet_chain(account, chain_id);
                }
                self.control.apply_balance(account, result);
            }
            Outcome::Approvals(ticket, result) => {
                self.control.finish_fetch(ticket, result);
                let count = self.control.approvals().items.len();
                if self.selected_index >= count {
                    self.selected_index = count.saturating_sub(1);
                }
            }
            Outcome::Revoked(result) => {
                self.revoking = false;
                self.control.finish_revoke(result);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.pending_revoke.is_some() {
            return self.handle_confirm_key(key);
        }

        if self.show_help {
            if matches!(key, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        self.clear_status();

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = true;
            }
            KeyCode::Char('c') => self.start_connect(),
            KeyCode::Char('r') => self.spawn_balance_refresh(),
            KeyCode::Left | KeyCode::Char('[') => {
                self.control.prev_chain();
                self.selected_index = 0;
            }
            KeyCode::Right | KeyCode::Char(']') => {
                self.control.next_chain();
                self.selected_index = 0;
            }
            KeyCode::Char('f') => self.start_fetch(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_index + 1 < self.control.approvals().items.len() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Char('x') | KeyCode::Enter => self.start_revoke(),
            KeyCode::Char('o') => match open_in_browser(&self.swap_url) {
                Ok(()) => self.set_status(format!("✓ Opened {}", self.swap_url)),
                Err(e) => {
                    log::warn!("{:#}", e);
                    self.set_status(format!("✗ Could not open a browser. Visit {}", self.swap_url));
                }
            },
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(request) = self.pending_revoke.take() {
                    self.spawn_revoke(request);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_revoke = None;
                self.set_status("Revoke cancelled".to_string());
            }
            _ => {}
        }
    }

    fn start_connect(&mut self) {
        let Some(provider) = self.control.begin_connect() else {
            return;
        };

        self.set_status("Waiting for wallet authorization...".to_string());
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Outcome::Connected(authorize(provider).await));
        });
    }

    fn spawn_balance_refresh(&mut self) {
        let Some((provider, account)) = self.control.balance_request() else {
            return;
        };

        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let (result, chain_id) = read_wallet(provider, account).await;
            let _ = tx.send(Outcome::Balance(account, result, chain_id));
        });
    }

    fn start_fetch(&mut self) {
        let Some(ticket) = self.control.begin_fetch() else {
            self.set_status("✗ Connect wallet first".to_string());
            return;
        };

        self.selected_index = 0;
        let source = self.control.source();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_approvals(ticket.base_url, ticket.account).await;
            let _ = tx.send(Outcome::Approvals(ticket, result));
        });
    }

    fn start_revoke(&mut self) {
        if self.revoking {
            self.set_status("A revoke is already in progress".to_string());
            return;
        }

        let Some(record) = self.control.approvals().items.get(self.selected_index).cloned() else {
            if !self.control.session().is_connected() {
                self.set_status("✗ Connect wallet first".to_string());
            }
            return;
        };

        let Some(request) = self.control.prepare_revoke(&record) else {
            return;
        };

        if request.needs_local_confirmation() {
            self.pending_revoke = Some(request);
        } else {
            self.spawn_revoke(request);
        }
    }

    fn spawn_revoke(&mut self, request: RevokeRequest) {
        self.revoking = true;
        self.set_status(format!("Revoking {} approval... confirm in your wallet", request.symbol));

        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Outcome::Revoked(request.execute().await));
        });
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        self.dashboard.render(
            frame,
            &self.control,
            self.selected_index,
            self.status_message.as_deref(),
            self.show_help,
            self.pending_revoke.as_ref(),
            self.revoking,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::approvals::{parse_approvals, MockApprovalSource};
    use crate::core::wallet::MockWalletProvider;
    use serde_json::json;

    fn account() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    fn local_wallet() -> MockWalletProvider {
        let mut wallet = MockWalletProvider::new();
        wallet.expect_request_accounts().returning(|| Ok(vec![account()]));
        wallet.expect_chain_id().returning(|| Ok(100));
        wallet.expect_prompts_for_approval().return_const(false);
        wallet
    }

    fn app(wallet: MockWalletProvider) -> App {
        let control = ControlCenter::new(Ok(Arc::new(wallet)), Arc::new(MockApprovalSource::new()), None);
        App::with_control(control, "https://swap.example".to_string())
    }

    async fn next_outcome(app: &mut App) {
        let outcome = app.outcome_rx.recv().await.unwrap();
        app.apply_outcome(outcome);
    }

    #[tokio::test]
    async fn test_connect_then_balance_flow() {
        let mut wallet = local_wallet();
        wallet
            .expect_get_balance()
            .returning(|_| Ok(U256::exp10(18)));

        let mut app = app(wallet);
        app.handle_key(KeyCode::Char('c'));
        next_outcome(&mut app).await;
        assert!(app.control.session().is_connected());

        // Connect queues a balance refresh
        app.pump();
        next_outcome(&mut app).await;
        assert_eq!(app.control.session().balance(), Some("1.0"));
    }

    #[tokio::test]
    async fn test_fetch_without_wallet_sets_status() {
        let mut app = app(local_wallet());
        app.handle_key(KeyCode::Char('f'));
        assert_eq!(app.status_message.as_deref(), Some("✗ Connect wallet first"));
    }

    #[tokio::test]
    async fn test_local_revoke_requires_confirmation() {
        let mut wallet = local_wallet();
        wallet
            .expect_send_approve()
            .times(1)
            .returning(|_, _, _, _| Ok(TxHash::repeat_byte(0x33)));
        wallet.expect_get_balance().returning(|_| Ok(U256::zero()));

        let mut app = app(wallet);
        app.control.finish_connect(Ok((account(), Some(100))));

        let ticket = app.control.begin_fetch().unwrap();
        let records = parse_approvals(&json!({ "items": [ {
            "token_address": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "spender": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"
        } ] }));
        app.control.finish_fetch(ticket, Ok(records));

        app.handle_key(KeyCode::Char('x'));
        assert!(app.pending_revoke.is_some());

        // Keys other than y/n are ignored while the dialog is open
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.should_quit);

        app.handle_key(KeyCode::Char('y'));
        assert!(app.pending_revoke.is_none());
        assert!(app.revoking);

        next_outcome(&mut app).await;
        assert!(!app.revoking);
        app.pump();
        assert!(app.status_message.as_deref().unwrap().starts_with("✓ Revoked successfully!"));
    }

    #[tokio::test]
    async fn test_cancel_revoke() {
        let mut wallet = local_wallet();
        wallet.expect_send_approve().never();

        let mut app = app(wallet);
        app.control.finish_connect(Ok((account(), Some(100))));
        let ticket = app.control.begin_fetch().unwrap();
        let records = parse_approvals(&json!({ "items": [ {
            "token_address": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "spender": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"
        } ] }));
        app.control.finish_fetch(ticket, Ok(records));

        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Esc);
        assert!(app.pending_revoke.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Revoke cancelled"));
    }

    #[test]
    fn test_chain_keys_reset_selection() {
        let mut app = app(MockWalletProvider::new());
        app.selected_index = 3;
        app.handle_key(KeyCode::Right);
        assert_eq!(app.control.selected_chain().id, "optimism");
        assert_eq!(app.selected_index, 0);
        app.handle_key(KeyCode::Char('['));
        assert_eq!(app.control.selected_chain().id, "gnosis");
    }

    #[test]
    fn test_help_toggle_and_quit() {
        let mut app = app(MockWalletProvider::new());
        app.handle_key(KeyCode::Char('?'));
        assert!(app.show_help);
        app.handle_key(KeyCode::Esc);
        assert!(!app.show_help);
        assert!(!app.should_quit);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
