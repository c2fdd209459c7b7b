/// Main dashboard screen

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::cli::VERSION_WITH_BUILD;
use crate::core::control::{ControlCenter, RevokeRequest, WalletSession};
use crate::utils::{checksum, find_chain_by_id, short_address, truncate_string, CHAIN_OPTIONS};

pub struct Dashboard {
    title: String,
    swap_url: String,
}

impl Dashboard {
    pub fn new(swap_url: impl Into<String>) -> Self {
        Self {
            title: "Cross-Chain Control Center".to_string(),
            swap_url: swap_url.into(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        frame: &mut Frame,
        control: &ControlCenter,
        selected_index: usize,
        status_message: Option<&str>,
        show_help: bool,
        pending_revoke: Option<&RevokeRequest>,
        revoking: bool,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(6), // Wallet + chain selector
                Constraint::Length(4), // Swap
                Constraint::Min(0),    // Approvals
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                self.title.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  v{}", VERSION_WITH_BUILD),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.render_wallet(frame, top[0], control);
        self.render_chain_selector(frame, top[1], control);
        self.render_swap(frame, chunks[2]);
        self.render_approvals(frame, chunks[3], control, selected_index);

        let footer_text = if let Some(status) = status_message {
            status.to_string()
        } else if revoking {
            "Waiting for the revoke transaction to confirm...".to_string()
        } else {
            "[c]onnect | [← →] Chain | [f]etch | [↑↓] Select | [x] Revoke | [r]efresh | [o]pen swap | [?] Help | [q]uit".to_string()
        };

        let footer_style = match status_message {
            Some(s) if s.starts_with('✗') => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            Some(s) if s.starts_with('✓') => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            Some(_) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            None => Style::default(),
        };

        let footer = Paragraph::new(footer_text)
            .alignment(Alignment::Center)
            .style(footer_style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[4]);

        if show_help {
            self.render_help(frame);
        }

        if let Some(request) = pending_revoke {
            self.render_confirm_dialog(frame, request, control);
        }
    }

    fn render_wallet(&self, frame: &mut Frame, area: Rect, control: &ControlCenter) {
        let label = Style::default().fg(Color::Gray);

        let lines = match control.session() {
            WalletSession::Connected(wallet) => {
                let network = match wallet.chain_id {
                    Some(id) => find_chain_by_id(id)
                        .map(|c| format!("{} ({})", c.name, id))
                        .unwrap_or_else(|| format!("chain {}", id)),
                    None => "unknown".to_string(),
                };

                let mismatch = wallet
                    .chain_id
                    .map(|id| id != control.selected_chain().chain_id)
                    .unwrap_or(false);

                vec![
                    Line::from(vec![
                        Span::styled("Account: ", label),
                        Span::styled(checksum(&wallet.account), Style::default().fg(Color::Green)),
                    ]),
                    Line::from(vec![
                        Span::styled("Network: ", label),
                        Span::styled(
                            network,
                            if mismatch {
                                Style::default().fg(Color::Yellow)
                            } else {
                                Style::default()
                            },
                        ),
                    ]),
                    Line::from(vec![
                        Span::styled("Balance: ", label),
                        Span::styled(
                            wallet.balance.display(wallet.native_symbol()),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]),
                ]
            }
            WalletSession::Disconnected => {
                let hint = if control.wallet_available() {
                    "Press [c] to connect your wallet"
                } else {
                    "No wallet configured (set CCC_WALLET_RPC)"
                };
                vec![
                    Line::from(Span::styled("Not connected", Style::default().fg(Color::Red))),
                    Line::from(""),
                    Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
                ]
            }
        };

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Wallet"));
        frame.render_widget(widget, area);
    }

    fn render_chain_selector(&self, frame: &mut Frame, area: Rect, control: &ControlCenter) {
        let mut chain_spans = Vec::new();

        for (i, chain) in CHAIN_OPTIONS.iter().enumerate() {
            if i > 0 {
                chain_spans.push(Span::raw(" "));
            }

            if i == control.chain_index() {
                chain_spans.push(Span::styled(
                    format!(" {} ", chain.name),
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                chain_spans.push(Span::styled(
                    format!("[{}]", chain.name),
                    Style::default().fg(Color::Gray),
                ));
            }
        }

        let lines = vec![
            Line::from(chain_spans),
            Line::from(""),
            Line::from(Span::styled(
                control.selected_chain().base_url,
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Chain  [← →]"));
        frame.render_widget(widget, area);
    }

    fn render_swap(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("Widget: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    self.swap_url.as_str(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
                ),
            ]),
            Line::from(Span::styled(
                "Press [o] to open the swap widget in your browser",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ];

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Swapscout (Cross-chain Swap)"));
        frame.render_widget(widget, area);
    }

    fn render_approvals(&self, frame: &mut Frame, area: Rect, control: &ControlCenter, selected_index: usize) {
        let approvals = control.approvals();
        let title = format!("Token Approvals ({})", control.selected_chain().name);
        let block = Block::default().borders(Borders::ALL).title(title);

        let placeholder = if !control.session().is_connected() {
            Some("Connect a wallet to view approvals")
        } else if approvals.loading {
            Some("Loading approvals...")
        } else if approvals.items.is_empty() {
            Some("No approvals loaded. Press [f] to fetch")
        } else {
            None
        };

        if let Some(text) = placeholder {
            let widget = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(widget, area);
            return;
        }

        let header = Row::new(vec!["#", "Token", "Token Address", "Spender"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let rows: Vec<Row> = approvals
            .items
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let spender = record.display_spender();
                let spender_style = if spender == "Unknown" {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };

                let row = Row::new(vec![
                    Cell::from(format!("{}", idx + 1)),
                    Cell::from(truncate_string(record.token_symbol(), 12)),
                    Cell::from(short_address(record.token_address().unwrap_or("-"))),
                    Cell::from(Span::styled(spender.to_string(), spender_style)),
                ]);

                if idx == selected_index {
                    row.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                } else {
                    row
                }
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Length(14),
                Constraint::Length(16),
                Constraint::Min(30),
            ],
        )
        .header(header)
        .block(block);

        frame.render_widget(table, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let popup_area = centered_rect(frame.size(), 70, 20);

        let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled(
                "Cross-Chain Control Center - Keyboard Shortcuts",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Wallet:", section)),
            Line::from("  [c]            Connect wallet"),
            Line::from("  [r]            Refresh balance"),
            Line::from(""),
            Line::from(Span::styled("Approvals:", section)),
            Line::from("  [← →] / [ [ ] ]  Previous/next chain"),
            Line::from("  [f]            Fetch approvals for the selected chain"),
            Line::from("  [↑ ↓] / [j/k]  Select approval"),
            Line::from("  [x] / [Enter]  Revoke selected approval"),
            Line::from(""),
            Line::from(Span::styled("Other:", section)),
            Line::from("  [o]            Open swap widget in browser"),
            Line::from("  [?]            Toggle this help screen"),
            Line::from("  [q] / [Esc]    Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "Press [?] or [Esc] to close this help",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )),
        ];

        frame.render_widget(Clear, popup_area);

        let help_widget = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Span::styled(" Help ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help_widget, popup_area);
    }

    fn render_confirm_dialog(&self, frame: &mut Frame, request: &RevokeRequest, control: &ControlCenter) {
        let dialog_area = centered_rect(frame.size(), 80, 11);
        let label = Style::default().fg(Color::Gray);

        let dialog_text = vec![
            Line::from(Span::styled(
                "Revoke Token Approval",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Token:   ", label),
                Span::raw(format!("{} ({})", request.symbol, checksum(&request.token))),
            ]),
            Line::from(vec![
                Span::styled("Spender: ", label),
                Span::raw(checksum(&request.spender)),
            ]),
            Line::from(vec![
                Span::styled("Chain:   ", label),
                Span::raw(control.selected_chain().name),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Signs approve(spender, 0) with the local key.",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[y] / [Enter] Send | [n] / [Esc] Cancel",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )),
        ];

        frame.render_widget(Clear, dialog_area);

        let dialog_widget = Paragraph::new(dialog_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(Span::styled(" Confirm ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(dialog_widget, dialog_area);
    }
}

/// Rect of at most `width` x `height`, centered in `area`
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = area.width.min(width);
    let height = area.height.min(height);

    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
