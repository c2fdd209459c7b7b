use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use ccc_cli::app::App;
use ccc_cli::cli::{Cli, Commands, ConfigCommands};
use ccc_cli::core::{detect_wallet, ApprovalRecord, BlockscoutClient, ControlCenter, NoticeKind};
use ccc_cli::utils::{
    checksum, init_logging, mask_sensitive, open_in_browser, short_address, truncate_string,
    AppConfig, CHAIN_OPTIONS,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.command.is_none())?;

    let config = AppConfig::load()?;

    match cli.command {
        None => {
            // No command - run interactive TUI
            let mut app = App::new(config)?;
            app.run().await?;
        }
        Some(Commands::Chains) => {
            handle_chains(&config);
        }
        Some(Commands::Balance) => {
            handle_balance(&config).await?;
        }
        Some(Commands::Approvals { chain, json }) => {
            handle_approvals(&config, chain, json).await?;
        }
        Some(Commands::Revoke {
            chain,
            index,
            token,
            spender,
            yes,
        }) => {
            handle_revoke(&config, chain, index, token, spender, yes).await?;
        }
        Some(Commands::Swap { open }) => {
            handle_swap(&config, open)?;
        }
        Some(Commands::Config { command }) => {
            handle_config(&config, command)?;
        }
    }

    Ok(())
}

fn build_control(config: &AppConfig) -> Result<ControlCenter> {
    let source = BlockscoutClient::new(Duration::from_secs(config.http_timeout_secs))
        .context("Failed to create block explorer client")?;

    Ok(ControlCenter::new(
        detect_wallet(config),
        Arc::new(source),
        config.default_chain.as_deref(),
    ))
}

/// Print and drain pending notices; returns true if any was an error
fn print_notices(control: &mut ControlCenter) -> bool {
    let mut failed = false;
    for notice in control.take_notices() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.to_string().green()),
            NoticeKind::Info => println!("{}", notice),
            _ => {
                failed = true;
                eprintln!("{}", notice.to_string().red());
            }
        }
    }
    failed
}

/// Connect and fail unless an account was authorized
async fn connect(control: &mut ControlCenter) -> Result<()> {
    control.connect().await;
    print_notices(control);

    if !control.session().is_connected() {
        bail!("Wallet connection failed (see log output for details)");
    }
    control.process_reactions().await;
    Ok(())
}

fn select_chain(control: &mut ControlCenter, chain: Option<String>) -> Result<()> {
    if let Some(id) = chain {
        control.select_chain(&id).with_context(|| {
            let known: Vec<&str> = CHAIN_OPTIONS.iter().map(|c| c.id).collect();
            format!("Supported chains: {}", known.join(", "))
        })?;
    }
    Ok(())
}

fn handle_chains(config: &AppConfig) {
    let default = config.default_chain.as_deref().unwrap_or(CHAIN_OPTIONS[0].id);

    println!("Supported chains\n");
    println!("{:<3}{:<10} {:<14} {:>8}  {:<6} {}", "", "ID", "Name", "Chain ID", "Native", "Explorer");
    println!("{}", "-".repeat(80));

    for chain in CHAIN_OPTIONS {
        let marker = if chain.id == default { "*" } else { "" };
        println!(
            "{:<3}{:<10} {:<14} {:>8}  {:<6} {}",
            marker, chain.id, chain.name, chain.chain_id, chain.native_symbol, chain.base_url
        );
    }
}

async fn handle_balance(config: &AppConfig) -> Result<()> {
    let mut control = build_control(config)?;
    connect(&mut control).await?;

    if let Some(wallet) = control.session().wallet() {
        let network = wallet
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        println!("Account: {}", checksum(&wallet.account).bold());
        println!("Network: {}", network);
        println!("Balance: {}", wallet.balance.display(wallet.native_symbol()));
    }

    Ok(())
}

async fn handle_approvals(config: &AppConfig, chain: Option<String>, as_json: bool) -> Result<()> {
    let mut control = build_control(config)?;
    select_chain(&mut control, chain)?;
    connect(&mut control).await?;

    control.fetch_approvals().await;
    if print_notices(&mut control) {
        bail!("Could not fetch approvals");
    }

    let items = &control.approvals().items;

    if as_json {
        let raw: Vec<_> = items.iter().map(ApprovalRecord::raw).collect();
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    println!("Token approvals on {}\n", control.selected_chain().name);

    if items.is_empty() {
        println!("No approvals found");
        return Ok(());
    }

    println!("{:<4} {:<12} {:<16} {}", "#", "Token", "Address", "Spender");
    println!("{}", "-".repeat(80));

    for (i, record) in items.iter().enumerate() {
        println!(
            "{:<4} {:<12} {:<16} {}",
            i + 1,
            truncate_string(record.token_symbol(), 12),
            short_address(record.token_address().unwrap_or("-")),
            record.display_spender()
        );
    }

    println!("\nRevoke with: ccc-cli revoke --chain {} --index <#>", control.selected_chain().id);

    Ok(())
}

async fn handle_revoke(
    config: &AppConfig,
    chain: Option<String>,
    index: Option<usize>,
    token: Option<String>,
    spender: Option<String>,
    yes: bool,
) -> Result<()> {
    let mut control = build_control(config)?;
    select_chain(&mut control, chain)?;
    connect(&mut control).await?;

    let record = match index {
        Some(index) => {
            control.fetch_approvals().await;
            if print_notices(&mut control) {
                bail!("Could not fetch approvals");
            }
            let items = &control.approvals().items;
            index
                .checked_sub(1)
                .and_then(|i| items.get(i))
                .cloned()
                .with_context(|| format!("No approval #{} (found {})", index, items.len()))?
        }
        None => ApprovalRecord::new(json!({
            "token_address": token,
            "spender": spender,
        })),
    };

    let Some(request) = control.prepare_revoke(&record) else {
        print_notices(&mut control);
        bail!("Revoke not sent");
    };

    if !yes {
        let signer = if request.needs_local_confirmation() {
            "the local key"
        } else {
            "the connected wallet"
        };
        println!(
            "About to sign approve({}, 0) on {} ({}) with {}.",
            checksum(&request.spender),
            request.symbol,
            checksum(&request.token),
            signer
        );
        bail!("Re-run with --yes to send the transaction");
    }

    println!("Revoking {} allowance for {}...", request.symbol, checksum(&request.spender));

    let result = request.execute().await;
    control.finish_revoke(result);

    if print_notices(&mut control) {
        bail!("Revoke failed");
    }

    Ok(())
}

fn handle_swap(config: &AppConfig, open: bool) -> Result<()> {
    println!("Swap widget: {}", config.swap_widget_url);

    if open {
        open_in_browser(&config.swap_widget_url)?;
        println!("{}", "✓ Opened in browser".green());
    }

    Ok(())
}

fn handle_config(config: &AppConfig, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::View => {
            println!("Configuration:\n");
            println!(
                "wallet_rpc_url: {}",
                config.wallet_rpc_url.as_deref().unwrap_or("<not set>")
            );
            println!("private_key_env: {}", config.private_key_env);
            println!(
                "private key: {}",
                config
                    .private_key()
                    .map(|k| mask_sensitive(&k, 4))
                    .unwrap_or_else(|| "<not set>".to_string())
            );
            println!(
                "default_chain: {}",
                config.default_chain.as_deref().unwrap_or(CHAIN_OPTIONS[0].id)
            );
            println!("swap_widget_url: {}", config.swap_widget_url);
            println!("http_timeout_secs: {}", config.http_timeout_secs);
        }
        ConfigCommands::Path => {
            println!("{}", AppConfig::config_path()?.display());
        }
        ConfigCommands::Init { force } => {
            let path = AppConfig::config_path()?;
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let path = AppConfig::default().save()?;
            println!("✓ Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
