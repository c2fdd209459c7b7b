/// CLI argument parsing

use clap::{ArgGroup, Parser, Subcommand};

// Build timestamp injected at compile time
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "ccc-cli")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported chains
    Chains,

    /// Connect the wallet and show its native balance
    Balance,

    /// List token approvals of the connected account
    Approvals {
        /// Chain to query (gnosis, optimism, base, ethereum)
        #[arg(short, long)]
        chain: Option<String>,

        /// Print raw JSON records
        #[arg(long)]
        json: bool,
    },

    /// Revoke a token approval by setting its allowance to zero
    #[command(group(ArgGroup::new("target").required(true).args(["index", "token"])))]
    Revoke {
        /// Chain the approval lives on
        #[arg(short, long)]
        chain: Option<String>,

        /// Row number from `ccc-cli approvals`
        #[arg(short, long)]
        index: Option<usize>,

        /// Token contract address
        #[arg(long, requires = "spender")]
        token: Option<String>,

        /// Spender address
        #[arg(long, requires = "token")]
        spender: Option<String>,

        /// Send the transaction (without it the revoke is only previewed)
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the swap widget URL
    Swap {
        /// Open it in the default browser
        #[arg(short, long)]
        open: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// View configuration
    View,

    /// Print the config file location
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_revoke_by_index() {
        let cli = Cli::try_parse_from(["ccc-cli", "revoke", "--chain", "base", "--index", "2", "--yes"]).unwrap();
        match cli.command {
            Some(Commands::Revoke { chain, index, token, yes, .. }) => {
                assert_eq!(chain.as_deref(), Some("base"));
                assert_eq!(index, Some(2));
                assert!(token.is_none());
                assert!(yes);
            }
            _ => panic!("expected revoke"),
        }
    }

    #[test]
    fn test_revoke_needs_a_target() {
        assert!(Cli::try_parse_from(["ccc-cli", "revoke"]).is_err());
        assert!(Cli::try_parse_from(["ccc-cli", "revoke", "--token", "0xA"]).is_err());
        assert!(Cli::try_parse_from(["ccc-cli", "revoke", "--token", "0xA", "--spender", "0xB"]).is_ok());
    }

    #[test]
    fn test_no_command_runs_dashboard() {
        let cli = Cli::try_parse_from(["ccc-cli"]).unwrap();
        assert!(cli.command.is_none());
    }
}
