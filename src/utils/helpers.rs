/// Helper utilities for the CCC CLI

use anyhow::{Context, Result};
use ethers::types::Address;
use ethers::utils::to_checksum;
use std::fs::OpenOptions;
use std::process::Command;

use crate::utils::AppConfig;

/// Initialise `env_logger`.
///
/// The TUI owns the terminal, so its logs go to `~/.config/ccc-cli/ccc-cli.log`;
/// one-shot commands log warnings to stderr. `RUST_LOG` overrides either default.
pub fn init_logging(to_file: bool) -> Result<()> {
    let default_level = if to_file { "info" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    );

    if to_file {
        let path = AppConfig::config_dir()?.join("ccc-cli.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // A second init (tests, repeated calls) is harmless
    let _ = builder.try_init();
    Ok(())
}

/// EIP-55 checksummed address, the form wallets and explorers display
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

/// Shorten an address to `0x1234…abcd`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 13 {
        address.to_string()
    } else {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

/// Truncate string with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Mask sensitive data (show only first and last N characters)
pub fn mask_sensitive(value: &str, visible_chars: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= visible_chars * 2 {
        "*".repeat(chars.len())
    } else {
        let start: String = chars[..visible_chars].iter().collect();
        let end: String = chars[chars.len() - visible_chars..].iter().collect();
        format!("{}...{}", start, end)
    }
}

/// Open a URL in the system browser
pub fn open_in_browser(url: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    command
        .spawn()
        .with_context(|| format!("Failed to launch a browser for {}", url))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(checksum(&address), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            "0x5aAe…eAed"
        );
        assert_eq!(short_address("Unknown"), "Unknown");
        // Explorer fields are free-form; multi-byte text must not split a char
        assert_eq!(short_address("0x€€€€€€€€€€"), "0x€€€€€€€€€€");
        assert_eq!(short_address("0x€€€€€€€€€€€€€€"), "0x€€€€…€€€€");
        assert_eq!(short_address("Ωmega-token-spender"), "Ωmega-…nder");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a rather long token name", 10), "a rathe...");
    }

    #[test]
    fn test_mask_sensitive() {
        let url = "https://rpc.example.org/v1/5e7f294e4c92a9aa";
        assert_eq!(mask_sensitive(url, 8), "https://...4c92a9aa");
        assert_eq!(mask_sensitive("abc", 4), "***");
        assert_eq!(mask_sensitive("clé-secrète-privée", 3), "clé...vée");
        assert_eq!(mask_sensitive("€€€", 2), "***");
    }
}
