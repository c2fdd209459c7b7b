/// Native balance formatting

use ethers::types::U256;
use ethers::utils::format_units;

use crate::utils::NATIVE_DECIMALS;

/// Balance shown for the connected account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceState {
    Loading,
    Loaded(String),
    Unavailable(String),
}

impl BalanceState {
    pub fn display(&self, symbol: &str) -> String {
        match self {
            BalanceState::Loading => "Loading...".to_string(),
            BalanceState::Loaded(amount) => format!("{} {}", amount, symbol),
            BalanceState::Unavailable(_) => "unavailable".to_string(),
        }
    }

    pub fn amount(&self) -> Option<&str> {
        match self {
            BalanceState::Loaded(amount) => Some(amount),
            _ => None,
        }
    }
}

/// Scale a wei amount by 18 decimals into a canonical decimal string.
///
/// Trailing fractional zeros are trimmed but one digit always remains,
/// so one ether renders as `1.0`.
pub fn format_native_balance(wei: U256) -> String {
    let raw = format_units(wei, NATIVE_DECIMALS).unwrap_or_else(|_| wei.to_string());
    canonical_decimal(&raw)
}

fn canonical_decimal(raw: &str) -> String {
    match raw.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            let whole = if whole.is_empty() { "0" } else { whole };
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", raw),
    }
}
