/// Error types for wallet, explorer and dashboard operations

use ethers::types::TxHash;
use thiserror::Error;

/// Failures reported by the wallet provider or while signing
#[derive(Debug, Error)]
pub enum WalletError {
    /// No wallet capability was detected in this environment
    #[error("wallet not available: {0}")]
    Unavailable(String),

    #[error("request rejected by wallet: {0}")]
    Rejected(String),

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("wallet provider error: {0}")]
    Provider(String),

    #[error("invalid {field} address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("transaction {0:?} reverted")]
    Reverted(TxHash),

    #[error("transaction dropped before confirmation")]
    Dropped,

    /// The wallet's active network differs from the selected chain
    #[error("wallet is on chain {wallet}, expected chain {selected}")]
    ChainMismatch { wallet: u64, selected: u64 },
}

impl WalletError {
    /// Classify a JSON-RPC failure message; EIP-1193 code 4001 is a user rejection
    pub fn from_rpc_message(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("4001") || lower.contains("user rejected") || lower.contains("user denied") {
            WalletError::Rejected(message)
        } else {
            WalletError::Provider(message)
        }
    }
}

/// Failures while fetching approvals from the block explorer
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("explorer returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid JSON response: {0}")]
    Decode(String),
}

/// Failures of dashboard state transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("unknown chain: {0}")]
    UnknownChain(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(matches!(
            WalletError::from_rpc_message("(code: 4001, message: User rejected the request.)".into()),
            WalletError::Rejected(_)
        ));
        assert!(matches!(
            WalletError::from_rpc_message("connection refused".into()),
            WalletError::Provider(_)
        ));
    }

    #[test]
    fn test_display() {
        let err = WalletError::InvalidAddress { field: "spender", value: String::new() };
        assert_eq!(err.to_string(), "invalid spender address: \"\"");
        assert_eq!(
            WalletError::ChainMismatch { wallet: 1, selected: 100 }.to_string(),
            "wallet is on chain 1, expected chain 100"
        );
        assert_eq!(
            ControlError::UnknownChain("polygon".into()).to_string(),
            "unknown chain: polygon"
        );
    }
}
