pub mod approvals;
pub mod balance;
pub mod control;
pub mod error;
pub mod wallet;

pub use approvals::{ApprovalRecord, ApprovalSource, BlockscoutClient};
pub use balance::BalanceState;
pub use control::{ControlCenter, Notice, NoticeKind, WalletSession};
pub use error::{ControlError, FetchError, WalletError};
pub use wallet::{detect_wallet, EthersWallet, SigningHandle, WalletProvider};
