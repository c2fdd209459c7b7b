pub mod dashboard;

// The whole TUI is a single screen in dashboard.rs:
// - Wallet card (account, network, native balance)
// - Chain selector
// - Swap widget link
// - Token approvals table with revoke
//
// Overlays: help ('?') and the local-key revoke confirmation.

pub use dashboard::Dashboard;
