//! Database query functions organized by ledger.

pub mod accounts;
pub mod password_resets;
pub mod referrals;
pub mod rewards;
