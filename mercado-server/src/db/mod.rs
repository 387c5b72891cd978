//! Ledger store access: free async query functions per table
//!
//! All status-changing writes are conditional updates keyed on the
//! expected current status; callers must check the returned row count.

pub mod idempotency;
pub mod orders;
pub mod payments;
pub mod users;
pub mod vendors;
