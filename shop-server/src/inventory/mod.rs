//! Inventory
//!
//! Stock levels change only through [`InventoryLedger`], always inside the
//! caller's unit of work.

pub mod ledger;

pub use ledger::{InventoryLedger, LedgerError};
