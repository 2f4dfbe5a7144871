//! Order lifecycle module
//!
//! - **differ**: splits stored and requested line items into delete/update/create sets
//! - **repository**: order header + line item persistence on a unit of work
//! - **service**: create, list, read, update and cancel operations
//!
//! # Data Flow
//!
//! ```text
//! handler → OrderService → (validate) → UnitOfWork
//!                             ↓
//!              InventoryLedger + OrderAggregateRepository
//!                             ↓
//!                      commit / rollback
//! ```

pub mod differ;
pub mod repository;
pub mod service;

pub use differ::{ItemDiff, ItemUpdate, diff_items};
pub use repository::{ItemFields, OrderAggregateRepository, OrderHeader};
pub use service::OrderService;
