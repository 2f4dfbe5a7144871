//! Storage layer
//!
//! Every service operation runs inside one [`UnitOfWork`] obtained from a
//! [`Storage`]. The unit of work is committed or rolled back explicitly by
//! the caller; dropping it without a commit discards its writes.
//!
//! Two backends implement the same contract:
//! - [`PgStorage`]: PostgreSQL via sqlx, isolation level from config
//! - [`MemoryStorage`]: in-process tables, one unit of work at a time

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderItem, Product};
use shared::paging::Paging;
use thiserror::Error;
use uuid::Uuid;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Foreign key / check / not-null constraint violated
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Serialization failure or deadlock, the transaction was aborted
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Unique constraint on one item per product per order
pub(crate) const ORDER_ITEM_UNIQUE: &str = "order_items_order_product";

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Duplicate(msg) if msg.contains(ORDER_ITEM_UNIQUE) => {
                AppError::with_message(ErrorCode::OrderItemExists, msg)
            }
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Constraint(msg) => AppError::validation(msg),
            RepoError::Conflict(msg) => {
                tracing::warn!(error = %msg, "Transaction aborted by concurrent update");
                AppError::conflict(msg)
            }
            RepoError::Database(msg) => {
                tracing::error!(target: "database", error = %msg, "Database error occurred");
                AppError::database("Database error")
            }
        }
    }
}

/// Transaction isolation level for the relational backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "read_committed",
            IsolationLevel::RepeatableRead => "repeatable_read",
            IsolationLevel::Serializable => "serializable",
        }
    }

    /// Statement issued as the first command of every transaction
    pub(crate) fn set_transaction_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

impl FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "read_committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable_read" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            other => Err(format!("unknown isolation level: {other}")),
        }
    }
}

/// Source of units of work
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open a new unit of work
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// Shared handle to the configured storage backend
pub type DynStorage = Arc<dyn Storage>;

/// One all-or-nothing transaction over products, orders and order items
///
/// Row operations never open or close transactions themselves. Updates of a
/// missing row return [`RepoError::NotFound`].
#[async_trait]
pub trait UnitOfWork: Send {
    // ── Products ──

    async fn find_product(&mut self, id: Uuid) -> RepoResult<Option<Product>>;

    async fn insert_product(&mut self, product: &Product) -> RepoResult<Product>;

    /// Rewrite every mutable column of a product
    async fn update_product(&mut self, product: &Product) -> RepoResult<Product>;

    /// Write a new stock level; negative values violate a constraint
    async fn set_product_quantity(&mut self, id: Uuid, quantity: i32) -> RepoResult<Product>;

    /// Owner's products whose name contains `paging.query`, newest first,
    /// plus the total number of matches
    async fn list_products(
        &mut self,
        user_id: Uuid,
        paging: &Paging,
    ) -> RepoResult<(Vec<Product>, u64)>;

    // ── Orders ──

    async fn insert_order(&mut self, order: &Order) -> RepoResult<Order>;

    async fn find_order(&mut self, id: Uuid) -> RepoResult<Option<Order>>;

    /// Rewrite every mutable column of an order header
    async fn update_order(&mut self, order: &Order) -> RepoResult<Order>;

    /// Owner's orders newest first, plus the owner's total order count
    async fn list_orders(&mut self, user_id: Uuid, paging: &Paging)
    -> RepoResult<(Vec<Order>, u64)>;

    // ── Order items ──

    /// Insert a batch; either every row is written or none is
    async fn insert_order_items(&mut self, items: &[OrderItem]) -> RepoResult<Vec<OrderItem>>;

    async fn find_order_item(&mut self, id: Uuid) -> RepoResult<Option<OrderItem>>;

    /// Items of one order in insertion order
    async fn find_order_items(&mut self, order_id: Uuid) -> RepoResult<Vec<OrderItem>>;

    async fn update_order_item(&mut self, item: &OrderItem) -> RepoResult<OrderItem>;

    /// Returns false when no such item exists
    async fn delete_order_item(&mut self, id: Uuid) -> RepoResult<bool>;

    // ── Lifecycle ──

    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

/// Current time at the precision the relational store keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Commit `uow` when `result` is Ok, roll it back otherwise.
///
/// A failed commit turns a successful result into an error. A failed
/// rollback is logged and the original error is returned.
pub async fn complete<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
