//! Shop Server - order lifecycle and inventory reconciliation
//!
//! # Overview
//!
//! - **Orders** (`orders`): create, update, cancel and list orders while
//!   keeping product stock consistent with line items
//! - **Inventory** (`inventory`): the only path that changes stock
//! - **Products** (`products`): owner-scoped catalogue CRUD
//! - **Storage** (`db`): explicit units of work over PostgreSQL or memory
//! - **HTTP API** (`api`): axum routes behind JWT bearer auth
//!
//! # Module layout
//!
//! ```text
//! shop-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT verification, CurrentUser extractor
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # UnitOfWork traits, PostgreSQL + memory backends
//! ├── inventory/     # stock ledger
//! ├── orders/        # differ, aggregate repository, lifecycle service
//! ├── products/      # catalogue service
//! └── utils/         # logger, validation, extractors
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use db::{DynStorage, MemoryStorage, PgStorage, Storage, UnitOfWork};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

pub use utils::logger::init_logger_with_file;

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Start logging as configured
pub fn setup_environment(config: &Config) {
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
}
