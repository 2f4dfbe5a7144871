//! Product Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::ProductStatus;

/// Product entity
///
/// `quantity` is the live stock level and never goes below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub description: String,
    pub status: ProductStatus,
    pub is_archived: bool,
    pub img_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img_url: String,
}

/// Update product payload (full replace)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub description: String,
    pub status: ProductStatus,
    #[serde(default)]
    pub img_url: String,
}
