//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{DeliveryStatus, OrderStatus, PaymentMethod, PaymentStatus};

/// Order header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Multiplier in (0, 1]
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub remark: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_status: DeliveryStatus,
    pub shipping_address: String,
    pub tracking_number: String,
    /// Set once by cancellation, orders are never physically deleted
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line item
///
/// Name and price are snapshots taken when the item was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub purchased_name: String,
    pub purchased_price: Decimal,
    pub quantity: i32,
}

/// Requested line item (create and update payloads)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub purchased_name: String,
    pub purchased_price: Decimal,
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub remark: String,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
}

/// Update order payload
///
/// `items` is the complete desired set; header fields are all rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub remark: String,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_status: DeliveryStatus,
    pub shipping_address: String,
    pub tracking_number: String,
}

/// Order header together with its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    /// Find the line item for a product
    pub fn item_for(&self, product_id: Uuid) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}
