//! Order aggregate persistence
//!
//! Reads and writes an order header together with its line items on an
//! already-open unit of work. No business rules live here.

use rust_decimal::Decimal;
use shared::models::{
    DeliveryStatus, Order, OrderDetail, OrderItem, OrderItemInput, OrderStatus, PaymentMethod,
    PaymentStatus,
};
use shared::paging::Paging;
use uuid::Uuid;

use crate::db::{RepoError, RepoResult, UnitOfWork, now};

/// Mutable header columns of an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderHeader {
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

/// Mutable columns of a line item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub purchased_name: String,
    pub purchased_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderAggregateRepository;

impl OrderAggregateRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insert a new order header owned by `user_id`
    pub async fn create_order(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: Uuid,
        header: OrderHeader,
    ) -> RepoResult<Order> {
        let now = now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            discount: header.discount,
            total_amount: header.total_amount,
            remark: header.remark,
            status: header.status,
            payment_status: header.payment_status,
            payment_method: header.payment_method,
            delivery_status: header.delivery_status,
            shipping_address: header.shipping_address,
            tracking_number: header.tracking_number,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        uow.insert_order(&order).await
    }

    /// Insert line items for an order as one batch
    pub async fn create_order_items(
        &self,
        uow: &mut dyn UnitOfWork,
        order_id: Uuid,
        items: &[&OrderItemInput],
    ) -> RepoResult<Vec<OrderItem>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<OrderItem> = items
            .iter()
            .map(|input| OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: input.product_id,
                purchased_name: input.purchased_name.clone(),
                purchased_price: input.purchased_price,
                quantity: input.quantity,
            })
            .collect();
        uow.insert_order_items(&rows).await
    }

    pub async fn get_order(
        &self,
        uow: &mut dyn UnitOfWork,
        order_id: Uuid,
    ) -> RepoResult<Option<Order>> {
        uow.find_order(order_id).await
    }

    /// Load an order with its line items
    pub async fn get_order_with_items(
        &self,
        uow: &mut dyn UnitOfWork,
        order_id: Uuid,
    ) -> RepoResult<Option<OrderDetail>> {
        let Some(order) = uow.find_order(order_id).await? else {
            return Ok(None);
        };
        let items = uow.find_order_items(order_id).await?;
        Ok(Some(OrderDetail::new(order, items)))
    }

    /// Rewrite every header column
    pub async fn update_order(
        &self,
        uow: &mut dyn UnitOfWork,
        order_id: Uuid,
        header: OrderHeader,
    ) -> RepoResult<Order> {
        let mut order = uow
            .find_order(order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {order_id}")))?;

        order.remark = header.remark;
        order.discount = header.discount;
        order.total_amount = header.total_amount;
        order.status = header.status;
        order.payment_status = header.payment_status;
        order.payment_method = header.payment_method;
        order.delivery_status = header.delivery_status;
        order.shipping_address = header.shipping_address;
        order.tracking_number = header.tracking_number;
        order.updated_at = now();

        uow.update_order(&order).await
    }

    pub async fn update_order_item(
        &self,
        uow: &mut dyn UnitOfWork,
        item_id: Uuid,
        fields: ItemFields,
    ) -> RepoResult<OrderItem> {
        let mut item = uow
            .find_order_item(item_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order item {item_id}")))?;

        item.purchased_name = fields.purchased_name;
        item.purchased_price = fields.purchased_price;
        item.quantity = fields.quantity;

        uow.update_order_item(&item).await
    }

    /// Returns false when the item does not exist
    pub async fn delete_order_item(
        &self,
        uow: &mut dyn UnitOfWork,
        item_id: Uuid,
    ) -> RepoResult<bool> {
        uow.delete_order_item(item_id).await
    }

    /// Mark an order archived. Does not check whether it already is.
    pub async fn soft_delete_order(
        &self,
        uow: &mut dyn UnitOfWork,
        order_id: Uuid,
    ) -> RepoResult<Order> {
        let mut order = uow
            .find_order(order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {order_id}")))?;
        order.is_archived = true;
        order.updated_at = now();
        uow.update_order(&order).await
    }

    /// One page of a user's orders with their items, plus the user's total
    pub async fn list_orders(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: Uuid,
        paging: &Paging,
    ) -> RepoResult<(Vec<OrderDetail>, u64)> {
        let (orders, total) = uow.list_orders(user_id, paging).await?;
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let items = uow.find_order_items(order.id).await?;
            details.push(OrderDetail::new(order, items));
        }
        Ok((details, total))
    }
}
