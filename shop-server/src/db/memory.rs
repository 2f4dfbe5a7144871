//! In-memory storage
//!
//! One unit of work at a time holds the table lock. Writes go to a private
//! working copy that replaces the committed tables on commit, so a dropped
//! or rolled-back unit of work leaves no trace.
//!
//! The same constraints as the relational schema are enforced here: stock
//! never negative, item quantity at least one, one item per product per
//! order, items must reference an existing order.

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{Order, OrderItem, Product};
use shared::paging::Paging;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ORDER_ITEM_UNIQUE, RepoError, RepoResult, Storage, UnitOfWork, now};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: Vec<Product>,
    orders: Vec<Order>,
    /// Insertion order is preserved
    order_items: Vec<OrderItem>,
}

/// Process-local storage backend
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

fn page_of<T: Clone>(rows: Vec<&T>, paging: &Paging) -> Vec<T> {
    rows.into_iter()
        .skip(paging.offset() as usize)
        .take(paging.limit as usize)
        .cloned()
        .collect()
}

fn check_item(item: &OrderItem) -> RepoResult<()> {
    if item.quantity < 1 {
        return Err(RepoError::Constraint(format!(
            "order item {} quantity must be at least 1",
            item.id
        )));
    }
    Ok(())
}

#[async_trait]
impl UnitOfWork for MemoryTx {
    async fn find_product(&mut self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.work.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> RepoResult<Product> {
        if self.work.products.iter().any(|p| p.id == product.id) {
            return Err(RepoError::Duplicate(format!("product {}", product.id)));
        }
        if product.quantity < 0 {
            return Err(RepoError::Constraint("product quantity must be >= 0".into()));
        }
        self.work.products.push(product.clone());
        Ok(product.clone())
    }

    async fn update_product(&mut self, product: &Product) -> RepoResult<Product> {
        if product.quantity < 0 {
            return Err(RepoError::Constraint("product quantity must be >= 0".into()));
        }
        let row = self
            .work
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| RepoError::NotFound(format!("Product {}", product.id)))?;
        *row = product.clone();
        Ok(row.clone())
    }

    async fn set_product_quantity(&mut self, id: Uuid, quantity: i32) -> RepoResult<Product> {
        if quantity < 0 {
            return Err(RepoError::Constraint("product quantity must be >= 0".into()));
        }
        let row = self
            .work
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepoError::NotFound(format!("Product {id}")))?;
        row.quantity = quantity;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn list_products(
        &mut self,
        user_id: Uuid,
        paging: &Paging,
    ) -> RepoResult<(Vec<Product>, u64)> {
        let mut rows: Vec<&Product> = self
            .work
            .products
            .iter()
            .filter(|p| p.user_id == user_id && p.name.contains(paging.query.as_str()))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = rows.len() as u64;
        Ok((page_of(rows, paging), total))
    }

    async fn insert_order(&mut self, order: &Order) -> RepoResult<Order> {
        if self.work.orders.iter().any(|o| o.id == order.id) {
            return Err(RepoError::Duplicate(format!("order {}", order.id)));
        }
        self.work.orders.push(order.clone());
        Ok(order.clone())
    }

    async fn find_order(&mut self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.work.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn update_order(&mut self, order: &Order) -> RepoResult<Order> {
        let row = self
            .work
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| RepoError::NotFound(format!("Order {}", order.id)))?;
        *row = order.clone();
        Ok(row.clone())
    }

    async fn list_orders(
        &mut self,
        user_id: Uuid,
        paging: &Paging,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let mut rows: Vec<&Order> = self
            .work
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = rows.len() as u64;
        Ok((page_of(rows, paging), total))
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> RepoResult<Vec<OrderItem>> {
        // Validate the whole batch before touching the table
        for (idx, item) in items.iter().enumerate() {
            check_item(item)?;
            if !self.work.orders.iter().any(|o| o.id == item.order_id) {
                return Err(RepoError::Constraint(format!(
                    "order item references missing order {}",
                    item.order_id
                )));
            }
            let clash = self
                .work
                .order_items
                .iter()
                .chain(items[..idx].iter())
                .any(|other| {
                    other.id == item.id
                        || (other.order_id == item.order_id && other.product_id == item.product_id)
                });
            if clash {
                return Err(RepoError::Duplicate(format!(
                    "order {} already has an item for product {} ({ORDER_ITEM_UNIQUE})",
                    item.order_id, item.product_id
                )));
            }
        }
        self.work.order_items.extend(items.iter().cloned());
        Ok(items.to_vec())
    }

    async fn find_order_item(&mut self, id: Uuid) -> RepoResult<Option<OrderItem>> {
        Ok(self.work.order_items.iter().find(|i| i.id == id).cloned())
    }

    async fn find_order_items(&mut self, order_id: Uuid) -> RepoResult<Vec<OrderItem>> {
        Ok(self
            .work
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_order_item(&mut self, item: &OrderItem) -> RepoResult<OrderItem> {
        check_item(item)?;
        let clash = self.work.order_items.iter().any(|other| {
            other.id != item.id
                && other.order_id == item.order_id
                && other.product_id == item.product_id
        });
        if clash {
            return Err(RepoError::Duplicate(format!(
                "order {} already has an item for product {} ({ORDER_ITEM_UNIQUE})",
                item.order_id, item.product_id
            )));
        }
        let row = self
            .work
            .order_items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| RepoError::NotFound(format!("Order item {}", item.id)))?;
        *row = item.clone();
        Ok(row.clone())
    }

    async fn delete_order_item(&mut self, id: Uuid) -> RepoResult<bool> {
        let before = self.work.order_items.len();
        self.work.order_items.retain(|i| i.id != id);
        Ok(self.work.order_items.len() != before)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}
