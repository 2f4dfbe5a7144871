//! Order lifecycle
//!
//! Each public operation validates its payload, opens one unit of work,
//! runs every stock and line-item change on it and commits. Any failure
//! rolls the whole operation back.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    DeliveryStatus, OrderCreate, OrderDetail, OrderItemInput, OrderStatus, OrderUpdate,
    PaymentStatus,
};
use shared::paging::{Page, Paging};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{DynStorage, UnitOfWork, complete};
use crate::inventory::InventoryLedger;
use crate::utils::validation::{validate_order_create, validate_order_item, validate_order_update};

use super::differ::diff_items;
use super::repository::{ItemFields, OrderAggregateRepository, OrderHeader};

fn order_not_found(order_id: Uuid) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {order_id} not found"))
        .with_detail("orderId", order_id.to_string())
}

fn stock_error(code: ErrorCode, product_id: Uuid, available: i32, requested: i64) -> AppError {
    AppError::new(code)
        .with_detail("productId", product_id.to_string())
        .with_detail("available", available)
        .with_detail("requested", requested)
}

#[derive(Clone)]
pub struct OrderService {
    storage: DynStorage,
    ledger: InventoryLedger,
    repo: OrderAggregateRepository,
    enforce_status_transitions: bool,
}

impl OrderService {
    pub fn new(storage: DynStorage, enforce_status_transitions: bool) -> Self {
        Self {
            storage,
            ledger: InventoryLedger::new(),
            repo: OrderAggregateRepository::new(),
            enforce_status_transitions,
        }
    }

    /// Place an order, taking every item's quantity out of stock
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    pub async fn create_order(&self, user_id: Uuid, payload: OrderCreate) -> AppResult<OrderDetail> {
        validate_order_create(&payload)?;

        let mut uow = self.storage.begin().await?;
        let result = self.create_in(uow.as_mut(), user_id, payload).await;
        let detail = complete(uow, result).await?;

        tracing::info!(order_id = %detail.order.id, "Order created");
        Ok(detail)
    }

    async fn create_in(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: Uuid,
        payload: OrderCreate,
    ) -> AppResult<OrderDetail> {
        for item in &payload.items {
            let product = self.ledger.get_product(uow, item.product_id).await?;

            if product.user_id != user_id {
                return Err(AppError::not_owner(format!("Product {}", product.id)));
            }
            if product.quantity == 0 {
                return Err(stock_error(
                    ErrorCode::ProductOutOfStock,
                    product.id,
                    product.quantity,
                    item.quantity as i64,
                ));
            }
            if product.price != item.purchased_price {
                return Err(AppError::new(ErrorCode::ProductPriceMismatch)
                    .with_detail("productId", product.id.to_string())
                    .with_detail("price", product.price.to_string())
                    .with_detail("purchasedPrice", item.purchased_price.to_string()));
            }
            if product.quantity < item.quantity {
                return Err(stock_error(
                    ErrorCode::InsufficientStock,
                    product.id,
                    product.quantity,
                    item.quantity as i64,
                ));
            }

            self.ledger
                .apply_quantity_delta(uow, product.id, -(item.quantity as i64))
                .await?;
        }

        let header = OrderHeader {
            remark: payload.remark,
            discount: payload.discount,
            total_amount: payload.total_amount,
            status: OrderStatus::Initiated,
            payment_status: PaymentStatus::Pending,
            payment_method: payload.payment_method,
            delivery_status: DeliveryStatus::Pending,
            shipping_address: payload.shipping_address,
            tracking_number: Uuid::new_v4().to_string(),
        };
        let order = self.repo.create_order(uow, user_id, header).await?;

        let inputs: Vec<&OrderItemInput> = payload.items.iter().collect();
        let items = self.repo.create_order_items(uow, order.id, &inputs).await?;

        Ok(OrderDetail::new(order, items))
    }

    /// One page of the caller's orders, newest first
    #[instrument(skip(self))]
    pub async fn get_orders(&self, user_id: Uuid, paging: Paging) -> AppResult<Page<OrderDetail>> {
        let mut uow = self.storage.begin().await?;
        let result = self
            .repo
            .list_orders(uow.as_mut(), user_id, &paging)
            .await
            .map_err(AppError::from);
        let (orders, total) = complete(uow, result).await?;

        Ok(Page::new(orders, paging.info(total)))
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_id(&self, user_id: Uuid, order_id: Uuid) -> AppResult<OrderDetail> {
        let mut uow = self.storage.begin().await?;
        let result = self.owned_order(uow.as_mut(), user_id, order_id).await;
        complete(uow, result).await
    }

    async fn owned_order(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<OrderDetail> {
        let detail = self
            .repo
            .get_order_with_items(uow, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        if detail.order.user_id != user_id {
            return Err(AppError::not_owner(format!("Order {order_id}")));
        }
        Ok(detail)
    }

    /// Replace an order's header and reconcile its items against stock.
    ///
    /// Removed items return their quantity to stock; kept items move stock
    /// by the quantity difference. New items are inserted as given, without
    /// price or stock checks and without touching stock.
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    pub async fn update_order_by_id(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        payload: OrderUpdate,
    ) -> AppResult<OrderDetail> {
        validate_order_update(&payload)?;

        let mut uow = self.storage.begin().await?;
        let result = self.update_in(uow.as_mut(), user_id, order_id, payload).await;
        let detail = complete(uow, result).await?;

        tracing::info!(order_id = %order_id, status = %detail.order.status, "Order updated");
        Ok(detail)
    }

    async fn update_in(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: Uuid,
        order_id: Uuid,
        payload: OrderUpdate,
    ) -> AppResult<OrderDetail> {
        let original = self.owned_order(uow, user_id, order_id).await?;

        let current = original.order.status;
        if !current.can_transition_to(payload.status) {
            if self.enforce_status_transitions {
                return Err(AppError::with_message(
                    ErrorCode::InvalidStatusTransition,
                    format!("Cannot move order from {current} to {}", payload.status),
                )
                .with_detail("from", current.as_str())
                .with_detail("to", payload.status.as_str()));
            }
            tracing::warn!(
                order_id = %order_id,
                from = %current,
                to = %payload.status,
                "Status transition outside the lifecycle table accepted"
            );
        }

        let diff = diff_items(&original.items, &payload.items);

        for item in &diff.to_delete {
            if !self.repo.delete_order_item(uow, item.id).await? {
                return Err(AppError::new(ErrorCode::OrderItemNotFound)
                    .with_detail("orderItemId", item.id.to_string()));
            }
            self.ledger
                .apply_quantity_delta(uow, item.product_id, item.quantity as i64)
                .await?;
        }

        for update in &diff.to_update {
            let product = self
                .ledger
                .get_product(uow, update.original.product_id)
                .await?;

            // Snapshot name and price stay as originally purchased
            let fields = ItemFields {
                purchased_name: update.original.purchased_name.clone(),
                purchased_price: update.original.purchased_price,
                quantity: update.requested.quantity,
            };
            validate_order_item(&OrderItemInput {
                product_id: update.original.product_id,
                purchased_name: fields.purchased_name.clone(),
                purchased_price: fields.purchased_price,
                quantity: fields.quantity,
            })?;

            let delta = update.delta();
            if product.quantity == 0 && delta > 0 {
                return Err(stock_error(
                    ErrorCode::ProductOutOfStock,
                    product.id,
                    product.quantity,
                    delta,
                ));
            }
            if (product.quantity as i64) < delta {
                return Err(stock_error(
                    ErrorCode::InsufficientStock,
                    product.id,
                    product.quantity,
                    delta,
                ));
            }

            if delta != 0 {
                self.ledger
                    .apply_quantity_delta(uow, product.id, -delta)
                    .await?;
            }
            self.repo
                .update_order_item(uow, update.original.id, fields)
                .await?;
        }

        self.repo
            .create_order_items(uow, order_id, &diff.to_create)
            .await?;

        let header = OrderHeader {
            remark: payload.remark,
            discount: payload.discount,
            total_amount: payload.total_amount,
            status: payload.status,
            payment_status: payload.payment_status,
            payment_method: payload.payment_method,
            delivery_status: payload.delivery_status,
            shipping_address: payload.shipping_address,
            tracking_number: payload.tracking_number,
        };
        self.repo.update_order(uow, order_id, header).await?;

        self.repo
            .get_order_with_items(uow, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))
    }

    /// Archive an order. Stock is not returned.
    #[instrument(skip(self))]
    pub async fn cancel_order_by_id(&self, user_id: Uuid, order_id: Uuid) -> AppResult<bool> {
        let mut uow = self.storage.begin().await?;
        let result = self.cancel_in(uow.as_mut(), user_id, order_id).await;
        complete(uow, result).await?;

        tracing::info!(order_id = %order_id, "Order canceled");
        Ok(true)
    }

    async fn cancel_in(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<()> {
        let order = self
            .repo
            .get_order(uow, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        if order.user_id != user_id {
            return Err(AppError::not_owner(format!("Order {order_id}")));
        }
        if order.is_archived {
            return Err(AppError::new(ErrorCode::OrderAlreadyArchived)
                .with_detail("orderId", order_id.to_string()));
        }

        self.repo.soft_delete_order(uow, order_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStorage, Storage};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::models::{PaymentMethod, Product, ProductStatus};
    use std::sync::Arc;

    struct Fixture {
        storage: Arc<MemoryStorage>,
        service: OrderService,
        user: Uuid,
    }

    fn fixture(enforce: bool) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let service = OrderService::new(storage.clone(), enforce);
        Fixture {
            storage,
            service,
            user: Uuid::new_v4(),
        }
    }

    async fn seed(f: &Fixture, quantity: i32, price: i64) -> Uuid {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            user_id: f.user,
            name: "Mug".into(),
            price: Decimal::from(price),
            quantity,
            description: String::new(),
            status: ProductStatus::Active,
            is_archived: false,
            img_url: String::new(),
            created_at: now,
            updated_at: now,
        };
        let mut uow = f.storage.begin().await.unwrap();
        uow.insert_product(&product).await.unwrap();
        uow.commit().await.unwrap();
        product.id
    }

    async fn stock(f: &Fixture, product_id: Uuid) -> i32 {
        let mut uow = f.storage.begin().await.unwrap();
        uow.find_product(product_id).await.unwrap().unwrap().quantity
    }

    fn item(product_id: Uuid, quantity: i32, price: i64) -> OrderItemInput {
        OrderItemInput {
            product_id,
            purchased_name: "Mug".into(),
            purchased_price: Decimal::from(price),
            quantity,
        }
    }

    fn create(items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            items,
            remark: String::new(),
            discount: Decimal::ONE,
            total_amount: Decimal::from(30),
            payment_method: PaymentMethod::Card,
            shipping_address: "1 Harbour Road".into(),
        }
    }

    fn update_from(detail: &OrderDetail, items: Vec<OrderItemInput>) -> OrderUpdate {
        OrderUpdate {
            items,
            remark: detail.order.remark.clone(),
            discount: detail.order.discount,
            total_amount: detail.order.total_amount,
            status: detail.order.status,
            payment_status: detail.order.payment_status,
            payment_method: detail.order.payment_method,
            delivery_status: detail.order.delivery_status,
            shipping_address: detail.order.shipping_address.clone(),
            tracking_number: detail.order.tracking_number.clone(),
        }
    }

    #[tokio::test]
    async fn test_create_sets_initial_statuses() {
        let f = fixture(true);
        let p = seed(&f, 5, 10).await;

        let detail = f
            .service
            .create_order(f.user, create(vec![item(p, 3, 10)]))
            .await
            .unwrap();

        assert_eq!(detail.order.status, OrderStatus::Initiated);
        assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
        assert_eq!(detail.order.delivery_status, DeliveryStatus::Pending);
        assert!(Uuid::parse_str(&detail.order.tracking_number).is_ok());
        assert_eq!(stock(&f, p).await, 2);
    }

    #[tokio::test]
    async fn test_create_rolls_back_earlier_decrements() {
        let f = fixture(true);
        let a = seed(&f, 5, 10).await;
        let b = seed(&f, 1, 10).await;

        let err = f
            .service
            .create_order(f.user, create(vec![item(a, 2, 10), item(b, 2, 10)]))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(stock(&f, a).await, 5);
        assert_eq!(stock(&f, b).await, 1);
    }

    #[tokio::test]
    async fn test_create_checks_in_order() {
        let f = fixture(true);
        let empty = seed(&f, 0, 10).await;
        let priced = seed(&f, 5, 10).await;

        let err = f
            .service
            .create_order(f.user, create(vec![item(empty, 1, 10)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductOutOfStock);

        let err = f
            .service
            .create_order(f.user, create(vec![item(priced, 1, 11)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductPriceMismatch);

        let err = f
            .service
            .create_order(Uuid::new_v4(), create(vec![item(priced, 1, 10)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotOwner);

        let err = f
            .service
            .create_order(f.user, create(vec![item(Uuid::new_v4(), 1, 10)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[tokio::test]
    async fn test_update_rejects_illegal_transition() {
        let f = fixture(true);
        let p = seed(&f, 5, 10).await;
        let detail = f
            .service
            .create_order(f.user, create(vec![item(p, 1, 10)]))
            .await
            .unwrap();

        let mut payload = update_from(&detail, vec![item(p, 1, 10)]);
        payload.status = OrderStatus::Completed;
        let done = f
            .service
            .update_order_by_id(f.user, detail.order.id, payload.clone())
            .await
            .unwrap();
        assert_eq!(done.order.status, OrderStatus::Completed);

        payload.status = OrderStatus::Initiated;
        let err = f
            .service
            .update_order_by_id(f.user, detail.order.id, payload)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn test_update_allows_any_transition_when_not_enforced() {
        let f = fixture(false);
        let p = seed(&f, 5, 10).await;
        let detail = f
            .service
            .create_order(f.user, create(vec![item(p, 1, 10)]))
            .await
            .unwrap();

        let mut payload = update_from(&detail, vec![item(p, 1, 10)]);
        payload.status = OrderStatus::Canceled;
        f.service
            .update_order_by_id(f.user, detail.order.id, payload.clone())
            .await
            .unwrap();

        payload.status = OrderStatus::Shipping;
        let detail = f
            .service
            .update_order_by_id(f.user, detail.order.id, payload)
            .await
            .unwrap();
        assert_eq!(detail.order.status, OrderStatus::Shipping);
    }

    #[tokio::test]
    async fn test_update_keeps_snapshot_name_and_price() {
        let f = fixture(true);
        let p = seed(&f, 10, 10).await;
        let detail = f
            .service
            .create_order(f.user, create(vec![item(p, 2, 10)]))
            .await
            .unwrap();

        let mut changed = item(p, 4, 99);
        changed.purchased_name = "Renamed".into();
        let detail = f
            .service
            .update_order_by_id(f.user, detail.order.id, update_from(&detail, vec![changed]))
            .await
            .unwrap();

        let line = detail.item_for(p).unwrap();
        assert_eq!(line.quantity, 4);
        assert_eq!(line.purchased_name, "Mug");
        assert_eq!(line.purchased_price, Decimal::from(10));
        assert_eq!(stock(&f, p).await, 6);
    }
}
