//! Behaviour every storage backend must show through the order service.
//!
//! Each check takes a fresh `DynStorage` and works with its own user ids,
//! so the same suite runs against the in-memory store and PostgreSQL.

#![allow(dead_code)]

use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{
    OrderCreate, OrderDetail, OrderItemInput, OrderUpdate, PaymentMethod, ProductCreate,
    ProductStatus, ProductUpdate,
};
use shared::paging::Paging;
use shop_server::DynStorage;
use shop_server::orders::OrderService;
use shop_server::products::ProductService;
use uuid::Uuid;

pub struct Shop {
    pub orders: OrderService,
    pub products: ProductService,
    pub user: Uuid,
}

impl Shop {
    pub fn new(storage: DynStorage) -> Self {
        Self {
            orders: OrderService::new(storage.clone(), true),
            products: ProductService::new(storage),
            user: Uuid::new_v4(),
        }
    }

    pub async fn seed_product(&self, quantity: i32, price: i64) -> Uuid {
        self.products
            .create_product(
                self.user,
                ProductCreate {
                    name: "Enamel mug".into(),
                    price: Decimal::from(price),
                    quantity,
                    description: String::new(),
                    img_url: String::new(),
                },
            )
            .await
            .unwrap()
            .id
    }

    pub async fn stock(&self, product_id: Uuid) -> i32 {
        self.products
            .get_product_by_id(product_id)
            .await
            .unwrap()
            .quantity
    }

    /// Overwrite a product's stock through the catalogue
    pub async fn restock(&self, product_id: Uuid, quantity: i32) {
        let product = self.products.get_product_by_id(product_id).await.unwrap();
        self.products
            .update_product_by_id(
                self.user,
                product_id,
                ProductUpdate {
                    name: product.name,
                    price: product.price,
                    quantity,
                    description: product.description,
                    status: ProductStatus::Active,
                    img_url: product.img_url,
                },
            )
            .await
            .unwrap();
    }
}

pub fn item(product_id: Uuid, quantity: i32, price: i64) -> OrderItemInput {
    OrderItemInput {
        product_id,
        purchased_name: "Enamel mug".into(),
        purchased_price: Decimal::from(price),
        quantity,
    }
}

pub fn create(items: Vec<OrderItemInput>) -> OrderCreate {
    OrderCreate {
        items,
        remark: "leave at the door".into(),
        discount: Decimal::ONE,
        total_amount: Decimal::from(30),
        payment_method: PaymentMethod::Card,
        shipping_address: "1 Harbour Road".into(),
    }
}

/// Update payload that keeps the header and replaces the items
pub fn update_from(detail: &OrderDetail, items: Vec<OrderItemInput>) -> OrderUpdate {
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

// ── Contract checks ─────────────────────────────────────────────────

pub async fn create_decrements_stock(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(5, 10).await;

    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(p, 3, 10)]))
        .await
        .unwrap();

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 3);
    assert_eq!(detail.items[0].order_id, detail.order.id);
    assert_eq!(shop.stock(p).await, 2);
}

pub async fn insufficient_stock_leaves_nothing_behind(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(2, 10).await;

    let err = shop
        .orders
        .create_order(shop.user, create(vec![item(p, 5, 10)]))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(shop.stock(p).await, 2);

    let page = shop
        .orders
        .get_orders(shop.user, Paging::default())
        .await
        .unwrap();
    assert_eq!(page.paging.total, 0);
}

pub async fn failed_create_restores_earlier_items(storage: DynStorage) {
    let shop = Shop::new(storage);
    let a = shop.seed_product(5, 10).await;
    let b = shop.seed_product(5, 12).await;

    let err = shop
        .orders
        .create_order(shop.user, create(vec![item(a, 2, 10), item(b, 1, 99)]))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ProductPriceMismatch);
    assert_eq!(shop.stock(a).await, 5);
    assert_eq!(shop.stock(b).await, 5);
}

pub async fn empty_update_returns_all_stock(storage: DynStorage) {
    let shop = Shop::new(storage);
    let a = shop.seed_product(5, 10).await;
    let b = shop.seed_product(4, 7).await;

    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(a, 3, 10), item(b, 4, 7)]))
        .await
        .unwrap();
    assert_eq!(shop.stock(b).await, 0);

    let updated = shop
        .orders
        .update_order_by_id(shop.user, detail.order.id, update_from(&detail, vec![]))
        .await
        .unwrap();

    assert!(updated.items.is_empty());
    assert_eq!(shop.stock(a).await, 5);
    assert_eq!(shop.stock(b).await, 4);
}

pub async fn update_stock_boundary(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(10, 10).await;
    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(p, 3, 10)]))
        .await
        .unwrap();
    let order_id = detail.order.id;

    // Remaining stock equals the increase
    shop.restock(p, 2).await;
    let detail = shop
        .orders
        .update_order_by_id(shop.user, order_id, update_from(&detail, vec![item(p, 5, 10)]))
        .await
        .unwrap();
    assert_eq!(detail.item_for(p).unwrap().quantity, 5);
    assert_eq!(shop.stock(p).await, 0);

    // One short of the increase
    shop.restock(p, 1).await;
    let err = shop
        .orders
        .update_order_by_id(shop.user, order_id, update_from(&detail, vec![item(p, 7, 10)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(shop.stock(p).await, 1);

    // Nothing left at all
    shop.restock(p, 0).await;
    let err = shop
        .orders
        .update_order_by_id(shop.user, order_id, update_from(&detail, vec![item(p, 6, 10)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductOutOfStock);

    // Lowering a quantity always works, even from empty stock
    let detail = shop
        .orders
        .update_order_by_id(shop.user, order_id, update_from(&detail, vec![item(p, 2, 10)]))
        .await
        .unwrap();
    assert_eq!(detail.item_for(p).unwrap().quantity, 2);
    assert_eq!(shop.stock(p).await, 3);
}

pub async fn update_reconciles_items(storage: DynStorage) {
    let shop = Shop::new(storage);
    let a = shop.seed_product(10, 10).await;
    let b = shop.seed_product(10, 10).await;
    let c = shop.seed_product(10, 10).await;

    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(a, 2, 10), item(b, 3, 10)]))
        .await
        .unwrap();

    let updated = shop
        .orders
        .update_order_by_id(
            shop.user,
            detail.order.id,
            update_from(&detail, vec![item(b, 1, 10), item(c, 4, 10)]),
        )
        .await
        .unwrap();

    assert_eq!(updated.items.len(), 2);
    assert!(updated.item_for(a).is_none());
    assert_eq!(updated.item_for(b).unwrap().quantity, 1);
    assert_eq!(updated.item_for(c).unwrap().quantity, 4);

    assert_eq!(shop.stock(a).await, 10);
    assert_eq!(shop.stock(b).await, 9);
    // New lines on update are inserted without touching stock
    assert_eq!(shop.stock(c).await, 10);
}

pub async fn failed_update_rolls_back(storage: DynStorage) {
    let shop = Shop::new(storage);
    let a = shop.seed_product(10, 10).await;
    let b = shop.seed_product(3, 10).await;

    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(a, 2, 10), item(b, 1, 10)]))
        .await
        .unwrap();

    // Dropping `a` succeeds before growing `b` fails
    let err = shop
        .orders
        .update_order_by_id(
            shop.user,
            detail.order.id,
            update_from(&detail, vec![item(b, 9, 10)]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);

    let reloaded = shop
        .orders
        .get_order_by_id(shop.user, detail.order.id)
        .await
        .unwrap();
    assert_eq!(reloaded, detail);
    assert_eq!(shop.stock(a).await, 8);
    assert_eq!(shop.stock(b).await, 2);
}

pub async fn concurrent_last_unit(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(1, 10).await;

    let (first, second) = tokio::join!(
        shop.orders
            .create_order(shop.user, create(vec![item(p, 1, 10)])),
        shop.orders
            .create_order(shop.user, create(vec![item(p, 1, 10)])),
    );

    let succeeded = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert!(succeeded <= 1);
    for result in [first, second] {
        if let Err(err) = result {
            assert!(
                matches!(
                    err.code,
                    ErrorCode::ProductOutOfStock
                        | ErrorCode::InsufficientStock
                        | ErrorCode::TransactionConflict
                ),
                "unexpected error: {err}"
            );
        }
    }
    assert_eq!(shop.stock(p).await, 1 - succeeded as i32);
}

pub async fn round_trip(storage: DynStorage) {
    let shop = Shop::new(storage);
    let a = shop.seed_product(5, 10).await;
    let b = shop.seed_product(5, 25).await;

    let created = shop
        .orders
        .create_order(shop.user, create(vec![item(a, 1, 10), item(b, 2, 25)]))
        .await
        .unwrap();
    let loaded = shop
        .orders
        .get_order_by_id(shop.user, created.order.id)
        .await
        .unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.order.remark, "leave at the door");
    assert_eq!(loaded.items[0].product_id, a);
    assert_eq!(loaded.items[1].purchased_price, Decimal::from(25));
}

pub async fn cancel_archives_once(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(5, 10).await;
    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(p, 2, 10)]))
        .await
        .unwrap();

    assert!(
        shop.orders
            .cancel_order_by_id(shop.user, detail.order.id)
            .await
            .unwrap()
    );
    let err = shop
        .orders
        .cancel_order_by_id(shop.user, detail.order.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderAlreadyArchived);

    let archived = shop
        .orders
        .get_order_by_id(shop.user, detail.order.id)
        .await
        .unwrap();
    assert!(archived.order.is_archived);
    assert_eq!(archived.items.len(), 1);
    // Cancellation keeps the stock taken at creation
    assert_eq!(shop.stock(p).await, 3);
}

pub async fn other_users_are_rejected(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(5, 10).await;
    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(p, 1, 10)]))
        .await
        .unwrap();
    let stranger = Uuid::new_v4();
    let order_id = detail.order.id;

    let err = shop
        .orders
        .get_order_by_id(stranger, order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotOwner);

    let err = shop
        .orders
        .update_order_by_id(stranger, order_id, update_from(&detail, vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotOwner);

    let err = shop
        .orders
        .cancel_order_by_id(stranger, order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotOwner);

    let err = shop
        .orders
        .create_order(stranger, create(vec![item(p, 1, 10)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotOwner);
    assert_eq!(shop.stock(p).await, 4);
}

pub async fn missing_orders(storage: DynStorage) {
    let shop = Shop::new(storage);
    let p = shop.seed_product(5, 10).await;
    let detail = shop
        .orders
        .create_order(shop.user, create(vec![item(p, 1, 10)]))
        .await
        .unwrap();
    let unknown = Uuid::new_v4();

    let err = shop
        .orders
        .get_order_by_id(shop.user, unknown)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    let err = shop
        .orders
        .update_order_by_id(shop.user, unknown, update_from(&detail, vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    let err = shop
        .orders
        .cancel_order_by_id(shop.user, unknown)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
}

pub async fn list_pages_newest_first(storage: DynStorage) {
    let shop = Shop::new(storage.clone());
    let p = shop.seed_product(20, 10).await;
    for _ in 0..3 {
        shop.orders
            .create_order(shop.user, create(vec![item(p, 1, 10)]))
            .await
            .unwrap();
    }

    // Someone else's orders never show up
    let other = Shop::new(storage);
    let q = other.seed_product(5, 10).await;
    other
        .orders
        .create_order(other.user, create(vec![item(q, 1, 10)]))
        .await
        .unwrap();

    let first = shop
        .orders
        .get_orders(shop.user, Paging::new(1, 2, ""))
        .await
        .unwrap();
    assert_eq!(first.paging.total, 3);
    assert_eq!(first.data.len(), 2);
    assert!(first.data[0].order.created_at >= first.data[1].order.created_at);
    assert!(first.data.iter().all(|d| d.order.user_id == shop.user));
    assert!(first.data.iter().all(|d| d.items.len() == 1));

    let second = shop
        .orders
        .get_orders(shop.user, Paging::new(2, 2, ""))
        .await
        .unwrap();
    assert_eq!(second.data.len(), 1);
    assert!(first.data[1].order.created_at >= second.data[0].order.created_at);

    // Archived orders stay listed
    shop.orders
        .cancel_order_by_id(shop.user, second.data[0].order.id)
        .await
        .unwrap();
    let all = shop
        .orders
        .get_orders(shop.user, Paging::new(0, 0, ""))
        .await
        .unwrap();
    assert_eq!(all.paging.page, 1);
    assert_eq!(all.paging.limit, 20);
    assert_eq!(all.paging.total, 3);
    assert_eq!(all.data.iter().filter(|d| d.order.is_archived).count(), 1);
}
