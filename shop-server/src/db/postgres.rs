//! PostgreSQL storage
//!
//! Each unit of work is one sqlx transaction. The configured isolation level
//! is set as the first statement; serialization failures and deadlocks are
//! reported as [`RepoError::Conflict`] and are not retried here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{Order, OrderItem, Product};
use shared::paging::Paging;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{IsolationLevel, RepoError, RepoResult, Storage, UnitOfWork};

const PRODUCT_COLUMNS: &str = "id, user_id, name, price, quantity, description, status, \
     is_archived, img_url, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, discount, total_amount, remark, status, \
     payment_status, payment_method, delivery_status, shipping_address, tracking_number, \
     is_archived, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, purchased_name, purchased_price, quantity";

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row".into()),
            sqlx::Error::Database(db) => {
                let msg = match db.constraint() {
                    Some(constraint) => format!("{} ({constraint})", db.message()),
                    None => db.message().to_string(),
                };
                match db.code().as_deref() {
                    Some("23505") => RepoError::Duplicate(msg),
                    Some("23503" | "23514" | "23502" | "22P02" | "22003") => {
                        RepoError::Constraint(msg)
                    }
                    Some("40001" | "40P01") => RepoError::Conflict(msg),
                    _ => RepoError::Database(msg),
                }
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// PostgreSQL-backed [`Storage`]
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
    isolation: IsolationLevel,
}

impl PgStorage {
    /// Connect a pool to `url`
    pub async fn connect(
        url: &str,
        max_connections: u32,
        isolation: IsolationLevel,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        Ok(Self::from_pool(pool, isolation))
    }

    pub fn from_pool(pool: PgPool, isolation: IsolationLevel) -> Self {
        Self { pool, isolation }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(self.isolation.set_transaction_sql())
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgTx { tx }))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

// ── Row types ──

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    price: Decimal,
    quantity: i32,
    description: String,
    status: String,
    is_archived: bool,
    img_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            description: row.description,
            status: row.status.parse().map_err(corrupt)?,
            is_archived: row.is_archived,
            img_url: row.img_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    discount: Decimal,
    total_amount: Decimal,
    remark: String,
    status: String,
    payment_status: String,
    payment_method: String,
    delivery_status: String,
    shipping_address: String,
    tracking_number: String,
    is_archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            discount: row.discount,
            total_amount: row.total_amount,
            remark: row.remark,
            status: row.status.parse().map_err(corrupt)?,
            payment_status: row.payment_status.parse().map_err(corrupt)?,
            payment_method: row.payment_method.parse().map_err(corrupt)?,
            delivery_status: row.delivery_status.parse().map_err(corrupt)?,
            shipping_address: row.shipping_address,
            tracking_number: row.tracking_number,
            is_archived: row.is_archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    purchased_name: String,
    purchased_price: Decimal,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            purchased_name: row.purchased_name,
            purchased_price: row.purchased_price,
            quantity: row.quantity,
        }
    }
}

fn corrupt(err: shared::models::UnknownStatus) -> RepoError {
    RepoError::Database(format!("corrupt row: {err}"))
}

fn collect<R, T>(rows: Vec<R>) -> RepoResult<Vec<T>>
where
    T: TryFrom<R, Error = RepoError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl UnitOfWork for PgTx {
    async fn find_product(&mut self, id: Uuid) -> RepoResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        row.map(Product::try_from).transpose()
    }

    async fn insert_product(&mut self, p: &Product) -> RepoResult<Product> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(p.id)
        .bind(p.user_id)
        .bind(&p.name)
        .bind(p.price)
        .bind(p.quantity)
        .bind(&p.description)
        .bind(p.status.as_str())
        .bind(p.is_archived)
        .bind(&p.img_url)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn update_product(&mut self, p: &Product) -> RepoResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products
             SET name = $2, price = $3, quantity = $4, description = $5, status = $6,
                 is_archived = $7, img_url = $8, updated_at = $9
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(p.id)
        .bind(&p.name)
        .bind(p.price)
        .bind(p.quantity)
        .bind(&p.description)
        .bind(p.status.as_str())
        .bind(p.is_archived)
        .bind(&p.img_url)
        .bind(p.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.ok_or_else(|| RepoError::NotFound(format!("Product {}", p.id)))?
            .try_into()
    }

    async fn set_product_quantity(&mut self, id: Uuid, quantity: i32) -> RepoResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET quantity = $2, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.ok_or_else(|| RepoError::NotFound(format!("Product {id}")))?
            .try_into()
    }

    async fn list_products(
        &mut self,
        user_id: Uuid,
        paging: &Paging,
    ) -> RepoResult<(Vec<Product>, u64)> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE user_id = $1 AND strpos(name, $2) > 0
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(&paging.query)
        .bind(paging.limit as i64)
        .bind(paging.offset() as i64)
        .fetch_all(&mut *self.tx)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE user_id = $1 AND strpos(name, $2) > 0",
        )
        .bind(user_id)
        .bind(&paging.query)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok((collect(rows)?, total.max(0) as u64))
    }

    async fn insert_order(&mut self, o: &Order) -> RepoResult<Order> {
        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(o.id)
        .bind(o.user_id)
        .bind(o.discount)
        .bind(o.total_amount)
        .bind(&o.remark)
        .bind(o.status.as_str())
        .bind(o.payment_status.as_str())
        .bind(o.payment_method.as_str())
        .bind(o.delivery_status.as_str())
        .bind(&o.shipping_address)
        .bind(&o.tracking_number)
        .bind(o.is_archived)
        .bind(o.created_at)
        .bind(o.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn find_order(&mut self, id: Uuid) -> RepoResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        row.map(Order::try_from).transpose()
    }

    async fn update_order(&mut self, o: &Order) -> RepoResult<Order> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders
             SET discount = $2, total_amount = $3, remark = $4, status = $5,
                 payment_status = $6, payment_method = $7, delivery_status = $8,
                 shipping_address = $9, tracking_number = $10, is_archived = $11,
                 updated_at = $12
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(o.id)
        .bind(o.discount)
        .bind(o.total_amount)
        .bind(&o.remark)
        .bind(o.status.as_str())
        .bind(o.payment_status.as_str())
        .bind(o.payment_method.as_str())
        .bind(o.delivery_status.as_str())
        .bind(&o.shipping_address)
        .bind(&o.tracking_number)
        .bind(o.is_archived)
        .bind(o.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.ok_or_else(|| RepoError::NotFound(format!("Order {}", o.id)))?
            .try_into()
    }

    async fn list_orders(
        &mut self,
        user_id: Uuid,
        paging: &Paging,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(paging.limit as i64)
        .bind(paging.offset() as i64)
        .fetch_all(&mut *self.tx)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok((collect(rows)?, total.max(0) as u64))
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> RepoResult<Vec<OrderItem>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO order_items ({ORDER_ITEM_COLUMNS}) "));
        builder.push_values(items, |mut b, item| {
            b.push_bind(item.id)
                .push_bind(item.order_id)
                .push_bind(item.product_id)
                .push_bind(&item.purchased_name)
                .push_bind(item.purchased_price)
                .push_bind(item.quantity);
        });
        builder.push(format!(" RETURNING {ORDER_ITEM_COLUMNS}"));

        let rows: Vec<OrderItemRow> = builder
            .build_query_as()
            .fetch_all(&mut *self.tx)
            .await?;

        // RETURNING order is not guaranteed; hand back the batch in request order
        let mut inserted: Vec<OrderItem> = rows.into_iter().map(OrderItem::from).collect();
        inserted.sort_by_key(|row| items.iter().position(|i| i.id == row.id));
        Ok(inserted)
    }

    async fn find_order_item(&mut self, id: Uuid) -> RepoResult<Option<OrderItem>> {
        let row: Option<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(OrderItem::from))
    }

    async fn find_order_items(&mut self, order_id: Uuid) -> RepoResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY seq"
        ))
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn update_order_item(&mut self, item: &OrderItem) -> RepoResult<OrderItem> {
        let row: Option<OrderItemRow> = sqlx::query_as(&format!(
            "UPDATE order_items
             SET product_id = $2, purchased_name = $3, purchased_price = $4, quantity = $5
             WHERE id = $1
             RETURNING {ORDER_ITEM_COLUMNS}"
        ))
        .bind(item.id)
        .bind(item.product_id)
        .bind(&item.purchased_name)
        .bind(item.purchased_price)
        .bind(item.quantity)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(OrderItem::from)
            .ok_or_else(|| RepoError::NotFound(format!("Order item {}", item.id)))
    }

    async fn delete_order_item(&mut self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
