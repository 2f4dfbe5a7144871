//! Stock ledger
//!
//! `apply_quantity_delta` is a read-check-write on one product row. No row
//! lock is taken; concurrent writers are separated by the storage isolation
//! level only.

use shared::error::{AppError, ErrorCode};
use shared::models::Product;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{RepoError, UnitOfWork};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for product {product_id}: available {available}, change {delta}")]
    InsufficientStock {
        product_id: Uuid,
        available: i32,
        delta: i64,
    },

    /// Resulting stock does not fit the column type
    #[error("Stock overflow for product {0}")]
    Overflow(Uuid),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ProductNotFound(id) => AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {id} not found"),
            )
            .with_detail("productId", id.to_string()),
            LedgerError::InsufficientStock {
                product_id,
                available,
                delta,
            } => AppError::with_message(
                ErrorCode::InsufficientStock,
                format!("Insufficient stock for product {product_id}"),
            )
            .with_detail("productId", product_id.to_string())
            .with_detail("available", available)
            .with_detail("requested", -delta),
            LedgerError::Overflow(id) => {
                AppError::validation(format!("Stock for product {id} out of range"))
            }
            LedgerError::Repo(e) => e.into(),
        }
    }
}

/// Product stock accessor
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    pub fn new() -> Self {
        Self
    }

    /// Load a product by id
    pub async fn get_product(
        &self,
        uow: &mut dyn UnitOfWork,
        product_id: Uuid,
    ) -> Result<Product, LedgerError> {
        uow.find_product(product_id)
            .await?
            .ok_or(LedgerError::ProductNotFound(product_id))
    }

    /// Add `delta` to a product's stock and persist the result.
    ///
    /// Fails with [`LedgerError::InsufficientStock`] when the new level
    /// would be negative; nothing is written in that case.
    pub async fn apply_quantity_delta(
        &self,
        uow: &mut dyn UnitOfWork,
        product_id: Uuid,
        delta: i64,
    ) -> Result<Product, LedgerError> {
        let product = self.get_product(uow, product_id).await?;
        let next = product.quantity as i64 + delta;

        if next < 0 {
            return Err(LedgerError::InsufficientStock {
                product_id,
                available: product.quantity,
                delta,
            });
        }
        let next = i32::try_from(next).map_err(|_| LedgerError::Overflow(product_id))?;

        let updated = uow.set_product_quantity(product_id, next).await?;
        tracing::debug!(
            product_id = %product_id,
            before = product.quantity,
            after = updated.quantity,
            "Stock adjusted"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStorage, Storage};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::models::ProductStatus;

    async fn seeded(quantity: i32) -> (MemoryStorage, Uuid) {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Kettle".into(),
            price: Decimal::from(30),
            quantity,
            description: String::new(),
            status: ProductStatus::Active,
            is_archived: false,
            img_url: String::new(),
            created_at: now,
            updated_at: now,
        };
        let mut uow = storage.begin().await.unwrap();
        uow.insert_product(&product).await.unwrap();
        uow.commit().await.unwrap();
        (storage, product.id)
    }

    #[tokio::test]
    async fn test_apply_delta_persists() {
        let (storage, id) = seeded(5).await;
        let ledger = InventoryLedger::new();

        let mut uow = storage.begin().await.unwrap();
        let p = ledger
            .apply_quantity_delta(uow.as_mut(), id, -3)
            .await
            .unwrap();
        assert_eq!(p.quantity, 2);
        let p = ledger.apply_quantity_delta(uow.as_mut(), id, 4).await.unwrap();
        assert_eq!(p.quantity, 6);
        uow.commit().await.unwrap();

        let mut uow = storage.begin().await.unwrap();
        assert_eq!(ledger.get_product(uow.as_mut(), id).await.unwrap().quantity, 6);
    }

    #[tokio::test]
    async fn test_exact_depletion_allowed() {
        let (storage, id) = seeded(2).await;
        let ledger = InventoryLedger::new();

        let mut uow = storage.begin().await.unwrap();
        let p = ledger
            .apply_quantity_delta(uow.as_mut(), id, -2)
            .await
            .unwrap();
        assert_eq!(p.quantity, 0);
    }

    #[tokio::test]
    async fn test_negative_result_rejected() {
        let (storage, id) = seeded(2).await;
        let ledger = InventoryLedger::new();

        let mut uow = storage.begin().await.unwrap();
        let err = ledger
            .apply_quantity_delta(uow.as_mut(), id, -3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 2, delta: -3, .. }
        ));
        assert_eq!(ledger.get_product(uow.as_mut(), id).await.unwrap().quantity, 2);

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_missing_product() {
        let storage = MemoryStorage::new();
        let ledger = InventoryLedger::new();
        let mut uow = storage.begin().await.unwrap();

        let err = ledger
            .apply_quantity_delta(uow.as_mut(), Uuid::new_v4(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProductNotFound(_)));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::ProductNotFound);
    }
}
