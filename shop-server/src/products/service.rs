//! Product catalogue
//!
//! Single-row CRUD scoped to the owning user. Stock changes caused by
//! orders go through the inventory ledger instead.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Product, ProductCreate, ProductStatus, ProductUpdate};
use shared::paging::{Page, Paging};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{DynStorage, UnitOfWork, complete, now};
use crate::utils::validation::{validate_product_create, validate_product_update};

fn product_not_found(product_id: Uuid) -> AppError {
    AppError::with_message(
        ErrorCode::ProductNotFound,
        format!("Product {product_id} not found"),
    )
    .with_detail("productId", product_id.to_string())
}

#[derive(Clone)]
pub struct ProductService {
    storage: DynStorage,
}

impl ProductService {
    pub fn new(storage: DynStorage) -> Self {
        Self { storage }
    }

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_product(&self, user_id: Uuid, payload: ProductCreate) -> AppResult<Product> {
        validate_product_create(&payload)?;

        let now = now();
        let product = Product {
            id: Uuid::new_v4(),
            user_id,
            name: payload.name,
            price: payload.price,
            quantity: payload.quantity,
            description: payload.description,
            status: ProductStatus::Initiated,
            is_archived: false,
            img_url: payload.img_url,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.storage.begin().await?;
        let result = uow.insert_product(&product).await.map_err(AppError::from);
        let created = complete(uow, result).await?;

        tracing::info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_products(&self, user_id: Uuid, paging: Paging) -> AppResult<Page<Product>> {
        let mut uow = self.storage.begin().await?;
        let result = uow
            .list_products(user_id, &paging)
            .await
            .map_err(AppError::from);
        let (products, total) = complete(uow, result).await?;
        Ok(Page::new(products, paging.info(total)))
    }

    /// Public read, archived products included
    #[instrument(skip(self))]
    pub async fn get_product_by_id(&self, product_id: Uuid) -> AppResult<Product> {
        let mut uow = self.storage.begin().await?;
        let result = match uow.find_product(product_id).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(product_not_found(product_id)),
            Err(e) => Err(e.into()),
        };
        complete(uow, result).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_product_by_id(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        payload: ProductUpdate,
    ) -> AppResult<Product> {
        validate_product_update(&payload)?;

        let mut uow = self.storage.begin().await?;
        let result = update_in(uow.as_mut(), user_id, product_id, payload).await;
        complete(uow, result).await
    }

    /// Set the archived flag; archiving twice is a no-op rewrite
    #[instrument(skip(self))]
    pub async fn archive_product_by_id(&self, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let mut uow = self.storage.begin().await?;
        let result = archive_in(uow.as_mut(), user_id, product_id).await;
        let archived = complete(uow, result).await?;

        tracing::info!(product_id = %product_id, "Product archived");
        Ok(archived)
    }
}

async fn owned_product(
    uow: &mut dyn UnitOfWork,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<Product> {
    let product = uow
        .find_product(product_id)
        .await?
        .ok_or_else(|| product_not_found(product_id))?;
    if product.user_id != user_id {
        return Err(AppError::not_owner(format!("Product {product_id}")));
    }
    Ok(product)
}

async fn update_in(
    uow: &mut dyn UnitOfWork,
    user_id: Uuid,
    product_id: Uuid,
    payload: ProductUpdate,
) -> AppResult<Product> {
    let mut product = owned_product(uow, user_id, product_id).await?;
    product.name = payload.name;
    product.price = payload.price;
    product.quantity = payload.quantity;
    product.description = payload.description;
    product.status = payload.status;
    product.img_url = payload.img_url;
    product.updated_at = now();
    Ok(uow.update_product(&product).await?)
}

async fn archive_in(uow: &mut dyn UnitOfWork, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
    let mut product = owned_product(uow, user_id, product_id).await?;
    product.is_archived = true;
    product.updated_at = now();
    uow.update_product(&product).await?;
    Ok(true)
}
