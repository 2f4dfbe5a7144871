//! Input validation helpers
//!
//! Payload rules checked before any unit of work is opened. Text lengths
//! are counted in characters, matching the column limits in the schema.

use std::collections::HashSet;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{OrderCreate, OrderItemInput, OrderUpdate, ProductCreate, ProductUpdate};
use uuid::Uuid;

// ── Text length limits ──────────────────────────────────────────────

pub const MIN_NAME_LEN: usize = 2;

/// Product names and purchased-name snapshots
pub const MAX_NAME_LEN: usize = 128;

/// Order remarks
pub const MAX_REMARK_LEN: usize = 255;

pub const MAX_ADDRESS_LEN: usize = 255;

pub const MAX_TRACKING_NUMBER_LEN: usize = 128;

pub const MAX_DESCRIPTION_LEN: usize = 512;

pub const MAX_URL_LEN: usize = 512;

// ── Numeric limits ──────────────────────────────────────────────────

/// Lowest accepted unit price
pub const MIN_PRICE: Decimal = Decimal::ONE;

/// Discount multiplier range, inclusive
pub const MIN_DISCOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
pub const MAX_DISCOUNT: Decimal = Decimal::ONE;

// ── Generic helpers ─────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length bounds.
pub fn validate_required_text(
    value: &str,
    field: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len < min_len {
        return Err(AppError::validation(format!(
            "{field} is too short ({len} chars, min {min_len})"
        )));
    }
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

/// Validate that an optional string is within the length limit.
pub fn validate_optional_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

/// Parse a path identifier
pub fn parse_id(value: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        AppError::with_message(ErrorCode::InvalidFormat, format!("{field} is not a valid id"))
            .with_detail("field", field)
    })
}

fn validate_price(value: Decimal, field: &str) -> Result<(), AppError> {
    if value < MIN_PRICE {
        return Err(AppError::validation(format!(
            "{field} must be at least {MIN_PRICE}"
        )));
    }
    Ok(())
}

fn validate_discount(value: Decimal) -> Result<(), AppError> {
    if value < MIN_DISCOUNT || value > MAX_DISCOUNT {
        return Err(AppError::validation(format!(
            "discount must be between {MIN_DISCOUNT} and {MAX_DISCOUNT}"
        )));
    }
    Ok(())
}

fn validate_total(value: Decimal) -> Result<(), AppError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation("totalAmount must not be negative"));
    }
    Ok(())
}

// ── Orders ──────────────────────────────────────────────────────────

/// Validate one requested line item
pub fn validate_order_item(item: &OrderItemInput) -> Result<(), AppError> {
    if item.product_id.is_nil() {
        return Err(AppError::validation("productId must not be empty"));
    }
    validate_required_text(
        &item.purchased_name,
        "purchasedName",
        MIN_NAME_LEN,
        MAX_NAME_LEN,
    )?;
    validate_price(item.purchased_price, "purchasedPrice")?;
    if item.quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }
    Ok(())
}

/// Items must be individually valid and reference each product once
fn validate_items(items: &[OrderItemInput]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        validate_order_item(item)?;
        if !seen.insert(item.product_id) {
            return Err(AppError::new(ErrorCode::OrderItemDuplicate)
                .with_detail("productId", item.product_id.to_string()));
        }
    }
    Ok(())
}

pub fn validate_order_create(payload: &OrderCreate) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    validate_items(&payload.items)?;
    validate_optional_text(&payload.remark, "remark", MAX_REMARK_LEN)?;
    validate_discount(payload.discount)?;
    validate_total(payload.total_amount)?;
    validate_required_text(
        &payload.shipping_address,
        "shippingAddress",
        1,
        MAX_ADDRESS_LEN,
    )?;
    Ok(())
}

/// An empty item list is accepted and removes every line item
pub fn validate_order_update(payload: &OrderUpdate) -> Result<(), AppError> {
    validate_items(&payload.items)?;
    validate_optional_text(&payload.remark, "remark", MAX_REMARK_LEN)?;
    validate_discount(payload.discount)?;
    validate_total(payload.total_amount)?;
    validate_required_text(
        &payload.shipping_address,
        "shippingAddress",
        1,
        MAX_ADDRESS_LEN,
    )?;
    validate_required_text(
        &payload.tracking_number,
        "trackingNumber",
        1,
        MAX_TRACKING_NUMBER_LEN,
    )?;
    Ok(())
}

// ── Products ────────────────────────────────────────────────────────

fn validate_product_fields(
    name: &str,
    price: Decimal,
    quantity: i32,
    description: &str,
    img_url: &str,
) -> Result<(), AppError> {
    validate_required_text(name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;
    validate_price(price, "price")?;
    if quantity < 0 {
        return Err(AppError::validation("quantity must not be negative"));
    }
    validate_optional_text(description, "description", MAX_DESCRIPTION_LEN)?;
    validate_optional_text(img_url, "imgUrl", MAX_URL_LEN)?;
    Ok(())
}

pub fn validate_product_create(payload: &ProductCreate) -> Result<(), AppError> {
    validate_product_fields(
        &payload.name,
        payload.price,
        payload.quantity,
        &payload.description,
        &payload.img_url,
    )
}

pub fn validate_product_update(payload: &ProductUpdate) -> Result<(), AppError> {
    validate_product_fields(
        &payload.name,
        payload.price,
        payload.quantity,
        &payload.description,
        &payload.img_url,
    )
}
