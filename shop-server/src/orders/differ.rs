//! Line item reconciliation
//!
//! Splits the stored items of an order and a requested item list into the
//! three disjoint sets an update has to apply. Items are matched on
//! `product_id` only; duplicate product ids in the request are rejected by
//! validation before this runs.

use shared::models::{OrderItem, OrderItemInput};

/// A stored item that is kept, with its requested replacement
#[derive(Debug, Clone, Copy)]
pub struct ItemUpdate<'a> {
    pub original: &'a OrderItem,
    pub requested: &'a OrderItemInput,
}

impl ItemUpdate<'_> {
    /// Additional units taken from stock (negative gives units back)
    pub fn delta(&self) -> i64 {
        self.requested.quantity as i64 - self.original.quantity as i64
    }
}

#[derive(Debug, Default)]
pub struct ItemDiff<'a> {
    /// Stored items whose product is no longer requested
    pub to_delete: Vec<&'a OrderItem>,
    /// Stored items whose product is still requested
    pub to_update: Vec<ItemUpdate<'a>>,
    /// Requested products the order does not contain yet
    pub to_create: Vec<&'a OrderItemInput>,
}

/// Diff stored items against the requested set.
///
/// Each output list keeps the order of the list it was taken from.
pub fn diff_items<'a>(original: &'a [OrderItem], requested: &'a [OrderItemInput]) -> ItemDiff<'a> {
    let mut diff = ItemDiff::default();

    for item in original {
        match requested.iter().find(|r| r.product_id == item.product_id) {
            Some(req) => diff.to_update.push(ItemUpdate {
                original: item,
                requested: req,
            }),
            None => diff.to_delete.push(item),
        }
    }

    diff.to_create = requested
        .iter()
        .filter(|r| !original.iter().any(|o| o.product_id == r.product_id))
        .collect();

    diff
}
