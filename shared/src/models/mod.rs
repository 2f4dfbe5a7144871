//! Domain models and request payloads

pub mod order;
pub mod product;
pub mod status;

pub use order::{Order, OrderCreate, OrderDetail, OrderItem, OrderItemInput, OrderUpdate};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use status::{
    DeliveryStatus, OrderStatus, PaymentMethod, PaymentStatus, ProductStatus, UnknownStatus,
};
