//! Product catalogue module

pub mod service;

pub use service::ProductService;
