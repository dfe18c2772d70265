//! Persistence contract and the service tying intake, lifecycle and
//! storage together.

mod error;
mod service;
mod store;

pub use error::ServiceError;
pub use service::InvoiceService;
pub use store::{InvoiceStore, MemoryStore, StoreError};
