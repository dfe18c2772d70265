//! # egyvat
//!
//! Egyptian VAT e-invoicing: ETA validation rules, the invoice lifecycle
//! state machine, and the Tax Authority submission client.
//!
//! All monetary values use [`rust_decimal::Decimal`] and are never rounded.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use egyvat::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new(generate_invoice_number("INV"), Utc::now())
//!     .supplier(Supplier::new("Test Company Ltd", "123456789", "Cairo", "4620"))
//!     .customer(Customer::consumer("Ahmed Hassan", "29001010100012"))
//!     .add_line(LineBuilder::new("Consulting", map_to_gs1_code("Consulting"), dec!(3), dec!(200))
//!         .discount_rate(dec!(10))
//!         .build())
//!     .build()
//!     .unwrap();
//!
//! assert!(validate_invoice(&invoice).is_empty());
//! assert_eq!(invoice.sub_total(), dec!(540));
//! assert_eq!(invoice.total_amount(), dec!(615.6));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, ETA validation, numbering, configuration |
//! | `eta` | Authority wire schema, HTTP client, demo simulator |
//! | `lifecycle` | Invoice lifecycle state machine |
//! | `intake` | Legacy and multi-line request adapters |
//! | `service` | Persistence contract and service glue |
//! | `telemetry` | `tracing-subscriber` setup |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "eta")]
pub mod eta;

#[cfg(feature = "lifecycle")]
pub mod lifecycle;

#[cfg(feature = "intake")]
pub mod intake;

#[cfg(feature = "service")]
pub mod service;

#[cfg(feature = "telemetry")]
pub mod telemetry;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
