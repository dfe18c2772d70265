//! Core invoice types, ETA validation rules, and numbering.
//!
//! This module provides the invoice entity graph with exact derived totals,
//! the Egyptian identifier checks, and the ETA-001..ETA-010 rule set.

mod builder;
mod config;
mod error;
mod gs1;
mod identifiers;
mod numbering;
mod types;
mod validation;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use gs1::map_to_gs1_code;
pub use identifiers::*;
pub use numbering::*;
pub use types::*;
pub use validation::*;
