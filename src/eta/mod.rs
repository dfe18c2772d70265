//! Egyptian Tax Authority (ETA) submission protocol.
//!
//! Converts invoices into the Authority's document schema and submits,
//! polls and cancels them, either over HTTP ([`EtaClient`]) or through a
//! local simulation ([`DemoAuthority`]).
//!
//! # Example
//!
//! ```ignore
//! use egyvat::core::Config;
//! use egyvat::eta::connect;
//!
//! let config = Config::from_env()?;
//! let authority = connect(&config.eta)?;
//! let receipt = authority.submit(&invoice).await?;
//! println!("{}", receipt.status);
//! ```

mod authority;
mod client;
mod demo;
mod error;
pub mod ids;
mod wire;

use std::sync::Arc;

pub use authority::{
    Authority, AuthorityValidationError, DocumentStatus, StatusReport, SubmissionReceipt,
};
pub use client::EtaClient;
pub use demo::{DEMO_ERROR_CODE, DEMO_RESPONSE, DemoAuthority};
pub use error::EtaError;
pub use wire::{
    CANCEL_REASON, EtaDocument, EtaLine, StatusDocument, SubmissionResponse, TOKEN_SCOPE,
    parse_status_document, parse_submission_response,
};

use crate::core::EtaConfig;

/// Pick the Authority implementation the configuration asks for.
pub fn connect(config: &EtaConfig) -> Result<Arc<dyn Authority>, EtaError> {
    if config.is_demo() {
        tracing::info!("ETA demo mode active; submissions are simulated");
        Ok(Arc::new(DemoAuthority::from_config(config)?))
    } else {
        Ok(Arc::new(EtaClient::new(config)?))
    }
}
