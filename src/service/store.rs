use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::Invoice;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("invoice {0} not found")]
    NotFound(String),

    /// The stored version differs from the one the write was based on.
    #[error("invoice {number} version conflict: expected {expected}, found {found:?}")]
    Conflict {
        number: String,
        expected: u64,
        found: Option<u64>,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence keyed by invoice number.
///
/// `put` is a compare-and-swap on [`Invoice::version`]: it succeeds only
/// when the stored record has the same version (or, for version 0, when no
/// record exists), and returns the invoice with its version advanced.
/// This is what serializes concurrent actions on the same invoice.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn get(&self, number: &str) -> Result<Invoice, StoreError>;

    async fn put(&self, invoice: Invoice) -> Result<Invoice, StoreError>;
}

/// In-process store for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    invoices: RwLock<HashMap<String, Invoice>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.invoices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.invoices.read().await.is_empty()
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn get(&self, number: &str) -> Result<Invoice, StoreError> {
        self.invoices
            .read()
            .await
            .get(number)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(number.to_string()))
    }

    async fn put(&self, mut invoice: Invoice) -> Result<Invoice, StoreError> {
        let mut invoices = self.invoices.write().await;
        let found = invoices.get(&invoice.number).map(|stored| stored.version);
        let matches = match found {
            None => invoice.version == 0,
            Some(version) => version == invoice.version,
        };
        if !matches {
            return Err(StoreError::Conflict {
                number: invoice.number,
                expected: invoice.version,
                found,
            });
        }

        invoice.version += 1;
        invoices.insert(invoice.number.clone(), invoice.clone());
        Ok(invoice)
    }
}
