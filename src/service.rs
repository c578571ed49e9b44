//! Sales service: validation in front of the storage layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::Sale;
use crate::storage::{LedgerError, SalesStorage};

/// Reasons a sale is refused, either up front or by its store's ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("store_id not defined")]
    MissingStoreId,

    #[error("product_id not defined")]
    MissingProductId,

    #[error("revenue of {quantity} x {price} does not fit in a decimal")]
    RevenueOverflow { quantity: i64, price: Decimal },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Entry point used by adapters to record and query sales.
#[derive(Clone)]
pub struct SalesService {
    storage: Arc<dyn SalesStorage>,
}

impl SalesService {
    pub fn new(storage: Arc<dyn SalesStorage>) -> Self {
        Self { storage }
    }

    /// Validate and record a sale.
    pub fn add_sale(&self, sale: Sale) -> Result<(), ValidationError> {
        if let Err(e) = validate(&sale) {
            warn!(
                store_id = %sale.store_id,
                product_id = %sale.product_id,
                error = %e,
                "rejected sale"
            );
            return Err(e);
        }
        self.storage.add_sale(sale).map_err(|e| {
            warn!(error = %e, "ledger refused sale");
            e.into()
        })
    }

    pub fn get_sales(&self) -> Vec<Sale> {
        self.storage.get_sales()
    }

    pub fn get_total_sum(
        &self,
        store_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Decimal {
        self.storage.get_total_sum(store_id, start, end)
    }
}

fn validate(sale: &Sale) -> Result<(), ValidationError> {
    if sale.store_id.is_empty() {
        return Err(ValidationError::MissingStoreId);
    }
    if sale.product_id.is_empty() {
        return Err(ValidationError::MissingProductId);
    }
    if sale.quantity_sold <= 0 {
        return Err(ValidationError::InvalidQuantity(sale.quantity_sold));
    }
    if sale.sale_price <= Decimal::ZERO {
        return Err(ValidationError::InvalidPrice(sale.sale_price));
    }
    if sale.checked_revenue().is_none() {
        return Err(ValidationError::RevenueOverflow {
            quantity: sale.quantity_sold,
            price: sale.sale_price,
        });
    }
    Ok(())
}
