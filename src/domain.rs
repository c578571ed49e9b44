//! Sale record shared by every layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single sale of one product at one store.
///
/// Values are immutable once recorded. Quantity and price positivity is
/// enforced by [`crate::service::SalesService`], not by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub product_id: String,
    pub store_id: String,
    pub quantity_sold: i64,
    pub sale_price: Decimal,
    pub sale_date: DateTime<Utc>,
}

impl Sale {
    /// Revenue contributed by this sale: `quantity_sold * sale_price`.
    ///
    /// Panics if the product overflows `Decimal`; ingestion paths use
    /// [`Self::checked_revenue`].
    pub fn revenue(&self) -> Decimal {
        Decimal::from(self.quantity_sold) * self.sale_price
    }

    /// `quantity_sold * sale_price`, or `None` if it does not fit in a `Decimal`.
    pub fn checked_revenue(&self) -> Option<Decimal> {
        Decimal::from(self.quantity_sold).checked_mul(self.sale_price)
    }
}
