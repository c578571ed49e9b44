//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::domain::Sale;

/// Operation name accepted by `POST /calculate`.
pub const TOTAL_SALES_OPERATION: &str = "total_sales";

/// Body of `POST /data`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleDto {
    pub product_id: String,
    pub store_id: String,
    pub quantity_sold: i64,
    pub sale_price: Decimal,
    /// RFC 3339 timestamp with offset.
    pub sale_date: String,
}

impl TryFrom<SaleDto> for Sale {
    type Error = ApiError;

    fn try_from(dto: SaleDto) -> Result<Self, Self::Error> {
        Ok(Sale {
            sale_date: parse_rfc3339(&dto.sale_date, "sale_date")?,
            product_id: dto.product_id,
            store_id: dto.store_id,
            quantity_sold: dto.quantity_sold,
            sale_price: dto.sale_price,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddSaleResponse {
    pub status: String,
}

/// Body of `POST /calculate`.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalSalesRequest {
    pub operation: String,
    pub store_id: String,
    pub start_date: String,
    pub end_date: String,
}

/// Parsed and checked `POST /calculate` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalSalesQuery {
    pub store_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TotalSalesRequest {
    pub fn parse(&self) -> Result<TotalSalesQuery, ApiError> {
        if self.operation != TOTAL_SALES_OPERATION {
            return Err(ApiError::BadRequest {
                code: "UNKNOWN_OPERATION",
                message: format!("unknown operation {:?}", self.operation),
            });
        }
        Ok(TotalSalesQuery {
            store_id: self.store_id.clone(),
            start: parse_rfc3339(&self.start_date, "start_date")?,
            end: parse_rfc3339(&self.end_date, "end_date")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalSalesResponse {
    pub store_id: String,
    pub total_sales: Decimal,
    pub start_date: String,
    pub end_date: String,
}

fn parse_rfc3339(value: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::validation(format!("{field} must be in RFC3339 format")))
}
