use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FinanceStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

/// Fulfilment track. Only ever moves forward, one stage at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SupplierStatus {
    Pending,
    Preparing,
    #[strum(serialize = "In transit")]
    InTransit,
    Delivered,
    Received,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    Pending,
    Received,
}

/// The three independent status tracks of one purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RequestStatus {
    pub finance_status: FinanceStatus,
    pub supplier_status: SupplierStatus,
    pub inventory_status: InventoryStatus,
}

impl RequestStatus {
    pub fn new() -> Self {
        Self {
            finance_status: FinanceStatus::Pending,
            supplier_status: SupplierStatus::Pending,
            inventory_status: InventoryStatus::Pending,
        }
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PurchaseRequest {
    pub id: u64,
    pub requester_id: u64,
    #[schema(example = "Operations")]
    pub department: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    #[schema(value_type = String, example = "1250.00")]
    pub total: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PurchaseItem {
    pub item_id: u64,
    #[schema(example = "Flashlight")]
    pub item_name: String,
    pub quantity: u32,
    #[schema(value_type = String, example = "250.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "1250.00")]
    pub line_total: Decimal,
}
