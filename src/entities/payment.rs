use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const PAID: &str = "paid";
    pub const FAILED: &str = "failed";
}

/// Fallback when the caller does not report a payment method.
pub const METHOD_UNKNOWN: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Gateway-issued payment id, e.g. `pay_xyz`
    #[sea_orm(primary_key, auto_increment = false)]
    pub payment_id: String,

    /// References orders.order_id; not a database constraint, orphans are
    /// kept for audit
    pub order_id: String,

    /// Hex HMAC digest exactly as received
    pub signature: String,

    pub method: String,
    pub status: String,

    /// Serialized originating request, retained for audit
    #[serde(skip_serializing)]
    pub raw_payload: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::OrderId"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
