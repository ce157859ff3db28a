use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order lifecycle states. Only `created -> paid` is a legal transition;
/// `failed` and `cancelled` are representable for gateway parity but no
/// transition into them is implemented.
pub mod status {
    pub const CREATED: &str = "created";
    pub const PAID: &str = "paid";
    pub const FAILED: &str = "failed";
    pub const CANCELLED: &str = "cancelled";
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Gateway-issued order id, e.g. `order_abc`
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,

    #[validate(length(min = 1, max = 64, message = "Receipt must be between 1 and 64 characters"))]
    pub receipt: String,

    /// Amount in minor currency units (paise for INR)
    pub amount: i64,

    pub currency: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
