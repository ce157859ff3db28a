use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;

use crate::entities::payment::{
    ActiveModel as PaymentActiveModel, Column, Entity as Payment, Model as PaymentModel,
};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};

/// Fields for a new payment row; the id comes from the gateway.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
    pub method: String,
    pub status: String,
    pub raw_payload: String,
}

/// Repository for payment rows
#[derive(Debug)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert a payment row unless one already exists for this payment id.
    ///
    /// The same payment is reported by both client-side verification and the
    /// webhook, in either order and possibly concurrently, so the duplicate
    /// case is a no-op rather than an error. Returns the stored row and
    /// whether this call inserted it.
    pub async fn insert_if_absent(
        &self,
        new: NewPayment,
    ) -> Result<(PaymentModel, bool), ServiceError> {
        let db = self.base.get_db();
        let payment_id = new.payment_id.clone();

        if let Some(existing) = self.find_by_id(&payment_id).await? {
            return Ok((existing, false));
        }

        let model = PaymentActiveModel {
            payment_id: Set(new.payment_id),
            order_id: Set(new.order_id),
            signature: Set(new.signature),
            method: Set(new.method),
            status: Set(new.status),
            raw_payload: Set(new.raw_payload),
            created_at: Set(Utc::now()),
        };

        // A concurrent insert between the lookup and here resolves to the
        // existing row instead of a unique-key failure.
        let inserted = Payment::insert(model)
            .on_conflict(
                OnConflict::column(Column::PaymentId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let stored = self.find_by_id(&payment_id).await?.ok_or_else(|| {
            ServiceError::db_error(format!("payment {payment_id} missing after insert"))
        })?;

        Ok((stored, inserted > 0))
    }

    /// Find a payment by its gateway-issued id
    pub async fn find_by_id(&self, payment_id: &str) -> Result<Option<PaymentModel>, ServiceError> {
        Ok(Payment::find_by_id(payment_id.to_string())
            .one(self.base.get_db())
            .await?)
    }
}
