use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod order_repository;
pub mod payment_repository;

pub use order_repository::{MarkPaidOutcome, NewOrder, OrderRepository};
pub use payment_repository::{NewPayment, PaymentRepository};

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
