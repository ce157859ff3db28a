use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

use crate::entities::order::{
    self, status, ActiveModel as OrderActiveModel, Column, Entity as Order, Model as OrderModel,
};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};

/// Fields for a new order row; the id comes from the gateway.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub receipt: String,
    pub amount: i64,
    pub currency: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

/// Result of attempting the `created -> paid` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaidOutcome {
    /// The order moved to `paid`.
    Updated,
    /// The order was already `paid`; nothing changed.
    AlreadyPaid,
    /// No such order exists locally.
    NotFound,
}

/// Repository for order rows
#[derive(Debug)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert a new order with status `created`.
    ///
    /// Idempotent on `order_id`: re-inserting the same gateway order id is a
    /// no-op that returns the stored row, which makes the persistence retry
    /// after a successful gateway call safe.
    pub async fn insert(&self, new: NewOrder) -> Result<OrderModel, ServiceError> {
        let db = self.base.get_db();
        let order_id = new.order_id.clone();

        let model = OrderActiveModel {
            order_id: Set(new.order_id),
            receipt: Set(new.receipt),
            amount: Set(new.amount),
            currency: Set(new.currency),
            status: Set(status::CREATED.to_string()),
            customer_name: Set(new.customer_name),
            customer_email: Set(new.customer_email),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        Order::insert(model)
            .on_conflict(
                OnConflict::column(Column::OrderId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        self.find_by_id(&order_id).await?.ok_or_else(|| {
            ServiceError::db_error(format!("order {order_id} missing after insert"))
        })
    }

    /// Find an order by its gateway-issued id
    pub async fn find_by_id(&self, order_id: &str) -> Result<Option<OrderModel>, ServiceError> {
        Ok(Order::find_by_id(order_id.to_string())
            .one(self.base.get_db())
            .await?)
    }

    /// List orders, newest first, with the total row count
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderModel>, u64), ServiceError> {
        let paginator = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(self.base.get_db(), per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    /// Transition an order to `paid`.
    ///
    /// The update is conditional on the current status differing, so the
    /// transition never reverts and concurrent duplicate deliveries collapse
    /// to a single effective write.
    pub async fn mark_paid(&self, order_id: &str) -> Result<MarkPaidOutcome, ServiceError> {
        let db = self.base.get_db();

        let result = Order::update_many()
            .col_expr(Column::Status, Expr::value(status::PAID))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::OrderId.eq(order_id))
            .filter(Column::Status.ne(status::PAID))
            .exec(db)
            .await?;

        if result.rows_affected > 0 {
            return Ok(MarkPaidOutcome::Updated);
        }

        match self.find_by_id(order_id).await? {
            Some(_) => Ok(MarkPaidOutcome::AlreadyPaid),
            None => Ok(MarkPaidOutcome::NotFound),
        }
    }
}
