//! Durable payment orders, keyed by the gateway-issued order id.
//!
//! An order moves `created -> completed` or `created -> failed` exactly once.
//! Both transitions are conditional updates on `status = 'created'`, so two
//! concurrent callbacks cannot both settle the same order.

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr,
};

use crate::entities::{orders, prelude::*};
use crate::models::order::OrderStatus;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("order {0} already exists")]
    DuplicateOrderId(String),
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: String,
        to: OrderStatus,
    },
    #[error("payment {0} is already recorded against another order")]
    PaymentAlreadyUsed(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub course_id: String,
    pub user_id: String,
}

#[derive(Clone)]
pub struct OrderLedger {
    db: DatabaseConnection,
}

impl OrderLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn record_created_order(&self, order: NewOrder) -> Result<orders::Model, LedgerError> {
        if Orders::find_by_id(order.order_id.clone())
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateOrderId(order.order_id));
        }

        let now = Utc::now();
        let record = orders::ActiveModel {
            order_id: Set(order.order_id.clone()),
            amount: Set(order.amount),
            currency: Set(order.currency),
            status: Set(OrderStatus::Created.to_string()),
            course_id: Set(order.course_id),
            user_id: Set(order.user_id),
            payment_id: Set(None),
            receipt: Set(order.receipt),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = record.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                LedgerError::DuplicateOrderId(order.order_id.clone())
            }
            _ => LedgerError::Database(e),
        })?;

        tracing::info!(
            order_id = %inserted.order_id,
            amount = inserted.amount,
            course_id = %inserted.course_id,
            user_id = %inserted.user_id,
            "Order recorded"
        );
        Ok(inserted)
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<orders::Model>, LedgerError> {
        Ok(Orders::find_by_id(order_id.to_string()).one(&self.db).await?)
    }

    /// Settles the order as paid. Completing an already completed order is a
    /// no-op that returns the stored record.
    pub async fn mark_completed(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> Result<orders::Model, LedgerError> {
        self.settle(order_id, OrderStatus::Completed, Some(payment_id)).await
    }

    /// Settles the order as failed. Failing an already failed order is a no-op.
    pub async fn mark_failed(&self, order_id: &str) -> Result<orders::Model, LedgerError> {
        self.settle(order_id, OrderStatus::Failed, None).await
    }

    async fn settle(
        &self,
        order_id: &str,
        target: OrderStatus,
        payment_id: Option<&str>,
    ) -> Result<orders::Model, LedgerError> {
        let current = self
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.to_string()))?;

        if let Some(settled) = self.check_settled(current, target, payment_id)? {
            return Ok(settled);
        }

        let result = Orders::update_many()
            .col_expr(orders::Column::Status, Expr::value(target.as_str()))
            .col_expr(
                orders::Column::PaymentId,
                Expr::value(payment_id.map(str::to_string)),
            )
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::OrderId.eq(order_id))
            .filter(orders::Column::Status.eq(OrderStatus::Created.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    LedgerError::PaymentAlreadyUsed(payment_id.unwrap_or_default().to_string())
                }
                _ => LedgerError::Database(e),
            })?;

        let updated = self
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.to_string()))?;

        if result.rows_affected == 0 {
            // Another request settled it between our read and the update
            return self
                .check_settled(updated, target, payment_id)?
                .ok_or_else(|| LedgerError::OrderNotFound(order_id.to_string()));
        }

        tracing::info!(order_id = %order_id, status = %target, "Order settled");
        Ok(updated)
    }

    /// `Ok(Some)` when the order is already in `target`, `Ok(None)` when it
    /// is still `created`, and an error for any other state.
    fn check_settled(
        &self,
        order: orders::Model,
        target: OrderStatus,
        payment_id: Option<&str>,
    ) -> Result<Option<orders::Model>, LedgerError> {
        match order.status.parse::<OrderStatus>() {
            Ok(OrderStatus::Created) => Ok(None),
            Ok(status) if status == target => {
                if let (Some(requested), Some(stored)) = (payment_id, order.payment_id.as_deref()) {
                    if requested != stored {
                        tracing::warn!(
                            order_id = %order.order_id,
                            "Order already completed with a different payment id"
                        );
                    }
                }
                tracing::debug!(order_id = %order.order_id, status = %target, "Order already settled");
                Ok(Some(order))
            }
            _ => Err(LedgerError::InvalidTransition {
                order_id: order.order_id,
                from: order.status,
                to: target,
            }),
        }
    }
}
