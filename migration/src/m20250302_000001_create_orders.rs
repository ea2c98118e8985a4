//! Migration to create the orders table (payment gateway orders)
//!
//! Orders are never deleted; they are the financial audit trail.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(string(Orders::OrderId).primary_key())
                    .col(big_integer(Orders::Amount))
                    .col(string_len(Orders::Currency, 8))
                    .col(string_len(Orders::Status, 16))
                    .col(string_len(Orders::CourseId, 36))
                    .col(string_len(Orders::UserId, 36))
                    .col(string_null(Orders::PaymentId))
                    .col(string(Orders::Receipt))
                    .col(timestamp_with_time_zone(Orders::CreatedAt))
                    .col(timestamp_with_time_zone(Orders::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // A gateway payment id can settle at most one order
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_payment_id")
                    .table(Orders::Table)
                    .col(Orders::PaymentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_course_id")
                    .table(Orders::Table)
                    .col(Orders::CourseId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    OrderId,
    Amount,
    Currency,
    Status,
    CourseId,
    UserId,
    PaymentId,
    Receipt,
    CreatedAt,
    UpdatedAt,
}
