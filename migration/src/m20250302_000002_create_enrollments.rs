//! Migration to create the enrollments table
//!
//! The unique (user_id, course_id) index turns a concurrent double insert into
//! a detectable conflict instead of a silent duplicate.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(string_len(Enrollments::Id, 36).primary_key())
                    .col(string_len(Enrollments::UserId, 36))
                    .col(string_len(Enrollments::CourseId, 36))
                    .col(string(Enrollments::Email))
                    .col(string(Enrollments::CourseName))
                    .col(double(Enrollments::Price))
                    .col(string(Enrollments::CourseTitle))
                    .col(text(Enrollments::CourseDescription))
                    .col(string_null(Enrollments::CourseImage))
                    .col(integer(Enrollments::CourseDurationWeeks))
                    .col(string(Enrollments::CourseLevel))
                    .col(string_len(Enrollments::Status, 16))
                    .col(integer(Enrollments::Progress).default(0))
                    .col(string_null(Enrollments::OrderId))
                    .col(timestamp_with_time_zone(Enrollments::EnrolledAt))
                    .col(timestamp_with_time_zone_null(Enrollments::CompletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_user_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::UserId)
                    .col(Enrollments::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_course_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_status")
                    .table(Enrollments::Table)
                    .col(Enrollments::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    UserId,
    CourseId,
    Email,
    CourseName,
    Price,
    CourseTitle,
    CourseDescription,
    CourseImage,
    CourseDurationWeeks,
    CourseLevel,
    Status,
    Progress,
    OrderId,
    EnrolledAt,
    CompletedAt,
}
