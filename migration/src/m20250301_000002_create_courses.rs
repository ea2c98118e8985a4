use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(string_len(Courses::Id, 36).primary_key())
                    .col(string(Courses::Title))
                    .col(text(Courses::Description))
                    .col(double(Courses::Price))
                    .col(integer(Courses::DurationWeeks))
                    .col(string(Courses::Level))
                    .col(string(Courses::Language))
                    .col(string_null(Courses::Image))
                    .col(string(Courses::InstructorName))
                    .col(string(Courses::InstructorTitle))
                    .col(text(Courses::InstructorBio))
                    .col(string(Courses::InstructorImage))
                    .col(string_null(Courses::SyllabusTitle))
                    .col(string_null(Courses::SyllabusFileUrl))
                    // day -> time slot
                    .col(json_null(Courses::Timetable))
                    .col(timestamp_with_time_zone(Courses::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Catalog listings are ordered newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_courses_created_at")
                    .table(Courses::Table)
                    .col(Courses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Title,
    Description,
    Price,
    DurationWeeks,
    Level,
    Language,
    Image,
    InstructorName,
    InstructorTitle,
    InstructorBio,
    InstructorImage,
    SyllabusTitle,
    SyllabusFileUrl,
    Timetable,
    CreatedAt,
}
