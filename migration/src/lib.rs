pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_courses;
mod m20250302_000001_create_orders;
mod m20250302_000002_create_enrollments;
mod m20250305_000001_create_reviews;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_courses::Migration),
            Box::new(m20250302_000001_create_orders::Migration),
            Box::new(m20250302_000002_create_enrollments::Migration),
            Box::new(m20250305_000001_create_reviews::Migration),
        ]
    }
}
