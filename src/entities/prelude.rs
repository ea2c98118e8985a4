//! `SeaORM` Entity prelude

pub use super::courses::Entity as Courses;
pub use super::enrollments::Entity as Enrollments;
pub use super::orders::Entity as Orders;
pub use super::reviews::Entity as Reviews;
pub use super::users::Entity as Users;
