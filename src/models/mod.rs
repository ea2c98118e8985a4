pub mod auth;
pub mod common;
pub mod course;
pub mod enrollment;
pub mod order;
pub mod review;
