//! `SeaORM` Entity for orders table
//!
//! Keyed by the gateway-issued order id. `status` holds an
//! [`OrderStatus`](crate::models::order::OrderStatus) in its string form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    /// Smallest currency unit (paise)
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub course_id: String,
    pub user_id: String,
    #[sea_orm(unique)]
    pub payment_id: Option<String>,
    pub receipt: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
