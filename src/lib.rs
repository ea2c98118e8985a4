// src/lib.rs

use sea_orm::DatabaseConnection;

use config::AppConfig;
use services::{
    enrollment_writer::EnrollmentWriter,
    gateway::{GatewayClient, GatewayError},
    order_ledger::OrderLedger,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: GatewayClient,
    pub ledger: OrderLedger,
    pub enrollments: EnrollmentWriter,
    pub auth: auth::Auth,
    pub currency: String,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Result<Self, GatewayError> {
        let gateway = GatewayClient::new(&config.gateway)?;
        let ledger = OrderLedger::new(db.clone());
        let enrollments = EnrollmentWriter::new(db.clone(), gateway.clone(), ledger.clone());

        Ok(Self {
            db,
            gateway,
            ledger,
            enrollments,
            auth: auth::Auth::from_config(&config.auth),
            currency: config.gateway.currency.clone(),
        })
    }
}

pub mod entities {
    pub mod prelude;
    pub mod courses;
    pub mod enrollments;
    pub mod orders;
    pub mod reviews;
    pub mod users;
}

pub mod services {
    pub mod gateway;
    pub mod order_ledger;
    pub mod enrollment_writer;
}

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;
