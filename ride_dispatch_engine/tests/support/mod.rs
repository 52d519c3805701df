#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use log::info;
use rds_common::{Coordinate, Fare};
use ride_dispatch_engine::{
    db_types::{Chair, Owner, User},
    AccountApi,
    CoordinateBatcher,
    PaymentGateway,
    PaymentGatewayError,
    RideFlowApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn new_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/rds_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    if let Err(e) = Sqlite::drop_database(&url).await {
        info!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    sqlx::migrate!("./migrations").run(db.pool()).await.expect("Error running DB migrations");
    db
}

pub async fn register_user(db: &SqliteDatabase, username: &str) -> User {
    AccountApi::new(db.clone())
        .register_user(username, "Ada", "Lovelace", "1815-12-10", None)
        .await
        .expect("Error registering user")
}

pub async fn register_chair(db: &SqliteDatabase, name: &str) -> (Owner, Chair) {
    let accounts = AccountApi::new(db.clone());
    let owner = accounts.register_owner(&format!("owner-of-{name}")).await.expect("Error registering owner");
    let chair = accounts
        .register_chair(&owner.chair_register_token, name, "test-model")
        .await
        .expect("Error registering chair");
    (owner, chair)
}

/// Activates a chair and persists a position for it, making it a candidate for matching.
pub async fn place_chair(db: &SqliteDatabase, flow: &RideFlowApi<SqliteDatabase>, chair: &Chair, at: Coordinate) {
    AccountApi::new(db.clone()).set_chair_activity(chair, true).await.expect("Error activating chair");
    flow.update_coordinate(chair, at).await.expect("Error reporting coordinate");
    flow.flush_positions().await.expect("Error flushing positions");
}

pub fn ride_flow(db: &SqliteDatabase) -> RideFlowApi<SqliteDatabase> {
    RideFlowApi::new(db.clone(), CoordinateBatcher::new())
}

/// A payment collaborator that records every charge instead of talking to a gateway.
#[derive(Clone, Default)]
pub struct RecordingGateway {
    pub charges: Arc<Mutex<Vec<(String, String, Fare)>>>,
}

impl PaymentGateway for RecordingGateway {
    async fn charge(&self, gateway_url: &str, token: &str, amount: Fare) -> Result<(), PaymentGatewayError> {
        self.charges.lock().expect("poisoned").push((gateway_url.to_string(), token.to_string(), amount));
        Ok(())
    }
}

/// A payment collaborator that always reports a business failure.
#[derive(Clone, Default)]
pub struct RejectingGateway;

impl PaymentGateway for RejectingGateway {
    async fn charge(&self, _gateway_url: &str, _token: &str, _amount: Fare) -> Result<(), PaymentGatewayError> {
        Err(PaymentGatewayError::ChargeRejected("insufficient funds".to_string()))
    }
}
