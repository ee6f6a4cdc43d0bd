pub mod aggregate;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod store;
pub mod test_util;

pub use aggregate::{AggregationMode, AggregationService};
pub use config::Config;
pub use error::StoreError;
pub use routes::build_router;
pub use store::{CredentialStore, Database, RecordStore, SecretHasher};

use std::sync::Arc;

/// Shared application state.
///
/// Every store holds the same [`Database`] handle; the connection closes when
/// the last clone of the state is dropped.
pub struct AppState {
    pub config: Config,
    pub db: Arc<Database>,
    pub credentials: CredentialStore,
    pub records: RecordStore,
    pub aggregation: AggregationService,
}

impl AppState {
    /// Open the database named in `config` and wire the stores to it.
    ///
    /// Does not touch the schema; call [`bootstrap::run`] before serving.
    pub fn open(config: Config) -> Result<Self, StoreError> {
        let db = Arc::new(Database::open(&config.database.url)?);
        let credentials = CredentialStore::new(
            db.clone(),
            SecretHasher::new(config.security.hash_rounds),
        );
        let records = RecordStore::new(db.clone());
        let aggregation = AggregationService::new(
            db.clone(),
            credentials.clone(),
            records.clone(),
            config.aggregation.mode,
        );

        Ok(Self {
            config,
            db,
            credentials,
            records,
            aggregation,
        })
    }

    /// Run [`bootstrap::run`] against this state's stores.
    pub fn bootstrap(&self) -> Result<bool, StoreError> {
        bootstrap::run(&self.db, &self.credentials, &self.config.admin)
    }
}
