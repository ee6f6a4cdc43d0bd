//! Helpers for tests: a throwaway in-memory state with a cheap hash cost.

use std::sync::Arc;

use crate::config::{AdminConfig, Config, DatabaseConfig, SecurityConfig};
use crate::store::password::MIN_HASH_ROUNDS;
use crate::AppState;

pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "admin123";

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        admin: AdminConfig {
            username: TEST_ADMIN_USERNAME.to_string(),
            email: "admin@test.local".to_string(),
            password: TEST_ADMIN_PASSWORD.to_string(),
        },
        security: SecurityConfig {
            hash_rounds: MIN_HASH_ROUNDS,
        },
        ..Config::default()
    }
}

/// Bootstrapped state over a fresh in-memory database.
pub fn create_test_state() -> Arc<AppState> {
    create_test_state_with(test_config())
}

pub fn create_test_state_with(config: Config) -> Arc<AppState> {
    let state = AppState::open(config).expect("failed to open test database");
    state.bootstrap().expect("failed to bootstrap test database");
    Arc::new(state)
}
