//! Startup: schema creation and admin account seeding.

use crate::config::{AdminConfig, DEFAULT_ADMIN_PASSWORD};
use crate::error::StoreError;
use crate::store::{CredentialStore, Database};

/// Ensure the schema exists and the admin account is present.
///
/// Must run before the listener is bound. Returns whether the admin account
/// was created by this call.
pub fn run(
    db: &Database,
    credentials: &CredentialStore,
    admin: &AdminConfig,
) -> Result<bool, StoreError> {
    db.ensure_schema()?;

    let created = credentials.seed_admin(&admin.username, &admin.email, &admin.password)?;
    if created {
        tracing::info!("Admin account '{}' created", admin.username);
    } else {
        tracing::info!("Admin account '{}' already present", admin.username);
    }

    if admin.password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!("Admin account uses the default password; set RECORDVAULT__ADMIN__PASSWORD");
    }

    Ok(created)
}
