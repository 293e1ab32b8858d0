//! Business operations over accounts, profiles and roles.
//!
//! Reads go straight to the pool and populate the caches; writes run in a
//! transaction and touch the caches only after commit.

use sea_orm::DatabaseConnection;

use crate::cache::EntityCache;
use crate::entity;
use crate::error::{ServiceError, ServiceResult};

pub mod account;
pub mod profile;
pub mod role;

pub use account::{ADMIN_ROLES, AccountCacheKey, AccountDetails, AccountDraft, AccountService, UserDraft};
pub use profile::{ProfileDraft, ProfileService};
pub use role::RoleService;

/// The service set shared by the API layer. Cloning is cheap: the connection
/// pool and the caches are reference counted.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub roles: RoleService,
}

impl Services {
    pub fn new(db: DatabaseConnection) -> Self {
        let account_cache = EntityCache::new("accounts");
        let profile_cache: EntityCache<i32, entity::profile::Model> = EntityCache::new("profiles");

        Self {
            accounts: AccountService::new(db.clone(), account_cache.clone(), profile_cache.clone()),
            profiles: ProfileService::new(db.clone(), profile_cache, account_cache),
            roles: RoleService::new(db),
        }
    }
}

/// Reject an update whose `version` no longer matches the stored row. A
/// missing version skips the check.
pub(crate) fn check_version(
    entity: &'static str,
    id: i32,
    supplied: Option<i32>,
    stored: i32,
) -> ServiceResult<()> {
    match supplied {
        Some(v) if v != stored => {
            tracing::warn!(entity, id, supplied = v, stored, "stale version on update");
            Err(ServiceError::Conflict(format!(
                "{entity} {id} was modified concurrently (version {v}, current {stored})"
            )))
        }
        _ => Ok(()),
    }
}
