pub mod account;
pub mod account_profile;
pub mod account_role;
pub mod profile;
pub mod role;

use sea_orm::ActiveValue;

/// Version currently held by an active model, treating a never-loaded value as 0.
pub(crate) fn current_version(version: &ActiveValue<i32>) -> i32 {
    match version {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => *v,
        ActiveValue::NotSet => 0,
    }
}
