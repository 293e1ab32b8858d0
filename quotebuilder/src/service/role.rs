use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;

use crate::entity::role;
use crate::error::ServiceResult;
use crate::repository;

/// Read-only access to effective-dated roles.
#[derive(Clone)]
pub struct RoleService {
    db: DatabaseConnection,
}

impl RoleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_all_effective(&self, at: NaiveDateTime) -> ServiceResult<Vec<role::Model>> {
        Ok(repository::role::find_all_effective(&self.db, at).await?)
    }

    pub async fn find_by_code_and_effective(
        &self,
        code: &str,
        at: NaiveDateTime,
    ) -> ServiceResult<Option<role::Model>> {
        Ok(repository::role::find_by_code_and_effective(&self.db, code, at).await?)
    }
}
