use sea_orm::{DatabaseConnection, Set, TransactionTrait};

use crate::cache::EntityCache;
use crate::context::RequestContext;
use crate::entity::profile;
use crate::error::{ServiceError, ServiceResult};
use crate::repository;

use super::account::{AccountCacheKey, AccountDetails};
use super::check_version;

#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub id: Option<i32>,
    pub version: Option<i32>,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

impl ProfileDraft {
    pub(crate) fn into_new(self) -> profile::ActiveModel {
        profile::ActiveModel {
            name: Set(self.name),
            email: Set(self.email),
            mobile: Set(self.mobile),
            updated_by: Set(None),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct ProfileService {
    db: DatabaseConnection,
    cache: EntityCache<i32, profile::Model>,
    /// Account entries embed their profile, so profile writes drop them.
    accounts: EntityCache<AccountCacheKey, AccountDetails>,
}

impl ProfileService {
    pub fn new(
        db: DatabaseConnection,
        cache: EntityCache<i32, profile::Model>,
        accounts: EntityCache<AccountCacheKey, AccountDetails>,
    ) -> Self {
        Self {
            db,
            cache,
            accounts,
        }
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<profile::Model>> {
        Ok(repository::profile::find_all(&self.db).await?)
    }

    pub async fn find_one(&self, id: i32) -> ServiceResult<Option<profile::Model>> {
        if let Some(hit) = self.cache.get(&id) {
            return Ok(Some(hit));
        }
        let found = repository::profile::find_by_id(&self.db, id).await?;
        if let Some(profile) = &found {
            self.cache.put(id, profile.clone());
        }
        Ok(found)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: ProfileDraft,
    ) -> ServiceResult<profile::Model> {
        if let Some(id) = draft.id {
            tracing::error!(id, "refusing to create a profile that already has an id");
            return Err(ServiceError::Conflict(
                "Profile id must be empty on create".into(),
            ));
        }
        require_name(&draft.name)?;

        let txn = self.db.begin().await?;
        let profile = repository::profile::insert(&txn, draft.into_new(), ctx.actor()).await?;
        txn.commit().await?;

        tracing::info!(profile_id = profile.id, actor = ctx.actor(), "profile created");
        self.cache.put(profile.id, profile.clone());
        Ok(profile)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        draft: ProfileDraft,
    ) -> ServiceResult<profile::Model> {
        let id = draft
            .id
            .ok_or_else(|| ServiceError::not_found("Profile", "<no id>"))?;
        require_name(&draft.name)?;

        let txn = self.db.begin().await?;
        let existing = repository::profile::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", id))?;
        check_version("Profile", id, draft.version, existing.version)?;

        let mut active: profile::ActiveModel = existing.into();
        active.name = Set(draft.name);
        active.email = Set(draft.email);
        active.mobile = Set(draft.mobile);
        let profile = repository::profile::update(&txn, active, ctx.actor())
            .await
            .map_err(|e| ServiceError::from_update(e, "Profile", id, "Profile"))?;
        txn.commit().await?;

        tracing::info!(
            profile_id = id,
            version = profile.version,
            actor = ctx.actor(),
            "profile updated"
        );
        self.cache.put(id, profile.clone());
        self.accounts.clear();
        Ok(profile)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        let existing = repository::profile::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", id))?;
        repository::profile::delete(&txn, existing).await?;
        txn.commit().await?;

        tracing::info!(profile_id = id, actor = ctx.actor(), "profile deleted");
        self.cache.evict(&id);
        self.accounts.clear();
        Ok(())
    }

    pub fn evict_cache(&self) {
        self.cache.clear();
        tracing::info!("profile cache evicted");
    }
}

fn require_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::Invalid("profile name is required".into()));
    }
    Ok(())
}
