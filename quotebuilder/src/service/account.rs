use chrono::{NaiveDateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Set, TransactionTrait};

use crate::auth::Auth;
use crate::cache::EntityCache;
use crate::context::RequestContext;
use crate::entity::{account, profile, role};
use crate::error::{ServiceError, ServiceResult};
use crate::repository;

use super::check_version;
use super::profile::ProfileDraft;

/// Roles granted to the seeded and CLI-created administrators.
pub const ADMIN_ROLES: [&str; 2] = ["ROLE_USER", "ROLE_SYSADMIN"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountCacheKey {
    Id(i32),
    Username(String),
}

/// An account with its linked roles and profile, as served to callers and
/// held in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDetails {
    pub account: account::Model,
    pub roles: Vec<role::Model>,
    pub profile: Option<profile::Model>,
}

impl AccountDetails {
    /// Codes of the linked roles that are effective at `at`.
    pub fn authorities_at(&self, at: NaiveDateTime) -> Vec<String> {
        self.roles
            .iter()
            .filter(|r| r.is_effective_at(at))
            .map(|r| r.code.clone())
            .collect()
    }
}

/// Input for account create and update. Flags left as `None` keep their
/// current value (or the default on create).
#[derive(Debug, Clone, Default)]
pub struct AccountDraft {
    pub id: Option<i32>,
    pub version: Option<i32>,
    pub username: String,
    /// Plaintext; hashed before it reaches the store.
    pub password: Option<String>,
    pub enabled: Option<bool>,
    pub credentials_expired: Option<bool>,
    pub expired: Option<bool>,
    pub locked: Option<bool>,
}

/// Account plus role codes and profile, written in one transaction.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub account: AccountDraft,
    pub roles: Option<Vec<String>>,
    pub profile: Option<ProfileDraft>,
}

#[derive(Clone)]
pub struct AccountService {
    db: DatabaseConnection,
    cache: EntityCache<AccountCacheKey, AccountDetails>,
    profiles: EntityCache<i32, profile::Model>,
}

impl AccountService {
    pub fn new(
        db: DatabaseConnection,
        cache: EntityCache<AccountCacheKey, AccountDetails>,
        profiles: EntityCache<i32, profile::Model>,
    ) -> Self {
        Self {
            db,
            cache,
            profiles,
        }
    }

    pub async fn find_by_username(&self, username: &str) -> ServiceResult<Option<AccountDetails>> {
        let key = AccountCacheKey::Username(username.to_owned());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Some(hit));
        }

        let Some(account) = repository::account::find_by_username(&self.db, username).await? else {
            return Ok(None);
        };
        let details = load_details(&self.db, account).await?;
        self.remember(&details);
        Ok(Some(details))
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<AccountDetails>> {
        let accounts = repository::account::find_all(&self.db).await?;
        let mut out = Vec::with_capacity(accounts.len());
        for account in accounts {
            out.push(load_details(&self.db, account).await?);
        }
        Ok(out)
    }

    pub async fn find_one(&self, id: i32) -> ServiceResult<Option<AccountDetails>> {
        if let Some(hit) = self.cache.get(&AccountCacheKey::Id(id)) {
            return Ok(Some(hit));
        }

        let Some(account) = repository::account::find_by_id(&self.db, id).await? else {
            return Ok(None);
        };
        let details = load_details(&self.db, account).await?;
        self.remember(&details);
        Ok(Some(details))
    }

    pub async fn count(&self) -> ServiceResult<u64> {
        Ok(repository::account::count(&self.db).await?)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: AccountDraft,
    ) -> ServiceResult<AccountDetails> {
        if let Some(id) = draft.id {
            tracing::error!(id, "refusing to create an account that already has an id");
            return Err(ServiceError::Conflict(
                "Account id must be empty on create".into(),
            ));
        }
        let active = new_account(draft)?;

        let txn = self.db.begin().await?;
        let account = repository::account::insert(&txn, active, ctx.actor())
            .await
            .map_err(|e| ServiceError::from_write(e, "Account username"))?;
        txn.commit().await?;

        tracing::info!(
            account_id = account.id,
            username = %account.username,
            actor = ctx.actor(),
            "account created"
        );

        let details = AccountDetails {
            account,
            roles: Vec::new(),
            profile: None,
        };
        self.remember(&details);
        Ok(details)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        draft: AccountDraft,
    ) -> ServiceResult<AccountDetails> {
        let id = draft
            .id
            .ok_or_else(|| ServiceError::not_found("Account", "<no id>"))?;
        require_username(&draft.username)?;
        let password = match draft.password.as_deref() {
            Some(p) if !p.is_empty() => Some(Auth::hash_password(p)?),
            _ => None,
        };

        let txn = self.db.begin().await?;
        let existing = repository::account::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account", id))?;
        check_version("Account", id, draft.version, existing.version)?;

        let previous = existing.clone();
        let mut active: account::ActiveModel = existing.into();
        active.username = Set(draft.username);
        if let Some(hash) = password {
            active.password = Set(hash);
        }
        if let Some(v) = draft.enabled {
            active.enabled = Set(v);
        }
        if let Some(v) = draft.credentials_expired {
            active.credentials_expired = Set(v);
        }
        if let Some(v) = draft.expired {
            active.expired = Set(v);
        }
        if let Some(v) = draft.locked {
            active.locked = Set(v);
        }

        let account = repository::account::update(&txn, active, ctx.actor())
            .await
            .map_err(|e| ServiceError::from_update(e, "Account", id, "Account username"))?;
        let details = load_details(&txn, account).await?;
        txn.commit().await?;

        self.forget(&previous);
        self.remember(&details);
        tracing::info!(
            account_id = id,
            version = details.account.version,
            actor = ctx.actor(),
            "account updated"
        );
        Ok(details)
    }

    /// Delete an account, its links and its owned profile. The account bound
    /// to `ctx` cannot delete itself.
    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        let existing = repository::account::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account", id))?;

        if ctx.is_account(existing.id) {
            tracing::error!(account_id = id, "an account cannot delete itself");
            return Err(ServiceError::NotPermitted(
                "The logged in account cannot be deleted".into(),
            ));
        }

        let owned = repository::account::find_profile(&txn, id).await?;
        repository::account::delete(&txn, existing.clone()).await?;
        if let Some(profile) = &owned {
            repository::profile::delete(&txn, profile.clone()).await?;
        }
        txn.commit().await?;

        self.forget(&existing);
        if let Some(profile) = owned {
            self.profiles.evict(&profile.id);
        }
        tracing::info!(account_id = id, actor = ctx.actor(), "account deleted");
        Ok(())
    }

    /// Create an account with roles (resolved by code, effective now) and an
    /// optional new profile.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        user: UserDraft,
    ) -> ServiceResult<AccountDetails> {
        if user.account.id.is_some() {
            tracing::error!("refusing to create a user whose account already has an id");
            return Err(ServiceError::Conflict(
                "Account id must be empty on create".into(),
            ));
        }
        reject_profile_id(user.profile.as_ref())?;
        let active = new_account(user.account)?;
        let now = Utc::now().naive_utc();

        let txn = self.db.begin().await?;
        let account = repository::account::insert(&txn, active, ctx.actor())
            .await
            .map_err(|e| ServiceError::from_write(e, "Account username"))?;

        if let Some(codes) = &user.roles {
            let role_ids = resolve_roles(&txn, codes, now).await?;
            repository::account::replace_roles(&txn, account.id, &role_ids).await?;
        }
        if let Some(draft) = user.profile {
            let profile = repository::profile::insert(&txn, draft.into_new(), ctx.actor()).await?;
            repository::account::link_profile(&txn, account.id, profile.id).await?;
        }

        let details = load_details(&txn, account).await?;
        txn.commit().await?;

        tracing::info!(
            account_id = details.account.id,
            username = %details.account.username,
            roles = details.roles.len(),
            actor = ctx.actor(),
            "user created"
        );
        self.remember(&details);
        Ok(details)
    }

    /// Replace the role set and/or attach a new profile on an existing
    /// account. A replaced profile is deleted.
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        user: UserDraft,
    ) -> ServiceResult<AccountDetails> {
        let id = user
            .account
            .id
            .ok_or_else(|| ServiceError::not_found("Account", "<no id>"))?;
        reject_profile_id(user.profile.as_ref())?;
        let now = Utc::now().naive_utc();

        let txn = self.db.begin().await?;
        let existing = repository::account::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account", id))?;
        check_version("Account", id, user.account.version, existing.version)?;

        if let Some(codes) = &user.roles {
            let role_ids = resolve_roles(&txn, codes, now).await?;
            repository::account::replace_roles(&txn, id, &role_ids).await?;
        }

        let mut replaced = None;
        if let Some(draft) = user.profile {
            replaced = repository::account::find_profile(&txn, id).await?;
            let profile = repository::profile::insert(&txn, draft.into_new(), ctx.actor()).await?;
            repository::account::link_profile(&txn, id, profile.id).await?;
            if let Some(old) = &replaced {
                repository::profile::delete(&txn, old.clone()).await?;
            }
        }

        // touch the account so version and audit columns record the change
        let account = repository::account::update(&txn, existing.into(), ctx.actor())
            .await
            .map_err(|e| ServiceError::from_update(e, "Account", id, "Account username"))?;
        let details = load_details(&txn, account).await?;
        txn.commit().await?;

        if let Some(old) = replaced {
            self.profiles.evict(&old.id);
        }
        self.remember(&details);
        tracing::info!(account_id = id, actor = ctx.actor(), "user updated");
        Ok(details)
    }

    /// Create the default administrator, holding every seeded role, when the
    /// store has no accounts yet. Returns `None` when accounts already exist.
    pub async fn seed_admin(
        &self,
        username: &str,
        password: &str,
    ) -> ServiceResult<Option<AccountDetails>> {
        if self.count().await? > 0 {
            return Ok(None);
        }

        tracing::warn!(username, "no accounts found, seeding default admin");
        let admin = self
            .create_user(
                &RequestContext::system(),
                UserDraft {
                    account: AccountDraft {
                        username: username.to_owned(),
                        password: Some(password.to_owned()),
                        ..Default::default()
                    },
                    roles: Some(ADMIN_ROLES.iter().map(|r| r.to_string()).collect()),
                    profile: None,
                },
            )
            .await?;
        Ok(Some(admin))
    }

    pub fn evict_cache(&self) {
        self.cache.clear();
        tracing::info!("account cache evicted");
    }

    fn remember(&self, details: &AccountDetails) {
        self.cache
            .put(AccountCacheKey::Id(details.account.id), details.clone());
        self.cache.put(
            AccountCacheKey::Username(details.account.username.clone()),
            details.clone(),
        );
    }

    fn forget(&self, account: &account::Model) {
        self.cache.evict(&AccountCacheKey::Id(account.id));
        self.cache
            .evict(&AccountCacheKey::Username(account.username.clone()));
    }
}

async fn load_details<C>(db: &C, account: account::Model) -> Result<AccountDetails, DbErr>
where
    C: ConnectionTrait,
{
    let roles = repository::account::find_roles(db, account.id).await?;
    let profile = repository::account::find_profile(db, account.id).await?;
    Ok(AccountDetails {
        account,
        roles,
        profile,
    })
}

async fn resolve_roles<C>(db: &C, codes: &[String], at: NaiveDateTime) -> ServiceResult<Vec<i32>>
where
    C: ConnectionTrait,
{
    let mut ids = Vec::with_capacity(codes.len());
    for code in codes {
        let role = repository::role::find_by_code_and_effective(db, code, at)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", code))?;
        if !ids.contains(&role.id) {
            ids.push(role.id);
        }
    }
    Ok(ids)
}

fn new_account(draft: AccountDraft) -> ServiceResult<account::ActiveModel> {
    require_username(&draft.username)?;
    let password = draft
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServiceError::Invalid("password is required".into()))?;

    Ok(account::ActiveModel {
        username: Set(draft.username),
        password: Set(Auth::hash_password(&password)?),
        enabled: Set(draft.enabled.unwrap_or(true)),
        credentials_expired: Set(draft.credentials_expired.unwrap_or(false)),
        expired: Set(draft.expired.unwrap_or(false)),
        locked: Set(draft.locked.unwrap_or(false)),
        updated_by: Set(None),
        ..Default::default()
    })
}

fn require_username(username: &str) -> ServiceResult<()> {
    if username.trim().is_empty() {
        return Err(ServiceError::Invalid("username is required".into()));
    }
    Ok(())
}

fn reject_profile_id(profile: Option<&ProfileDraft>) -> ServiceResult<()> {
    if profile.is_some_and(|p| p.id.is_some()) {
        return Err(ServiceError::Conflict(
            "Profile id must be empty on create".into(),
        ));
    }
    Ok(())
}
