use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use password_hash::SaltString;
use rand_core::OsRng;

use crate::error::{ServiceError, ServiceResult};
use crate::service::AccountService;

/// Why a login was refused. Every variant except [`AuthError::Internal`] is
/// reported to clients as the same rejected-credentials response.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username and password are required")]
    EmptyCredentials,
    #[error("Bad credentials")]
    BadCredentials,
    #[error("User not found")]
    UnknownUser,
    #[error("User not authorized")]
    NoRoles,
    #[error("User account is disabled")]
    Disabled,
    #[error("User account is locked")]
    Locked,
    #[error("User account has expired")]
    Expired,
    #[error("User credentials have expired")]
    CredentialsExpired,
    #[error("Authentication failed: {0}")]
    Internal(#[from] ServiceError),
}

/// Result of a successful login; the username is what request contexts carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: i32,
    pub username: String,
    /// Codes of the roles effective at login time.
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn has_authority(&self, code: &str) -> bool {
        self.authorities.iter().any(|a| a == code)
    }
}

pub struct Auth {
    accounts: AccountService,
}

impl Auth {
    pub fn new(accounts: AccountService) -> Self {
        Self { accounts }
    }

    /// Check a username/password pair against the account store.
    ///
    /// Lock, enable and expiry flags are checked before the password; the
    /// credentials-expired flag only after it matched.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::EmptyCredentials);
        }

        let details = self
            .accounts
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        let authorities = details.authorities_at(Utc::now().naive_utc());
        if authorities.is_empty() {
            return Err(AuthError::NoRoles);
        }

        let account = &details.account;
        if account.locked {
            return Err(AuthError::Locked);
        }
        if !account.enabled {
            return Err(AuthError::Disabled);
        }
        if account.expired {
            return Err(AuthError::Expired);
        }

        if !Self::verify_password(password, &account.password)? {
            return Err(AuthError::BadCredentials);
        }

        if account.credentials_expired {
            return Err(AuthError::CredentialsExpired);
        }

        tracing::debug!(username, authorities = ?authorities, "credentials accepted");
        Ok(Principal {
            account_id: account.id,
            username: account.username.clone(),
            authorities,
        })
    }

    /// Hash a plaintext password with Argon2id + a random salt.
    pub fn hash_password(password: &str) -> ServiceResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Hash(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify_password(password: &str, stored: &str) -> ServiceResult<bool> {
        let hash = PasswordHash::new(stored).map_err(|e| ServiceError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};
    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

    use crate::context::RequestContext;
    use crate::entity::role;
    use crate::repository;
    use crate::service::test_support::{draft, services, services_with_db};
    use crate::service::{AccountDraft, Services, UserDraft};

    async fn setup() -> (Services, Auth) {
        let services = services().await;
        let auth = Auth::new(services.accounts.clone());
        (services, auth)
    }

    async fn seed(services: &Services, account: AccountDraft, roles: &[&str]) {
        services
            .accounts
            .create_user(
                &RequestContext::system(),
                UserDraft {
                    account,
                    roles: Some(roles.iter().map(|r| r.to_string()).collect()),
                    profile: None,
                },
            )
            .await
            .unwrap();
    }

    async fn insert_role(
        db: &DatabaseConnection,
        code: &str,
        effective_at: NaiveDateTime,
        expires_at: Option<NaiveDateTime>,
    ) -> role::Model {
        role::ActiveModel {
            code: Set(code.to_string()),
            label: Set(code.to_string()),
            ordinal: Set(5),
            effective_at: Set(effective_at),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn lapse(db: &DatabaseConnection, role: role::Model) {
        let mut active: role::ActiveModel = role.into();
        active.expires_at = Set(Some(Utc::now().naive_utc() - Duration::days(1)));
        active.update(db).await.unwrap();
    }

    // --- hash_password ---

    #[test]
    fn test_hash_produces_argon2_format() {
        let hash = Auth::hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"), "Expected Argon2 PHC string, got: {}", hash);
    }

    #[test]
    fn test_hash_unique_per_call() {
        let h1 = Auth::hash_password("same").unwrap();
        let h2 = Auth::hash_password("same").unwrap();
        assert_ne!(h1, h2, "Same password hashed twice should produce different hashes");
    }

    #[test]
    fn test_verify_password() {
        let hash = Auth::hash_password("correct horse battery staple").unwrap();
        assert!(Auth::verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!Auth::verify_password("wrong", &hash).unwrap());
        assert!(Auth::verify_password("x", "not-a-phc-string").is_err());
    }

    // --- authenticate ---

    #[tokio::test]
    async fn test_authenticate_success() {
        let (services, auth) = setup().await;
        seed(&services, draft("qbAdmin", "QuoteBuilder@1"), &["ROLE_USER", "ROLE_SYSADMIN"]).await;

        let principal = auth.authenticate("qbAdmin", "QuoteBuilder@1").await.unwrap();
        assert_eq!(principal.username, "qbAdmin");
        assert!(principal.has_authority("ROLE_SYSADMIN"));
        assert!(principal.has_authority("ROLE_USER"));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let (services, auth) = setup().await;
        seed(&services, draft("qbUser", "qb@123"), &["ROLE_USER"]).await;

        let err = auth.authenticate("qbUser", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials), "got {err:?}");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (_services, auth) = setup().await;
        let err = auth.authenticate("ghost", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownUser), "got {err:?}");
    }

    #[tokio::test]
    async fn test_authenticate_empty_credentials() {
        let (_services, auth) = setup().await;
        let err = auth.authenticate("", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::EmptyCredentials), "got {err:?}");
    }

    #[tokio::test]
    async fn test_authenticate_without_roles() {
        let (services, auth) = setup().await;
        seed(&services, draft("loner", "pw"), &[]).await;

        let err = auth.authenticate("loner", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::NoRoles), "got {err:?}");
    }

    #[tokio::test]
    async fn test_authenticate_with_lapsed_role_only() {
        let (services, db) = services_with_db().await;
        let auth = Auth::new(services.accounts.clone());
        let now = Utc::now().naive_utc();
        let temp = insert_role(&db, "ROLE_TEMP", now - Duration::days(30), None).await;
        seed(&services, draft("temp", "pw"), &["ROLE_TEMP"]).await;
        assert!(auth.authenticate("temp", "pw").await.is_ok());

        lapse(&db, temp).await;
        services.accounts.evict_cache();

        let err = auth.authenticate("temp", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::NoRoles), "got {err:?}");
    }

    #[tokio::test]
    async fn test_lapsed_role_is_not_an_authority() {
        let (services, db) = services_with_db().await;
        let auth = Auth::new(services.accounts.clone());
        let now = Utc::now().naive_utc();
        let temp = insert_role(&db, "ROLE_TEMP", now - Duration::days(30), None).await;
        seed(&services, draft("mixed", "pw"), &["ROLE_USER", "ROLE_TEMP"]).await;

        lapse(&db, temp).await;
        services.accounts.evict_cache();

        let principal = auth.authenticate("mixed", "pw").await.unwrap();
        assert_eq!(principal.authorities, vec!["ROLE_USER".to_string()]);
        assert!(!principal.has_authority("ROLE_TEMP"));
    }

    #[tokio::test]
    async fn test_authenticate_with_future_role_only() {
        let (services, db) = services_with_db().await;
        let auth = Auth::new(services.accounts.clone());
        let now = Utc::now().naive_utc();
        let later = insert_role(&db, "ROLE_LATER", now + Duration::days(7), None).await;
        seed(&services, draft("early", "pw"), &[]).await;

        let account = repository::account::find_by_username(&db, "early")
            .await
            .unwrap()
            .unwrap();
        repository::account::replace_roles(&db, account.id, &[later.id])
            .await
            .unwrap();
        services.accounts.evict_cache();

        let details = services.accounts.find_by_username("early").await.unwrap().unwrap();
        assert_eq!(details.roles.len(), 1);
        let err = auth.authenticate("early", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::NoRoles), "got {err:?}");
    }

    #[tokio::test]
    async fn test_authenticate_flag_checks() {
        let (services, auth) = setup().await;
        let mut disabled = draft("disabled", "pw");
        disabled.enabled = Some(false);
        let mut locked = draft("locked", "pw");
        locked.locked = Some(true);
        let mut expired = draft("expired", "pw");
        expired.expired = Some(true);
        let mut stale = draft("stale", "pw");
        stale.credentials_expired = Some(true);
        for account in [disabled, locked, expired, stale] {
            seed(&services, account, &["ROLE_USER"]).await;
        }

        assert!(matches!(
            auth.authenticate("disabled", "pw").await.unwrap_err(),
            AuthError::Disabled
        ));
        assert!(matches!(
            auth.authenticate("locked", "pw").await.unwrap_err(),
            AuthError::Locked
        ));
        assert!(matches!(
            auth.authenticate("expired", "pw").await.unwrap_err(),
            AuthError::Expired
        ));
        assert!(matches!(
            auth.authenticate("stale", "pw").await.unwrap_err(),
            AuthError::CredentialsExpired
        ));
        // the credentials flag is only reported once the password matched
        assert!(matches!(
            auth.authenticate("stale", "wrong").await.unwrap_err(),
            AuthError::BadCredentials
        ));
    }
}
