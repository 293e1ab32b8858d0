use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{profile, role};
use crate::service::{AccountDetails, AccountDraft, ProfileDraft, UserDraft};

// ---------- requests ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    pub id: Option<i32>,
    pub version: Option<i32>,
    pub username: String,
    pub password: Option<String>,
    pub enabled: Option<bool>,
    pub credentials_expired: Option<bool>,
    pub expired: Option<bool>,
    pub locked: Option<bool>,
}

impl From<AccountRequest> for AccountDraft {
    fn from(r: AccountRequest) -> Self {
        Self {
            id: r.id,
            version: r.version,
            username: r.username,
            password: r.password,
            enabled: r.enabled,
            credentials_expired: r.credentials_expired,
            expired: r.expired,
            locked: r.locked,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub id: Option<i32>,
    pub version: Option<i32>,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

impl From<ProfileRequest> for ProfileDraft {
    fn from(r: ProfileRequest) -> Self {
        Self {
            id: r.id,
            version: r.version,
            name: r.name,
            email: r.email,
            mobile: r.mobile,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleRef {
    pub code: String,
}

/// Body of `createUser` / `updateUser`.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub account: AccountRequest,
    pub roles: Option<Vec<RoleRef>>,
    pub profile: Option<ProfileRequest>,
}

impl From<UserRequest> for UserDraft {
    fn from(r: UserRequest) -> Self {
        Self {
            account: r.account.into(),
            roles: r
                .roles
                .map(|roles| roles.into_iter().map(|role| role.code).collect()),
            profile: r.profile.map(ProfileDraft::from),
        }
    }
}

/// `application/x-www-form-urlencoded` body of the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub scope: Option<String>,
}

// ---------- responses ----------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub scope: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: i32,
    pub code: String,
    pub label: String,
    pub ordinal: i32,
    pub effective_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
}

impl From<role::Model> for RoleResponse {
    fn from(m: role::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            label: m.label,
            ordinal: m.ordinal,
            effective_at: m.effective_at,
            expires_at: m.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i32,
    pub reference_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub version: i32,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_by: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<profile::Model> for ProfileResponse {
    fn from(m: profile::Model) -> Self {
        Self {
            id: m.id,
            reference_id: m.reference_id,
            name: m.name,
            email: m.email,
            mobile: m.mobile,
            version: m.version,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_by: m.updated_by,
            updated_at: m.updated_at,
        }
    }
}

/// Account as exposed over HTTP. The password hash is never serialized.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i32,
    pub reference_id: Uuid,
    pub username: String,
    pub enabled: bool,
    pub credentials_expired: bool,
    pub expired: bool,
    pub locked: bool,
    pub version: i32,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_by: Option<String>,
    pub updated_at: NaiveDateTime,
    pub roles: Vec<RoleResponse>,
    pub profile: Option<ProfileResponse>,
}

impl From<AccountDetails> for AccountResponse {
    fn from(d: AccountDetails) -> Self {
        let a = d.account;
        Self {
            id: a.id,
            reference_id: a.reference_id,
            username: a.username,
            enabled: a.enabled,
            credentials_expired: a.credentials_expired,
            expired: a.expired,
            locked: a.locked,
            version: a.version,
            created_by: a.created_by,
            created_at: a.created_at,
            updated_by: a.updated_by,
            updated_at: a.updated_at,
            roles: d.roles.into_iter().map(RoleResponse::from).collect(),
            profile: d.profile.map(ProfileResponse::from),
        }
    }
}
