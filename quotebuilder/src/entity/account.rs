use chrono::Utc;
use sea_orm::ActiveValue;
use sea_orm::entity::prelude::*;

/// Security credentials and authentication flags that permit access to the API.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reference_id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub enabled: bool,
    pub credentials_expired: bool,
    pub expired: bool,
    pub locked: bool,
    pub version: i32,
    pub created_by: String,
    pub created_at: DateTime,
    pub updated_by: Option<String>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_role::Entity")]
    AccountRole,
    #[sea_orm(has_one = "super::account_profile::Entity")]
    AccountProfile,
}

impl Related<super::account_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountRole.def()
    }
}

impl Related<super::account_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountProfile.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        super::account_role::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::account_role::Relation::Account.def().rev())
    }
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        super::account_profile::Relation::Profile.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::account_profile::Relation::Account.def().rev())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now().naive_utc();
        if insert {
            if self.reference_id.is_not_set() {
                self.reference_id = ActiveValue::Set(Uuid::new_v4());
            }
            self.version = ActiveValue::Set(0);
            self.created_at = ActiveValue::Set(now);
        } else {
            self.version = ActiveValue::Set(super::current_version(&self.version) + 1);
        }
        self.updated_at = ActiveValue::Set(now);
        Ok(self)
    }
}
