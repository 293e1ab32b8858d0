use chrono::Utc;
use sea_orm::ActiveValue;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reference_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub version: i32,
    pub created_by: String,
    pub created_at: DateTime,
    pub updated_by: Option<String>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::account_profile::Entity")]
    AccountProfile,
}

impl Related<super::account_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountProfile.def()
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
