use sea_orm::entity::prelude::*;

/// An effective-dated authority. A role only counts while
/// `effective_at <= t < expires_at`; a missing `expires_at` never lapses.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub label: String,
    pub ordinal: i32,
    pub effective_at: DateTime,
    pub expires_at: Option<DateTime>,
    pub created_at: DateTime,
}

impl Model {
    pub fn is_effective_at(&self, at: DateTime) -> bool {
        self.effective_at <= at && self.expires_at.is_none_or(|end| at < end)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_role::Entity")]
    AccountRole,
}

impl Related<super::account_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountRole.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
