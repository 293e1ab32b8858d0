use chrono::NaiveDateTime;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::role;

/// Roles whose window contains `at`, by ordinal.
pub async fn find_all_effective<C>(db: &C, at: NaiveDateTime) -> Result<Vec<role::Model>, DbErr>
where
    C: ConnectionTrait,
{
    role::Entity::find()
        .filter(effective_at(at))
        .order_by_asc(role::Column::Ordinal)
        .all(db)
        .await
}

pub async fn find_by_code_and_effective<C>(
    db: &C,
    code: &str,
    at: NaiveDateTime,
) -> Result<Option<role::Model>, DbErr>
where
    C: ConnectionTrait,
{
    role::Entity::find()
        .filter(role::Column::Code.eq(code))
        .filter(effective_at(at))
        .one(db)
        .await
}

fn effective_at(at: NaiveDateTime) -> Condition {
    Condition::all()
        .add(role::Column::EffectiveAt.lte(at))
        .add(
            Condition::any()
                .add(role::Column::ExpiresAt.is_null())
                .add(role::Column::ExpiresAt.gt(at)),
        )
}
