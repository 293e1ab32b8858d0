use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::{account_profile, current_version, profile};

pub async fn find_all<C>(db: &C) -> Result<Vec<profile::Model>, DbErr>
where
    C: ConnectionTrait,
{
    profile::Entity::find()
        .order_by_asc(profile::Column::Id)
        .all(db)
        .await
}

pub async fn find_by_id<C>(db: &C, id: i32) -> Result<Option<profile::Model>, DbErr>
where
    C: ConnectionTrait,
{
    profile::Entity::find_by_id(id).one(db).await
}

pub async fn insert<C>(
    db: &C,
    mut active: profile::ActiveModel,
    actor: &str,
) -> Result<profile::Model, DbErr>
where
    C: ConnectionTrait,
{
    active.created_by = Set(actor.to_owned());
    active.insert(db).await
}

/// Write `active` only if the row still holds the version it was loaded
/// with. A concurrent writer makes this fail with `DbErr::RecordNotUpdated`.
pub async fn update<C>(
    db: &C,
    mut active: profile::ActiveModel,
    actor: &str,
) -> Result<profile::Model, DbErr>
where
    C: ConnectionTrait,
{
    let loaded = current_version(&active.version);
    active.updated_by = Set(Some(actor.to_owned()));
    let active = active.before_save(db, false).await?;
    profile::Entity::update(active)
        .filter(profile::Column::Version.eq(loaded))
        .exec(db)
        .await
}

/// Delete a profile together with any account link pointing at it.
pub async fn delete<C>(db: &C, model: profile::Model) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    account_profile::Entity::delete_many()
        .filter(account_profile::Column::ProfileId.eq(model.id))
        .exec(db)
        .await?;
    model.delete(db).await?;
    Ok(())
}
