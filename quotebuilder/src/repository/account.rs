use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    JoinType, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set,
};

use crate::entity::{account, account_profile, account_role, current_version, profile, role};

pub async fn find_all<C>(db: &C) -> Result<Vec<account::Model>, DbErr>
where
    C: ConnectionTrait,
{
    account::Entity::find()
        .order_by_asc(account::Column::Id)
        .all(db)
        .await
}

pub async fn count<C>(db: &C) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    account::Entity::find().count(db).await
}

pub async fn find_by_id<C>(db: &C, id: i32) -> Result<Option<account::Model>, DbErr>
where
    C: ConnectionTrait,
{
    account::Entity::find_by_id(id).one(db).await
}

pub async fn find_by_username<C>(db: &C, username: &str) -> Result<Option<account::Model>, DbErr>
where
    C: ConnectionTrait,
{
    account::Entity::find()
        .filter(account::Column::Username.eq(username))
        .one(db)
        .await
}

pub async fn insert<C>(
    db: &C,
    mut active: account::ActiveModel,
    actor: &str,
) -> Result<account::Model, DbErr>
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
    mut active: account::ActiveModel,
    actor: &str,
) -> Result<account::Model, DbErr>
where
    C: ConnectionTrait,
{
    let loaded = current_version(&active.version);
    active.updated_by = Set(Some(actor.to_owned()));
    let active = active.before_save(db, false).await?;
    account::Entity::update(active)
        .filter(account::Column::Version.eq(loaded))
        .exec(db)
        .await
}

/// Delete an account and its role/profile links. The linked profile row
/// itself is left to the caller.
pub async fn delete<C>(db: &C, model: account::Model) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    account_role::Entity::delete_many()
        .filter(account_role::Column::AccountId.eq(model.id))
        .exec(db)
        .await?;
    account_profile::Entity::delete_many()
        .filter(account_profile::Column::AccountId.eq(model.id))
        .exec(db)
        .await?;
    model.delete(db).await?;
    Ok(())
}

/// All roles linked to the account, effective or not, by ordinal.
pub async fn find_roles<C>(db: &C, account_id: i32) -> Result<Vec<role::Model>, DbErr>
where
    C: ConnectionTrait,
{
    role::Entity::find()
        .join(JoinType::InnerJoin, role::Relation::AccountRole.def())
        .filter(account_role::Column::AccountId.eq(account_id))
        .order_by_asc(role::Column::Ordinal)
        .all(db)
        .await
}

/// Replace the account's role set with `role_ids`.
pub async fn replace_roles<C>(db: &C, account_id: i32, role_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    account_role::Entity::delete_many()
        .filter(account_role::Column::AccountId.eq(account_id))
        .exec(db)
        .await?;

    for role_id in role_ids {
        account_role::ActiveModel {
            account_id: Set(account_id),
            role_id: Set(*role_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

pub async fn find_profile<C>(db: &C, account_id: i32) -> Result<Option<profile::Model>, DbErr>
where
    C: ConnectionTrait,
{
    profile::Entity::find()
        .join(JoinType::InnerJoin, profile::Relation::AccountProfile.def())
        .filter(account_profile::Column::AccountId.eq(account_id))
        .one(db)
        .await
}

/// Point the account at `profile_id`, replacing any previous link.
pub async fn link_profile<C>(db: &C, account_id: i32, profile_id: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    account_profile::Entity::delete_many()
        .filter(account_profile::Column::AccountId.eq(account_id))
        .exec(db)
        .await?;

    account_profile::ActiveModel {
        account_id: Set(account_id),
        profile_id: Set(profile_id),
    }
    .insert(db)
    .await?;
    Ok(())
}
