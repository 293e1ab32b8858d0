use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // account_role: many-to-many
        manager
            .create_table(
                Table::create()
                    .table(AccountRole::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AccountRole::AccountId).integer().not_null())
                    .col(ColumnDef::new(AccountRole::RoleId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(AccountRole::AccountId)
                            .col(AccountRole::RoleId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_role_account")
                            .from(AccountRole::Table, AccountRole::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_role_role")
                            .from(AccountRole::Table, AccountRole::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // account_profile: one-to-one, unique on both sides
        manager
            .create_table(
                Table::create()
                    .table(AccountProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountProfile::AccountId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountProfile::ProfileId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_profile_account")
                            .from(AccountProfile::Table, AccountProfile::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_profile_profile")
                            .from(AccountProfile::Table, AccountProfile::ProfileId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountProfile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountRole::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccountRole {
    Table,
    AccountId,
    RoleId,
}

#[derive(Iden)]
enum AccountProfile {
    Table,
    AccountId,
    ProfileId,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}

#[derive(Iden)]
enum Role {
    Table,
    Id,
}
