use sea_orm_migration::prelude::*;

/// Both seeded roles are effective from this instant with no expiry.
const SEED_EFFECTIVE_AT: &str = "'2015-01-01 00:00:00'";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Role::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Role::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Role::Label).string().not_null())
                    .col(
                        ColumnDef::new(Role::Ordinal)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Role::EffectiveAt).timestamp().not_null())
                    .col(ColumnDef::new(Role::ExpiresAt).timestamp().null())
                    .col(
                        ColumnDef::new(Role::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        let seed = Query::insert()
            .into_table(Role::Table)
            .columns([Role::Code, Role::Label, Role::Ordinal, Role::EffectiveAt])
            .values_panic([
                "ROLE_USER".into(),
                "User".into(),
                0.into(),
                Expr::cust(SEED_EFFECTIVE_AT),
            ])
            .values_panic([
                "ROLE_SYSADMIN".into(),
                "System Admin".into(),
                1.into(),
                Expr::cust(SEED_EFFECTIVE_AT),
            ])
            .to_owned();

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Role::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Role {
    Table,
    Id,
    Code,
    Label,
    Ordinal,
    EffectiveAt,
    ExpiresAt,
    CreatedAt,
}
