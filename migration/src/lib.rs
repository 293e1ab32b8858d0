pub use sea_orm_migration::prelude::*;

mod m20261005_000001_create_roles;
mod m20261005_000002_create_accounts;
mod m20261005_000003_create_profiles;
mod m20261006_000004_create_account_links;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261005_000001_create_roles::Migration),
            Box::new(m20261005_000002_create_accounts::Migration),
            Box::new(m20261005_000003_create_profiles::Migration),
            Box::new(m20261006_000004_create_account_links::Migration),
        ]
    }
}
