pub use sea_orm_migration::prelude::*;

mod m20261018_000001_create_users_table;
mod m20261018_000002_create_sessions_table;
mod m20261018_000003_create_orders_table;
mod m20261018_000004_create_social_accounts_table;
mod m20261018_000005_create_tasks_table;
mod m20261018_000006_create_transactions_table;
mod m20261018_000007_create_devices_table;
mod m20261018_000008_create_disputes_table;
mod m20261018_000009_create_order_statistics_table;
mod m20261018_000010_create_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261018_000001_create_users_table::Migration),
            Box::new(m20261018_000002_create_sessions_table::Migration),
            Box::new(m20261018_000003_create_orders_table::Migration),
            Box::new(m20261018_000004_create_social_accounts_table::Migration),
            Box::new(m20261018_000005_create_tasks_table::Migration),
            Box::new(m20261018_000006_create_transactions_table::Migration),
            Box::new(m20261018_000007_create_devices_table::Migration),
            Box::new(m20261018_000008_create_disputes_table::Migration),
            Box::new(m20261018_000009_create_order_statistics_table::Migration),
            Box::new(m20261018_000010_create_settings_table::Migration),
        ]
    }
}
