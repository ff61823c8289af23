use sea_orm_migration::prelude::*;

/// Creates the `order_statistics` rollup table, unique per (user, platform, timeframe).
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum OrderStatistics {
    Table,
    Id,
    UserId,
    Platform,
    Timeframe,
    TotalOrders,
    CompletedOrders,
    CancelledOrders,
    TotalSpent,
    TotalQuantity,
    DeliveredQuantity,
    CalculatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderStatistics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderStatistics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderStatistics::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(OrderStatistics::Platform)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::Timeframe)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::TotalOrders)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::CompletedOrders)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::CancelledOrders)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::TotalSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::TotalQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::DeliveredQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderStatistics::CalculatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_statistics_user_id")
                            .from(OrderStatistics::Table, OrderStatistics::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_order_statistics_user_platform_timeframe")
                    .table(OrderStatistics::Table)
                    .col(OrderStatistics::UserId)
                    .col(OrderStatistics::Platform)
                    .col(OrderStatistics::Timeframe)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderStatistics::Table).to_owned())
            .await
    }
}
