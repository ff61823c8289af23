use sea_orm_migration::prelude::*;

/// Creates the `disputes` table: complaints raised by a user about one of their orders.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Disputes {
    Table,
    Id,
    UserId,
    OrderId,
    Reason,
    Description,
    Status,
    Resolution,
    ResolvedBy,
    CreatedAt,
    UpdatedAt,
    ResolvedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Disputes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Disputes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Disputes::UserId).uuid().not_null())
                    .col(ColumnDef::new(Disputes::OrderId).uuid().not_null())
                    .col(ColumnDef::new(Disputes::Reason).string_len(100).not_null())
                    .col(ColumnDef::new(Disputes::Description).text().not_null())
                    .col(
                        ColumnDef::new(Disputes::Status)
                            .string_len(20)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Disputes::Resolution).text().null())
                    .col(ColumnDef::new(Disputes::ResolvedBy).uuid().null())
                    .col(
                        ColumnDef::new(Disputes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Disputes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Disputes::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disputes_user_id")
                            .from(Disputes::Table, Disputes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disputes_order_id")
                            .from(Disputes::Table, Disputes::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disputes_resolved_by")
                            .from(Disputes::Table, Disputes::ResolvedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Disputes::Table).to_owned())
            .await
    }
}
