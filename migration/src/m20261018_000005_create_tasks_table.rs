use sea_orm_migration::prelude::*;

/// Creates the `tasks` table: units of work carved out of processing orders.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    OrderId,
    AssigneeId,
    SocialAccountId,
    Platform,
    TaskType,
    TargetUrl,
    Reward,
    Status,
    Proof,
    RejectionReason,
    ClaimedAt,
    CompletedAt,
    ReviewedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SocialAccounts {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::OrderId).uuid().null())
                    .col(ColumnDef::new(Tasks::AssigneeId).uuid().null())
                    .col(ColumnDef::new(Tasks::SocialAccountId).uuid().null())
                    .col(ColumnDef::new(Tasks::Platform).string_len(20).not_null())
                    .col(ColumnDef::new(Tasks::TaskType).string_len(20).not_null())
                    .col(ColumnDef::new(Tasks::TargetUrl).text().not_null())
                    .col(ColumnDef::new(Tasks::Reward).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(20)
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(Tasks::Proof).text().null())
                    .col(ColumnDef::new(Tasks::RejectionReason).string_len(500).null())
                    .col(ColumnDef::new(Tasks::ClaimedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Tasks::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Tasks::ReviewedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_order_id")
                            .from(Tasks::Table, Tasks::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assignee_id")
                            .from(Tasks::Table, Tasks::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_social_account_id")
                            .from(Tasks::Table, Tasks::SocialAccountId)
                            .to(SocialAccounts::Table, SocialAccounts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_order_id_status")
                    .table(Tasks::Table)
                    .col(Tasks::OrderId)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}
