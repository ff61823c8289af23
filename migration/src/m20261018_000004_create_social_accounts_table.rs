use sea_orm_migration::prelude::*;

/// Creates the `social_accounts` table: external accounts task-doers work through.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum SocialAccounts {
    Table,
    Id,
    UserId,
    Platform,
    Username,
    ExternalId,
    AccessToken,
    IsActive,
    FollowsCount,
    LikesCount,
    ViewsCount,
    SubscriptionsCount,
    TasksCompleted,
    LastActivityAt,
    CreatedAt,
    UpdatedAt,
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
                    .table(SocialAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocialAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SocialAccounts::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(SocialAccounts::Platform)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::Username)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SocialAccounts::ExternalId).string_len(100).null())
                    .col(ColumnDef::new(SocialAccounts::AccessToken).text().null())
                    .col(
                        ColumnDef::new(SocialAccounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::FollowsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::LikesCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::ViewsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::SubscriptionsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::TasksCompleted)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::LastActivityAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_social_accounts_user_id")
                            .from(SocialAccounts::Table, SocialAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_social_accounts_user_platform_username")
                    .table(SocialAccounts::Table)
                    .col(SocialAccounts::UserId)
                    .col(SocialAccounts::Platform)
                    .col(SocialAccounts::Username)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocialAccounts::Table).to_owned())
            .await
    }
}
