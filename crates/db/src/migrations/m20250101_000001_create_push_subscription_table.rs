//! Create push_subscription table for Web Push subscriptions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PushSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PushSubscription::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PushSubscription::UserId).string().not_null())
                    .col(ColumnDef::new(PushSubscription::Endpoint).text().not_null())
                    .col(ColumnDef::new(PushSubscription::P256dh).string().not_null())
                    .col(ColumnDef::new(PushSubscription::Auth).string().not_null())
                    .col(ColumnDef::new(PushSubscription::Topics).json().not_null())
                    .col(
                        ColumnDef::new(PushSubscription::ExpirationTime)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(PushSubscription::UserAgent).string().null())
                    .col(
                        ColumnDef::new(PushSubscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PushSubscription::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index on user_id for listing a user's devices
        manager
            .create_index(
                Index::create()
                    .name("idx_push_subscription_user_id")
                    .table(PushSubscription::Table)
                    .col(PushSubscription::UserId)
                    .to_owned(),
            )
            .await?;

        // One row per device endpoint
        manager
            .create_index(
                Index::create()
                    .name("idx_push_subscription_endpoint")
                    .table(PushSubscription::Table)
                    .col(PushSubscription::Endpoint)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PushSubscription::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum PushSubscription {
    Table,
    Id,
    UserId,
    Endpoint,
    P256dh,
    Auth,
    Topics,
    ExpirationTime,
    UserAgent,
    CreatedAt,
    UpdatedAt,
}
