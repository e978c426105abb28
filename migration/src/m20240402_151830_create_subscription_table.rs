use entity::subscription;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(subscription::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(subscription::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(subscription::Column::CreatedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(subscription::Column::Title).string().null())
                    .col(ColumnDef::new(subscription::Column::Value).double().null())
                    .col(
                        ColumnDef::new(subscription::Column::Currency)
                            .string_len(3)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(subscription::Column::Frequency)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(subscription::Column::Times).integer().null())
                    .col(
                        ColumnDef::new(subscription::Column::Status)
                            .string_len(12)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(subscription::Column::VendorSubscriptionId)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(subscription::Column::TransactionId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(subscription::Column::DonorId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(subscription::Column::CampaignId)
                            .integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_subscription_vendor_subscription_id")
                    .col(subscription::Column::VendorSubscriptionId)
                    .table(subscription::Entity)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("ix_subscription_vendor_subscription_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(subscription::Entity).to_owned())
            .await
    }
}
