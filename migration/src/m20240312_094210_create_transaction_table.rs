use entity::transaction;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(transaction::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(transaction::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(transaction::Column::CreatedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(transaction::Column::Title).string().null())
                    .col(ColumnDef::new(transaction::Column::Value).double().null())
                    .col(
                        ColumnDef::new(transaction::Column::Currency)
                            .string_len(3)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(transaction::Column::Status)
                            .string_len(12)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(transaction::Column::SequenceType)
                            .string_len(12)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(transaction::Column::VendorPaymentId)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(transaction::Column::VendorCustomerId)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(transaction::Column::Method).string().null())
                    .col(
                        ColumnDef::new(transaction::Column::Mode)
                            .string_len(8)
                            .null(),
                    )
                    .col(ColumnDef::new(transaction::Column::Message).text().null())
                    .col(ColumnDef::new(transaction::Column::Refund).text().null())
                    .col(ColumnDef::new(transaction::Column::DonorId).integer().null())
                    .col(
                        ColumnDef::new(transaction::Column::CampaignId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(transaction::Column::SubscriptionId)
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
                    .name("ix_transaction_vendor_payment_id")
                    .col(transaction::Column::VendorPaymentId)
                    .table(transaction::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_transaction_campaign_id")
                    .col(transaction::Column::CampaignId)
                    .table(transaction::Entity)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("ix_transaction_vendor_payment_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("ix_transaction_campaign_id").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(transaction::Entity).to_owned())
            .await
    }
}
