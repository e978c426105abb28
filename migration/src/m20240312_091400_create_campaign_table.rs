use entity::campaign;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(campaign::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(campaign::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(campaign::Column::CreatedAt).big_integer().null())
                    .col(ColumnDef::new(campaign::Column::Title).string().null())
                    .col(ColumnDef::new(campaign::Column::Currency).string_len(3).null())
                    .col(ColumnDef::new(campaign::Column::Goal).double().null())
                    .col(
                        ColumnDef::new(campaign::Column::MinimumDonation)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(campaign::Column::MaximumDonation)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(campaign::Column::AmountType)
                            .string_len(8)
                            .null(),
                    )
                    .col(ColumnDef::new(campaign::Column::FixedAmounts).text().null())
                    .col(
                        ColumnDef::new(campaign::Column::DonationType)
                            .string_len(12)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(campaign::Column::FrequencyOptions)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(campaign::Column::AddressEnabled)
                            .boolean()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(campaign::Column::MessageEnabled)
                            .boolean()
                            .null(),
                    )
                    .col(ColumnDef::new(campaign::Column::ShowGoal).boolean().null())
                    .col(ColumnDef::new(campaign::Column::ThemeColor).string().null())
                    .col(ColumnDef::new(campaign::Column::CustomCss).text().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(campaign::Entity).to_owned())
            .await
    }
}
