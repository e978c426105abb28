use entity::donor;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(donor::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(donor::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(donor::Column::CreatedAt).big_integer().null())
                    .col(ColumnDef::new(donor::Column::Title).string().null())
                    .col(ColumnDef::new(donor::Column::Email).string().null())
                    .col(ColumnDef::new(donor::Column::Name).string().null())
                    .col(ColumnDef::new(donor::Column::BusinessName).string().null())
                    .col(ColumnDef::new(donor::Column::Street).string().null())
                    .col(ColumnDef::new(donor::Column::Postcode).string().null())
                    .col(ColumnDef::new(donor::Column::City).string().null())
                    .col(ColumnDef::new(donor::Column::Country).string_len(2).null())
                    .col(ColumnDef::new(donor::Column::Locale).string().null())
                    .col(ColumnDef::new(donor::Column::CustomerId).string().null())
                    .col(ColumnDef::new(donor::Column::Mode).string_len(8).null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_donor_email_mode")
                    .col(donor::Column::Email)
                    .col(donor::Column::Mode)
                    .table(donor::Entity)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("ix_donor_email_mode").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(donor::Entity).to_owned())
            .await
    }
}
