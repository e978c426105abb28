pub use sea_orm_migration::prelude::*;

mod m20240312_091400_create_campaign_table;
mod m20240312_093050_create_donor_table;
mod m20240312_094210_create_transaction_table;
mod m20240402_151830_create_subscription_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240312_091400_create_campaign_table::Migration),
            Box::new(m20240312_093050_create_donor_table::Migration),
            Box::new(m20240312_094210_create_transaction_table::Migration),
            Box::new(m20240402_151830_create_subscription_table::Migration),
        ]
    }
}
