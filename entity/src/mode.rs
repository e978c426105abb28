use sea_orm::entity::prelude::*;

/// Vendor API mode the record was created under.
#[derive(EnumIter, DeriveActiveEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
pub enum Mode {
    #[default]
    #[sea_orm(string_value = "test")]
    Test,
    #[sea_orm(string_value = "live")]
    Live,
}
