use crate::schema::{self, Field, FieldType, Record, Row};
use sea_orm::entity::prelude::*;
use serde_json::json;

#[derive(EnumIter, DeriveActiveEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[sea_orm(rs_type = "String", db_type = "String(Some(12))")]
pub enum Status {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// recurring donation subscriptions, created by the first paid
/// transaction of a series

#[derive(Clone, Debug, PartialEq, Default, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created_at: Option<i64>,

    pub title: Option<String>,

    pub value: Option<f64>,

    pub currency: Option<String>,

    /// charge interval, e.g. "1 month"
    pub frequency: Option<String>,

    /// remaining charge count at creation, 0 = indefinite
    pub times: Option<i32>,

    pub status: Option<Status>,

    pub vendor_subscription_id: Option<String>,

    /// originating (first) transaction
    pub transaction_id: Option<i32>,

    pub donor_id: Option<i32>,

    pub campaign_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
    #[sea_orm(
        belongs_to = "super::donor::Entity",
        from = "Column::DonorId",
        to = "super::donor::Column::Id"
    )]
    Donor,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::donor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

const SCHEMA: &[Field] = &[
    Field::new("id", FieldType::Integer),
    Field::new("created_at", FieldType::Timestamp),
    Field::new("title", FieldType::String),
    Field::new("value", FieldType::Float),
    Field::new("currency", FieldType::String),
    Field::new("frequency", FieldType::String),
    Field::new("times", FieldType::Integer),
    Field::new("status", FieldType::String),
    Field::new("vendor_subscription_id", FieldType::String),
    Field::new("transaction_id", FieldType::Integer),
    Field::new("donor_id", FieldType::Integer),
    Field::new("campaign_id", FieldType::Integer),
];

impl Record for Model {
    fn schema() -> &'static [Field] {
        SCHEMA
    }

    fn label() -> &'static str {
        "Subscription"
    }

    fn hydrate(row: &Row) -> schema::Result<Self> {
        schema::check_columns::<Self>(row)?;
        Ok(Self {
            id: schema::get_i32(row, "id")?.unwrap_or_default(),
            created_at: schema::get_i64(row, "created_at")?,
            title: schema::get_str(row, "title")?,
            value: schema::get_f64(row, "value")?,
            currency: schema::get_str(row, "currency")?,
            frequency: schema::get_str(row, "frequency")?,
            times: schema::get_i32(row, "times")?,
            status: schema::get_enum(row, "status")?,
            vendor_subscription_id: schema::get_str(row, "vendor_subscription_id")?,
            transaction_id: schema::get_i32(row, "transaction_id")?,
            donor_id: schema::get_i32(row, "donor_id")?,
            campaign_id: schema::get_i32(row, "campaign_id")?,
        })
    }

    fn dehydrate(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_owned(), json!(self.id));
        schema::put(&mut row, "created_at", self.created_at);
        schema::put(&mut row, "title", self.title.clone());
        schema::put(&mut row, "value", self.value);
        schema::put(&mut row, "currency", self.currency.clone());
        schema::put(&mut row, "frequency", self.frequency.clone());
        schema::put(&mut row, "times", self.times);
        schema::put_enum(&mut row, "status", self.status.as_ref());
        schema::put(
            &mut row,
            "vendor_subscription_id",
            self.vendor_subscription_id.clone(),
        );
        schema::put(&mut row, "transaction_id", self.transaction_id);
        schema::put(&mut row, "donor_id", self.donor_id);
        schema::put(&mut row, "campaign_id", self.campaign_id);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let sub = Model {
            id: 5,
            created_at: Some(1_700_000_300),
            title: Some("Subscription (9c)".to_owned()),
            value: Some(10.0),
            currency: Some("EUR".to_owned()),
            frequency: Some("1 month".to_owned()),
            times: Some(11),
            status: Some(Status::Active),
            vendor_subscription_id: Some("sub_1".to_owned()),
            transaction_id: Some(42),
            donor_id: Some(1),
            campaign_id: Some(2),
        };
        assert_eq!(Model::hydrate(&sub.dehydrate()).unwrap(), sub);
    }
}
