use crate::mode::Mode;
use crate::schema::{self, Field, FieldType, Record, Row};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(EnumIter, DeriveActiveEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[sea_orm(rs_type = "String", db_type = "String(Some(12))")]
pub enum Status {
    #[default]
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl Status {
    /// Terminal states never transition again; refund annotations on a
    /// paid row do not change the status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Open)
    }
}

#[derive(EnumIter, DeriveActiveEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[sea_orm(rs_type = "String", db_type = "String(Some(12))")]
pub enum SequenceType {
    #[default]
    #[sea_orm(string_value = "oneoff")]
    Oneoff,
    #[sea_orm(string_value = "first")]
    First,
    #[sea_orm(string_value = "recurring")]
    Recurring,
}

/// Refund bookkeeping mirrored from the vendor, meaningful only on a
/// paid transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RefundSummary {
    pub refunded: f64,
    pub remaining: f64,
}

/// payment transactions

#[derive(Clone, Debug, PartialEq, Default, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created_at: Option<i64>,

    pub title: Option<String>,

    pub value: Option<f64>,

    pub currency: Option<String>,

    pub status: Option<Status>,

    pub sequence_type: Option<SequenceType>,

    pub vendor_payment_id: Option<String>,

    pub vendor_customer_id: Option<String>,

    pub method: Option<String>,

    pub mode: Option<Mode>,

    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,

    /// serialized refund summary
    #[sea_orm(column_type = "Text", nullable)]
    pub refund: Option<String>,

    pub donor_id: Option<i32>,

    pub campaign_id: Option<i32>,

    pub subscription_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::donor::Entity",
        from = "Column::DonorId",
        to = "super::donor::Column::Id"
    )]
    Donor,
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id"
    )]
    Subscription,
}

impl Related<super::donor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donor.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn refund_summary(&self) -> Option<RefundSummary> {
        self.refund
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
    }

    pub fn set_refund_summary(&mut self, summary: &RefundSummary) {
        self.refund = schema::object_text(summary);
    }

    /// Donation value net of any refunds.
    pub fn net_value(&self) -> f64 {
        let value = self.value.unwrap_or_default();
        match self.refund_summary() {
            Some(r) => value - r.refunded,
            None => value,
        }
    }
}

const SCHEMA: &[Field] = &[
    Field::new("id", FieldType::Integer),
    Field::new("created_at", FieldType::Timestamp),
    Field::new("title", FieldType::String),
    Field::new("value", FieldType::Float),
    Field::new("currency", FieldType::String),
    Field::new("status", FieldType::String),
    Field::new("sequence_type", FieldType::String),
    Field::new("vendor_payment_id", FieldType::String),
    Field::new("vendor_customer_id", FieldType::String),
    Field::new("method", FieldType::String),
    Field::new("mode", FieldType::String),
    Field::new("message", FieldType::String),
    Field::new("refund", FieldType::Object),
    Field::new("donor_id", FieldType::Integer),
    Field::new("campaign_id", FieldType::Integer),
    Field::new("subscription_id", FieldType::Integer),
];

impl Record for Model {
    fn schema() -> &'static [Field] {
        SCHEMA
    }

    fn label() -> &'static str {
        "Donation"
    }

    fn hydrate(row: &Row) -> schema::Result<Self> {
        schema::check_columns::<Self>(row)?;
        Ok(Self {
            id: schema::get_i32(row, "id")?.unwrap_or_default(),
            created_at: schema::get_i64(row, "created_at")?,
            title: schema::get_str(row, "title")?,
            value: schema::get_f64(row, "value")?,
            currency: schema::get_str(row, "currency")?,
            status: schema::get_enum(row, "status")?,
            sequence_type: schema::get_enum(row, "sequence_type")?,
            vendor_payment_id: schema::get_str(row, "vendor_payment_id")?,
            vendor_customer_id: schema::get_str(row, "vendor_customer_id")?,
            method: schema::get_str(row, "method")?,
            mode: schema::get_enum(row, "mode")?,
            message: schema::get_str(row, "message")?,
            refund: schema::get_object::<RefundSummary>(row, "refund")?
                .as_ref()
                .and_then(schema::object_text),
            donor_id: schema::get_i32(row, "donor_id")?,
            campaign_id: schema::get_i32(row, "campaign_id")?,
            subscription_id: schema::get_i32(row, "subscription_id")?,
        })
    }

    fn dehydrate(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_owned(), json!(self.id));
        schema::put(&mut row, "created_at", self.created_at);
        schema::put(&mut row, "title", self.title.clone());
        schema::put(&mut row, "value", self.value);
        schema::put(&mut row, "currency", self.currency.clone());
        schema::put_enum(&mut row, "status", self.status.as_ref());
        schema::put_enum(&mut row, "sequence_type", self.sequence_type.as_ref());
        schema::put(&mut row, "vendor_payment_id", self.vendor_payment_id.clone());
        schema::put(
            &mut row,
            "vendor_customer_id",
            self.vendor_customer_id.clone(),
        );
        schema::put(&mut row, "method", self.method.clone());
        schema::put_enum(&mut row, "mode", self.mode.as_ref());
        schema::put(&mut row, "message", self.message.clone());
        schema::put(&mut row, "refund", self.refund.clone());
        schema::put(&mut row, "donor_id", self.donor_id);
        schema::put(&mut row, "campaign_id", self.campaign_id);
        schema::put(&mut row, "subscription_id", self.subscription_id);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut tx = Model {
            id: 42,
            created_at: Some(1_700_000_200),
            title: Some("Donation (1f2e)".to_owned()),
            value: Some(12.5),
            currency: Some("EUR".to_owned()),
            status: Some(Status::Paid),
            sequence_type: Some(SequenceType::Oneoff),
            vendor_payment_id: Some("tr_abc".to_owned()),
            vendor_customer_id: Some("cst_1".to_owned()),
            method: Some("ideal".to_owned()),
            mode: Some(Mode::Live),
            message: Some("keep it up".to_owned()),
            refund: None,
            donor_id: Some(1),
            campaign_id: Some(2),
            subscription_id: None,
        };
        tx.set_refund_summary(&RefundSummary {
            refunded: 2.5,
            remaining: 10.0,
        });
        let hydrated = Model::hydrate(&tx.dehydrate()).unwrap();
        assert_eq!(hydrated, tx);
        assert_eq!(
            hydrated.refund_summary(),
            Some(RefundSummary {
                refunded: 2.5,
                remaining: 10.0
            })
        );
        assert_eq!(hydrated.net_value(), 10.0);
    }
}
