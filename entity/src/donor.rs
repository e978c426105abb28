use crate::mode::Mode;
use crate::schema::{self, Field, FieldType, Record, Row};
use sea_orm::entity::prelude::*;
use serde_json::json;

/// donors, matched by (email, mode) at submission time

#[derive(Clone, Debug, PartialEq, Eq, Default, DeriveEntityModel)]
#[sea_orm(table_name = "donors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created_at: Option<i64>,

    pub title: Option<String>,

    pub email: Option<String>,

    pub name: Option<String>,

    pub business_name: Option<String>,

    pub street: Option<String>,

    pub postcode: Option<String>,

    pub city: Option<String>,

    /// two letter ISO code or empty, never a free text name
    pub country: Option<String>,

    pub locale: Option<String>,

    /// vendor assigned customer id
    pub customer_id: Option<String>,

    pub mode: Option<Mode>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

const SCHEMA: &[Field] = &[
    Field::new("id", FieldType::Integer),
    Field::new("created_at", FieldType::Timestamp),
    Field::new("title", FieldType::String),
    Field::new("email", FieldType::String),
    Field::new("name", FieldType::String),
    Field::new("business_name", FieldType::String),
    Field::new("street", FieldType::String),
    Field::new("postcode", FieldType::String),
    Field::new("city", FieldType::String),
    Field::new("country", FieldType::String),
    Field::new("locale", FieldType::String),
    Field::new("customer_id", FieldType::String),
    Field::new("mode", FieldType::String),
];

impl Record for Model {
    fn schema() -> &'static [Field] {
        SCHEMA
    }

    fn label() -> &'static str {
        "Donor"
    }

    fn hydrate(row: &Row) -> schema::Result<Self> {
        schema::check_columns::<Self>(row)?;
        Ok(Self {
            id: schema::get_i32(row, "id")?.unwrap_or_default(),
            created_at: schema::get_i64(row, "created_at")?,
            title: schema::get_str(row, "title")?,
            email: schema::get_str(row, "email")?,
            name: schema::get_str(row, "name")?,
            business_name: schema::get_str(row, "business_name")?,
            street: schema::get_str(row, "street")?,
            postcode: schema::get_str(row, "postcode")?,
            city: schema::get_str(row, "city")?,
            country: schema::get_str(row, "country")?,
            locale: schema::get_str(row, "locale")?,
            customer_id: schema::get_str(row, "customer_id")?,
            mode: schema::get_enum(row, "mode")?,
        })
    }

    fn dehydrate(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_owned(), json!(self.id));
        schema::put(&mut row, "created_at", self.created_at);
        schema::put(&mut row, "title", self.title.clone());
        schema::put(&mut row, "email", self.email.clone());
        schema::put(&mut row, "name", self.name.clone());
        schema::put(&mut row, "business_name", self.business_name.clone());
        schema::put(&mut row, "street", self.street.clone());
        schema::put(&mut row, "postcode", self.postcode.clone());
        schema::put(&mut row, "city", self.city.clone());
        schema::put(&mut row, "country", self.country.clone());
        schema::put(&mut row, "locale", self.locale.clone());
        schema::put(&mut row, "customer_id", self.customer_id.clone());
        schema::put_enum(&mut row, "mode", self.mode.as_ref());
        row
    }
}
