use crate::schema::{self, Field, FieldType, Record, Row};
use sea_orm::entity::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

/// Accepted donation amount shape.
#[derive(EnumIter, DeriveActiveEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
pub enum AmountType {
    #[default]
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "fixed")]
    Fixed,
    #[sea_orm(string_value = "both")]
    Both,
}

#[derive(EnumIter, DeriveActiveEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[sea_orm(rs_type = "String", db_type = "String(Some(12))")]
pub enum DonationType {
    #[default]
    #[sea_orm(string_value = "oneoff")]
    Oneoff,
    #[sea_orm(string_value = "recurring")]
    Recurring,
    #[sea_orm(string_value = "both")]
    Both,
}

/// donation campaigns

#[derive(Clone, Debug, PartialEq, Default, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created_at: Option<i64>,

    pub title: Option<String>,

    pub currency: Option<String>,

    pub goal: Option<f64>,

    pub minimum_donation: Option<f64>,

    pub maximum_donation: Option<f64>,

    pub amount_type: Option<AmountType>,

    /// serialized list of fixed amount strings
    #[sea_orm(column_type = "Text", nullable)]
    pub fixed_amounts: Option<String>,

    pub donation_type: Option<DonationType>,

    /// serialized interval -> label map
    #[sea_orm(column_type = "Text", nullable)]
    pub frequency_options: Option<String>,

    pub address_enabled: Option<bool>,

    pub message_enabled: Option<bool>,

    pub show_goal: Option<bool>,

    pub theme_color: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub custom_css: Option<String>,
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

impl Model {
    pub fn fixed_amount_list(&self) -> Vec<String> {
        self.fixed_amounts
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    pub fn set_fixed_amount_list(&mut self, amounts: &[String]) {
        self.fixed_amounts = schema::object_text(&amounts);
    }

    pub fn frequency_option_map(&self) -> BTreeMap<String, String> {
        self.frequency_options
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    pub fn set_frequency_option_map(&mut self, options: &BTreeMap<String, String>) {
        self.frequency_options = schema::object_text(options);
    }
}

const SCHEMA: &[Field] = &[
    Field::new("id", FieldType::Integer),
    Field::new("created_at", FieldType::Timestamp),
    Field::new("title", FieldType::String),
    Field::new("currency", FieldType::String),
    Field::new("goal", FieldType::Float),
    Field::new("minimum_donation", FieldType::Float),
    Field::new("maximum_donation", FieldType::Float),
    Field::new("amount_type", FieldType::String),
    Field::new("fixed_amounts", FieldType::Object),
    Field::new("donation_type", FieldType::String),
    Field::new("frequency_options", FieldType::Object),
    Field::new("address_enabled", FieldType::Boolean),
    Field::new("message_enabled", FieldType::Boolean),
    Field::new("show_goal", FieldType::Boolean),
    Field::new("theme_color", FieldType::String),
    Field::new("custom_css", FieldType::String),
];

impl Record for Model {
    fn schema() -> &'static [Field] {
        SCHEMA
    }

    fn label() -> &'static str {
        "Campaign"
    }

    fn hydrate(row: &Row) -> schema::Result<Self> {
        schema::check_columns::<Self>(row)?;
        Ok(Self {
            id: schema::get_i32(row, "id")?.unwrap_or_default(),
            created_at: schema::get_i64(row, "created_at")?,
            title: schema::get_str(row, "title")?,
            currency: schema::get_str(row, "currency")?,
            goal: schema::get_f64(row, "goal")?,
            minimum_donation: schema::get_f64(row, "minimum_donation")?,
            maximum_donation: schema::get_f64(row, "maximum_donation")?,
            amount_type: schema::get_enum(row, "amount_type")?,
            fixed_amounts: schema::get_object::<Vec<String>>(row, "fixed_amounts")?
                .as_ref()
                .and_then(schema::object_text),
            donation_type: schema::get_enum(row, "donation_type")?,
            frequency_options: schema::get_object::<BTreeMap<String, String>>(
                row,
                "frequency_options",
            )?
            .as_ref()
            .and_then(schema::object_text),
            address_enabled: schema::get_bool(row, "address_enabled")?,
            message_enabled: schema::get_bool(row, "message_enabled")?,
            show_goal: schema::get_bool(row, "show_goal")?,
            theme_color: schema::get_str(row, "theme_color")?,
            custom_css: schema::get_str(row, "custom_css")?,
        })
    }

    fn dehydrate(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_owned(), json!(self.id));
        schema::put(&mut row, "created_at", self.created_at);
        schema::put(&mut row, "title", self.title.clone());
        schema::put(&mut row, "currency", self.currency.clone());
        schema::put(&mut row, "goal", self.goal);
        schema::put(&mut row, "minimum_donation", self.minimum_donation);
        schema::put(&mut row, "maximum_donation", self.maximum_donation);
        schema::put_enum(&mut row, "amount_type", self.amount_type.as_ref());
        schema::put(&mut row, "fixed_amounts", self.fixed_amounts.clone());
        schema::put_enum(&mut row, "donation_type", self.donation_type.as_ref());
        schema::put(&mut row, "frequency_options", self.frequency_options.clone());
        schema::put(&mut row, "address_enabled", self.address_enabled);
        schema::put(&mut row, "message_enabled", self.message_enabled);
        schema::put(&mut row, "show_goal", self.show_goal);
        schema::put(&mut row, "theme_color", self.theme_color.clone());
        schema::put(&mut row, "custom_css", self.custom_css.clone());
        row
    }
}
