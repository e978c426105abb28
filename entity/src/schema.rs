//! Column registry and the raw-row boundary.
//!
//! Every entity declares an ordered list of columns with a semantic type.
//! Raw rows cross this boundary as JSON maps: `hydrate` turns a row into a
//! typed model (coercing strings where the storage layer is loose about
//! types), `dehydrate` does the inverse. Columns absent from a row stay
//! unset on the model, so partially projected reads are legal.

use sea_orm::{ActiveEnum, Value as DbValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A raw storage row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// 32 bit integer columns (ids, counters).
    Integer,
    Float,
    Boolean,
    /// Structured list/map stored as serialized JSON text.
    Object,
    /// Unix seconds, stored as a big integer.
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("column `{column}` expects {expected}")]
    Invalid {
        column: String,
        expected: &'static str,
    },
}

impl SchemaError {
    fn invalid(column: &str, expected: &'static str) -> Self {
        Self::Invalid {
            column: column.to_owned(),
            expected,
        }
    }
}

pub type Result<T, E = SchemaError> = core::result::Result<T, E>;

/// A typed record backed by a registered column schema.
pub trait Record: Sized {
    /// Ordered column declaration for this entity.
    fn schema() -> &'static [Field];

    /// Human readable label used for generated titles.
    fn label() -> &'static str;

    /// Build a typed record from a raw row. Unknown column names are a
    /// programmer error; absent columns leave the field unset.
    fn hydrate(row: &Row) -> Result<Self>;

    /// Produce a raw row for storage. Unset fields are omitted rather than
    /// written as nulls.
    fn dehydrate(&self) -> Row;

    fn field_type(name: &str) -> Option<FieldType> {
        Self::schema().iter().find(|f| f.name == name).map(|f| f.ty)
    }
}

/// Reject rows carrying column names outside the registry.
pub fn check_columns<R: Record>(row: &Row) -> Result<()> {
    for key in row.keys() {
        if R::field_type(key).is_none() {
            return Err(SchemaError::UnknownColumn(key.clone()));
        }
    }
    Ok(())
}

pub fn get_str(row: &Row, name: &'static str) -> Result<Option<String>> {
    match row.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::invalid(name, "a string")),
    }
}

pub fn get_i32(row: &Row, name: &'static str) -> Result<Option<i32>> {
    Ok(get_i64(row, name)?.map(|v| v as i32))
}

pub fn get_i64(row: &Row, name: &'static str) -> Result<Option<i64>> {
    match row.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| SchemaError::invalid(name, "an integer")),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| SchemaError::invalid(name, "an integer")),
        Some(_) => Err(SchemaError::invalid(name, "an integer")),
    }
}

pub fn get_f64(row: &Row, name: &'static str) -> Result<Option<f64>> {
    match row.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| SchemaError::invalid(name, "a number")),
        Some(Value::String(s)) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| SchemaError::invalid(name, "a number")),
        Some(_) => Err(SchemaError::invalid(name, "a number")),
    }
}

pub fn get_bool(row: &Row, name: &'static str) -> Result<Option<bool>> {
    match row.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(SchemaError::invalid(name, "a boolean")),
        },
        Some(Value::String(s)) => parse_bool(s).ok_or_else(|| SchemaError::invalid(name, "a boolean")),
        Some(_) => Err(SchemaError::invalid(name, "a boolean")),
    }
}

fn parse_bool(s: &str) -> Option<Option<bool>> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" => Some(None),
        "true" | "1" | "yes" | "on" => Some(Some(true)),
        "false" | "0" | "no" | "off" => Some(Some(false)),
        _ => None,
    }
}

/// Read a structured column: either serialized JSON text or an already
/// structured value.
pub fn get_object<T: DeserializeOwned>(row: &Row, name: &'static str) -> Result<Option<T>> {
    match row.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => serde_json::from_str(s)
            .map(Some)
            .map_err(|_| SchemaError::invalid(name, "serialized JSON")),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|_| SchemaError::invalid(name, "a structured value")),
    }
}

/// Read a string-backed enum column.
pub fn get_enum<E>(row: &Row, name: &'static str) -> Result<Option<E>>
where
    E: ActiveEnum<Value = String>,
{
    match get_str(row, name)? {
        None => Ok(None),
        Some(s) => E::try_from_value(&s)
            .map(Some)
            .map_err(|_| SchemaError::invalid(name, "a known enum value")),
    }
}

/// Insert a value into a row, omitting unset fields entirely.
pub fn put<V: Into<Value>>(row: &mut Row, name: &str, value: Option<V>) {
    if let Some(v) = value {
        row.insert(name.to_owned(), v.into());
    }
}

/// Insert a string-backed enum value into a row.
pub fn put_enum<E>(row: &mut Row, name: &str, value: Option<&E>)
where
    E: ActiveEnum<Value = String>,
{
    put(row, name, value.map(|e| e.to_value()));
}

/// Serialize a structured value for storage.
pub fn object_text<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_string(value).ok()
}

/// Coerce a raw JSON value into a bound SQL parameter of the declared
/// type. JSON null becomes a typed SQL NULL.
pub fn to_db_value(ty: FieldType, value: &Value) -> Result<DbValue> {
    if value.is_null() {
        return Ok(match ty {
            FieldType::String | FieldType::Object => DbValue::String(None),
            FieldType::Integer => DbValue::Int(None),
            FieldType::Float => DbValue::Double(None),
            FieldType::Boolean => DbValue::Bool(None),
            FieldType::Timestamp => DbValue::BigInt(None),
        });
    }
    let column = "value";
    Ok(match ty {
        FieldType::String => match value {
            Value::String(s) => DbValue::String(Some(Box::new(s.clone()))),
            Value::Number(n) => DbValue::String(Some(Box::new(n.to_string()))),
            _ => return Err(SchemaError::invalid(column, "a string")),
        },
        FieldType::Object => match value {
            Value::String(s) => DbValue::String(Some(Box::new(s.clone()))),
            v => DbValue::String(Some(Box::new(v.to_string()))),
        },
        FieldType::Integer => match value {
            Value::Number(n) => DbValue::Int(Some(
                n.as_i64()
                    .ok_or_else(|| SchemaError::invalid(column, "an integer"))?
                    as i32,
            )),
            Value::String(s) => DbValue::Int(Some(
                s.parse::<i32>()
                    .map_err(|_| SchemaError::invalid(column, "an integer"))?,
            )),
            _ => return Err(SchemaError::invalid(column, "an integer")),
        },
        FieldType::Timestamp => match value {
            Value::Number(n) => DbValue::BigInt(Some(
                n.as_i64()
                    .ok_or_else(|| SchemaError::invalid(column, "a timestamp"))?,
            )),
            Value::String(s) => DbValue::BigInt(Some(
                s.parse::<i64>()
                    .map_err(|_| SchemaError::invalid(column, "a timestamp"))?,
            )),
            _ => return Err(SchemaError::invalid(column, "a timestamp")),
        },
        FieldType::Float => match value {
            Value::Number(n) => DbValue::Double(Some(
                n.as_f64()
                    .ok_or_else(|| SchemaError::invalid(column, "a number"))?,
            )),
            Value::String(s) => DbValue::Double(Some(
                s.parse::<f64>()
                    .map_err(|_| SchemaError::invalid(column, "a number"))?,
            )),
            _ => return Err(SchemaError::invalid(column, "a number")),
        },
        FieldType::Boolean => match value {
            Value::Bool(b) => DbValue::Bool(Some(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => DbValue::Bool(Some(false)),
                Some(1) => DbValue::Bool(Some(true)),
                _ => return Err(SchemaError::invalid(column, "a boolean")),
            },
            Value::String(s) => match parse_bool(s) {
                Some(Some(b)) => DbValue::Bool(Some(b)),
                Some(None) => DbValue::Bool(None),
                None => return Err(SchemaError::invalid(column, "a boolean")),
            },
            _ => return Err(SchemaError::invalid(column, "a boolean")),
        },
    })
}
