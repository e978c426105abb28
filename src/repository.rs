//! Generic storage access over registered entities.
//!
//! One repository implementation serves every entity that declares a column
//! schema. Reads come back as raw JSON rows and are hydrated through the
//! registry, writes dehydrate models into typed SQL parameters. Column
//! names arriving from callers (criteria, ordering, projections) are
//! resolved against the entity schema allow-list.

use crate::{now, Error, Result};
use entity::schema::{self, Record, Row};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, EntityTrait, FromQueryResult, IdenStatic,
    Iterable, Order, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::marker::PhantomData;

/// Entities served by [`Repository`].
pub trait RepoEntity: EntityTrait
where
    Self::Model: Record,
{
    type ActiveModel: ActiveModelTrait<Entity = Self> + Default + Send;
}

impl RepoEntity for entity::campaign::Entity {
    type ActiveModel = entity::campaign::ActiveModel;
}

impl RepoEntity for entity::donor::Entity {
    type ActiveModel = entity::donor::ActiveModel;
}

impl RepoEntity for entity::transaction::Entity {
    type ActiveModel = entity::transaction::ActiveModel;
}

impl RepoEntity for entity::subscription::Entity {
    type ActiveModel = entity::subscription::ActiveModel;
}

/// Listing options for [`Repository::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// order column, unknown names fall back to id
    pub orderby: Option<String>,
    pub desc: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// column projection, empty selects everything
    pub columns: Vec<String>,
}

fn column<E: EntityTrait>(name: &str) -> Option<E::Column> {
    E::Column::iter().find(|c| c.as_str() == name)
}

fn generated_title(label: &str) -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{} ({})", label, hex::encode(bytes))
}

pub struct Repository<E> {
    conn: DbConn,
    marker: PhantomData<E>,
}

impl<E> Repository<E>
where
    E: RepoEntity,
    E::Model: Record + FromQueryResult + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
{
    pub fn new(conn: DbConn) -> Self {
        Self {
            conn,
            marker: PhantomData,
        }
    }

    pub fn db(&self) -> &DbConn {
        &self.conn
    }

    fn id_column(&self) -> Result<E::Column> {
        column::<E>("id").ok_or(Error::Str("entity without id column"))
    }

    /// Dehydrate a model row into an active model, skipping the id column.
    fn active_model(&self, row: &Row) -> Result<<E as RepoEntity>::ActiveModel> {
        let mut am = <<E as RepoEntity>::ActiveModel as Default>::default();
        for (name, value) in row.iter() {
            if name == "id" {
                continue;
            }
            let ty = E::Model::field_type(name)
                .ok_or_else(|| schema::SchemaError::UnknownColumn(name.clone()))?;
            let col = column::<E>(name).ok_or(Error::Str("schema column missing on entity"))?;
            am.set(col, schema::to_db_value(ty, value)?);
        }
        Ok(am)
    }

    pub async fn insert(&self, model: &E::Model) -> Result<i32> {
        let mut row = model.dehydrate();
        row.remove("id");
        if E::Model::field_type("title").is_some() && !row.contains_key("title") {
            row.insert(
                "title".to_owned(),
                generated_title(E::Model::label()).into(),
            );
        }
        if E::Model::field_type("created_at").is_some() && !row.contains_key("created_at") {
            row.insert("created_at".to_owned(), (now() as i64).into());
        }
        let am = self.active_model(&row)?;
        let res = E::insert(am).exec(self.db()).await?;
        Ok(res.last_insert_id)
    }

    pub async fn get(&self, id: i32) -> Result<Option<E::Model>> {
        let row = E::find_by_id(id).into_json().one(self.db()).await?;
        match row {
            Some(serde_json::Value::Object(map)) => Ok(Some(E::Model::hydrate(&map)?)),
            Some(_) => Err(Error::Str("unexpected row shape")),
            None => Ok(None),
        }
    }

    /// Full-row update. Mapped columns absent from the model are cleared.
    pub async fn update(&self, model: &E::Model) -> Result<bool> {
        let mut row = model.dehydrate();
        let id = schema::get_i32(&row, "id")?.unwrap_or_default();
        if id <= 0 {
            return Err(Error::InvalidState("update requires a persisted id".to_owned()));
        }
        for field in E::Model::schema() {
            if field.name != "id" && !row.contains_key(field.name) {
                row.insert(field.name.to_owned(), serde_json::Value::Null);
            }
        }
        let am = self.active_model(&row)?;
        let res = E::update_many()
            .set(am)
            .filter(self.id_column()?.eq(id))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn upsert(&self, model: &E::Model) -> Result<i32> {
        let row = model.dehydrate();
        let id = schema::get_i32(&row, "id")?.unwrap_or_default();
        if id > 0 && self.update(model).await? {
            return Ok(id);
        }
        self.insert(model).await
    }

    /// Partial update. Unknown column names are dropped rather than
    /// rejected; returns false when no row matched.
    pub async fn patch(&self, id: i32, changes: &Row) -> Result<bool> {
        let mut am = <<E as RepoEntity>::ActiveModel as Default>::default();
        let mut any = false;
        for (name, value) in changes.iter() {
            if name == "id" {
                continue;
            }
            let (Some(ty), Some(col)) = (E::Model::field_type(name), column::<E>(name)) else {
                continue;
            };
            am.set(col, schema::to_db_value(ty, value)?);
            any = true;
        }
        if !any {
            return Ok(false);
        }
        let res = E::update_many()
            .set(am)
            .filter(self.id_column()?.eq(id))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Idempotent delete.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        E::delete_by_id(id).exec(self.db()).await?;
        Ok(true)
    }

    fn criteria(&self, criteria: &Row) -> Result<Condition> {
        let mut cond = Condition::all();
        for (name, value) in criteria.iter() {
            let ty = E::Model::field_type(name)
                .ok_or_else(|| schema::SchemaError::UnknownColumn(name.clone()))?;
            let col = column::<E>(name).ok_or(Error::Str("schema column missing on entity"))?;
            if value.is_null() {
                cond = cond.add(col.is_null());
            } else {
                cond = cond.add(col.eq(schema::to_db_value(ty, value)?));
            }
        }
        Ok(cond)
    }

    /// ANDed equality lookup. JSON null matches SQL NULL.
    pub async fn find_by(&self, criteria: &Row) -> Result<Vec<E::Model>> {
        let rows = E::find()
            .filter(self.criteria(criteria)?)
            .into_json()
            .all(self.db())
            .await?;
        hydrate_rows::<E>(rows)
    }

    pub async fn find_one_by(&self, criteria: &Row) -> Result<Option<E::Model>> {
        let row = E::find()
            .filter(self.criteria(criteria)?)
            .into_json()
            .one(self.db())
            .await?;
        match row {
            Some(serde_json::Value::Object(map)) => Ok(Some(E::Model::hydrate(&map)?)),
            Some(_) => Err(Error::Str("unexpected row shape")),
            None => Ok(None),
        }
    }

    pub async fn count(&self, criteria: &Row) -> Result<u64> {
        Ok(E::find()
            .filter(self.criteria(criteria)?)
            .count(self.db())
            .await?)
    }

    pub async fn query(&self, options: &QueryOptions) -> Result<Vec<E::Model>> {
        let mut select = E::find();
        if !options.columns.is_empty() {
            select = select.select_only().column(self.id_column()?);
            for name in options.columns.iter() {
                if name == "id" {
                    continue;
                }
                if let Some(col) = column::<E>(name) {
                    select = select.column(col);
                }
            }
        }
        let order_col = options
            .orderby
            .as_deref()
            .and_then(column::<E>)
            .map(Ok)
            .unwrap_or_else(|| self.id_column())?;
        let order = if options.desc { Order::Desc } else { Order::Asc };
        select = select.order_by(order_col, order);
        if let Some(limit) = options.limit {
            select = select.limit(limit);
        }
        if let Some(offset) = options.offset {
            select = select.offset(offset);
        }
        let rows = select.into_json().all(self.db()).await?;
        hydrate_rows::<E>(rows)
    }
}

fn hydrate_rows<E>(rows: Vec<serde_json::Value>) -> Result<Vec<E::Model>>
where
    E: EntityTrait,
    E::Model: Record,
{
    rows.into_iter()
        .map(|row| match row {
            serde_json::Value::Object(map) => Ok(E::Model::hydrate(&map)?),
            _ => Err(Error::Str("unexpected row shape")),
        })
        .collect()
}
