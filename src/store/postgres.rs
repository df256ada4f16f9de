//! Repository over PostgreSQL. Models and relations are mapped explicitly to tables and foreign keys.

use crate::store::sql::{self, QueryBuf, SqlParam, TableRef};
use crate::store::{key_to_string, Record, Repository, Scope, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::collections::HashMap;

/// Table backing one model.
#[derive(Clone, Debug)]
pub struct PgModel {
    pub schema: String,
    pub table: String,
    pub primary_key: String,
    /// Columns a request body may write. Empty means every body key is passed through.
    pub fillable: Vec<String>,
}

impl PgModel {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        PgModel {
            schema: schema.into(),
            table: table.into(),
            primary_key: "id".into(),
            fillable: Vec::new(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn fillable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = columns.into_iter().map(Into::into).collect();
        self
    }

    fn writable_columns(&self, attributes: &Map<String, Value>) -> Vec<String> {
        attributes
            .keys()
            .filter(|k| **k != self.primary_key || self.fillable.contains(*k))
            .filter(|k| self.fillable.is_empty() || self.fillable.contains(*k))
            .cloned()
            .collect()
    }
}

/// Child side of a relation: the related model and its foreign key to the parent's primary key.
#[derive(Clone, Debug)]
pub struct PgRelation {
    pub model: String,
    pub foreign_key: String,
}

pub struct PgRepository {
    pool: PgPool,
    models: HashMap<String, PgModel>,
    relations: HashMap<(String, String), PgRelation>,
}

/// Scope resolved against the mappings.
struct Resolved<'a> {
    model_name: &'a str,
    model: &'a PgModel,
    filter: Option<(&'a str, String, Value)>,
}

impl<'a> Resolved<'a> {
    fn table_ref(&self) -> TableRef<'a> {
        TableRef {
            schema: &self.model.schema,
            table: &self.model.table,
            primary_key: &self.model.primary_key,
            filter: self.filter.as_ref().map(|(fk, key, _)| (*fk, key.clone())),
        }
    }
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        PgRepository {
            pool,
            models: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    pub fn model(mut self, name: impl Into<String>, model: PgModel) -> Self {
        self.models.insert(name.into(), model);
        self
    }

    pub fn relation(
        mut self,
        parent_model: impl Into<String>,
        relation: impl Into<String>,
        child: PgRelation,
    ) -> Self {
        self.relations.insert((parent_model.into(), relation.into()), child);
        self
    }

    fn mapped(&self, name: &str) -> Result<&PgModel, StoreError> {
        self.models
            .get(name)
            .ok_or_else(|| StoreError::UnknownModel(name.to_string()))
    }

    fn resolve<'a>(&'a self, scope: &'a Scope) -> Result<Resolved<'a>, StoreError> {
        match scope {
            Scope::Root { model } => Ok(Resolved {
                model_name: model,
                model: self.mapped(model)?,
                filter: None,
            }),
            Scope::Related { parent, relation } => {
                let rel = self
                    .relations
                    .get(&(parent.model.clone(), relation.clone()))
                    .ok_or_else(|| StoreError::UnknownRelation {
                        model: parent.model.clone(),
                        relation: relation.clone(),
                    })?;
                Ok(Resolved {
                    model_name: &rel.model,
                    model: self.mapped(&rel.model)?,
                    filter: Some((&rel.foreign_key, parent.key_string(), parent.key.clone())),
                })
            }
        }
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, Value>(&q.sql);
        for p in &q.params {
            query = match p {
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Json(v) => query.bind(v.clone()),
            };
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, Value>(&q.sql);
        for p in &q.params {
            query = match p {
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Json(v) => query.bind(v.clone()),
            };
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = match p {
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Json(v) => query.bind(v.clone()),
            };
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }
}

fn to_record(model_name: &str, model: &PgModel, row: Value) -> Result<Record, StoreError> {
    match row {
        Value::Object(attributes) => {
            let key = attributes
                .get(&model.primary_key)
                .cloned()
                .unwrap_or(Value::Null);
            Ok(Record::new(model_name, key, attributes))
        }
        other => Err(StoreError::Invalid(format!(
            "expected a row object for {}, got {}",
            model_name, other
        ))),
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn all(&self, scope: &Scope) -> Result<Vec<Record>, StoreError> {
        let target = self.resolve(scope)?;
        let q = sql::select_all(&target.table_ref());
        self.fetch_all(&q)
            .await?
            .into_iter()
            .map(|row| to_record(target.model_name, target.model, row))
            .collect()
    }

    async fn find(&self, scope: &Scope, id: &str) -> Result<Option<Record>, StoreError> {
        let target = self.resolve(scope)?;
        let q = sql::select_by_id(&target.table_ref(), id);
        self.fetch_optional(&q)
            .await?
            .map(|row| to_record(target.model_name, target.model, row))
            .transpose()
    }

    async fn create(&self, scope: &Scope, attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let target = self.resolve(scope)?;
        let mut columns = target.model.writable_columns(&attributes);
        let mut body = attributes;
        if let Some((fk, _, parent_key)) = &target.filter {
            body.insert(fk.to_string(), parent_key.clone());
            if !columns.iter().any(|c| c.as_str() == *fk) {
                columns.push(fk.to_string());
            }
        }
        let q = sql::insert(&target.table_ref(), &columns, Value::Object(body));
        let row = self
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| StoreError::Invalid(format!("insert into {} returned no row", target.model.table)))?;
        to_record(target.model_name, target.model, row)
    }

    async fn update(&self, record: &Record, attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let model = self.mapped(&record.model)?;
        let scope = Scope::root(record.model.clone());
        let target = self.resolve(&scope)?;
        let columns: Vec<String> = model
            .writable_columns(&attributes)
            .into_iter()
            .filter(|c| *c != model.primary_key)
            .collect();
        let id = key_to_string(&record.key);
        let q = if columns.is_empty() {
            sql::select_by_id(&target.table_ref(), &id)
        } else {
            sql::update(&target.table_ref(), &id, &columns, Value::Object(attributes))
        };
        let row = self.fetch_optional(&q).await?.ok_or_else(|| {
            StoreError::Invalid(format!("{} '{}' no longer exists", record.model, id))
        })?;
        to_record(&record.model, model, row)
    }

    async fn delete(&self, record: &Record) -> Result<(), StoreError> {
        let scope = Scope::root(record.model.clone());
        let target = self.resolve(&scope)?;
        let affected = self
            .execute(&sql::delete(&target.table_ref(), &record.key_string()))
            .await?;
        tracing::debug!(model = %record.model, key = %record.key_string(), affected, "deleted");
        Ok(())
    }
}
