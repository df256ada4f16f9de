//! In-process repository. Rows live in insertion order; relations are declared up front.

use crate::store::{key_to_string, Record, Repository, Scope, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const PRIMARY_KEY: &str = "id";

#[derive(Clone, Debug)]
struct MemoryRelation {
    model: String,
    foreign_key: String,
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    tables: HashMap<String, Table>,
    /// (parent model, relation name) -> child model + foreign key on the child.
    relations: HashMap<(String, String), MemoryRelation>,
}

/// Target of a scope once the relation is looked up: table plus an optional foreign-key filter.
struct Target {
    model: String,
    filter: Option<(String, Value)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(self, model: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.tables.entry(model.into()).or_default();
        }
        self
    }

    /// `parent_model.relation` enumerates `child_model` rows whose `foreign_key` equals the parent key.
    pub fn with_relation(
        self,
        parent_model: impl Into<String>,
        relation: impl Into<String>,
        child_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let child_model = child_model.into();
        if let Ok(mut inner) = self.inner.write() {
            inner.tables.entry(child_model.clone()).or_default();
            inner.relations.insert(
                (parent_model.into(), relation.into()),
                MemoryRelation {
                    model: child_model,
                    foreign_key: foreign_key.into(),
                },
            );
        }
        self
    }

    /// Seed a row directly, bypassing scopes.
    pub fn insert(&self, model: &str, attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let mut inner = self.write()?;
        insert_row(&mut inner, model, attributes)
    }

    /// Number of rows currently stored for `model`.
    pub fn count(&self, model: &str) -> Result<usize, StoreError> {
        let inner = self.read()?;
        Ok(inner.tables.get(model).map(|t| t.rows.len()).unwrap_or(0))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl MemoryInner {
    fn target(&self, scope: &Scope) -> Result<Target, StoreError> {
        match scope {
            Scope::Root { model } => {
                if !self.tables.contains_key(model) {
                    return Err(StoreError::UnknownModel(model.clone()));
                }
                Ok(Target {
                    model: model.clone(),
                    filter: None,
                })
            }
            Scope::Related { parent, relation } => {
                let rel = self
                    .relations
                    .get(&(parent.model.clone(), relation.clone()))
                    .ok_or_else(|| StoreError::UnknownRelation {
                        model: parent.model.clone(),
                        relation: relation.clone(),
                    })?;
                Ok(Target {
                    model: rel.model.clone(),
                    filter: Some((rel.foreign_key.clone(), parent.key.clone())),
                })
            }
        }
    }

    fn rows<'a>(&'a self, target: &'a Target) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
        self.tables
            .get(&target.model)
            .into_iter()
            .flat_map(|t| t.rows.iter())
            .filter(move |row| match &target.filter {
                Some((fk, value)) => row.get(fk).map(|v| same_key(v, value)).unwrap_or(false),
                None => true,
            })
    }
}

fn same_key(a: &Value, b: &Value) -> bool {
    key_to_string(a) == key_to_string(b)
}

fn row_key(row: &Map<String, Value>) -> Value {
    row.get(PRIMARY_KEY).cloned().unwrap_or(Value::Null)
}

fn to_record(model: &str, row: &Map<String, Value>) -> Record {
    Record::new(model, row_key(row), row.clone())
}

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

fn insert_row(
    inner: &mut MemoryInner,
    model: &str,
    mut attributes: Map<String, Value>,
) -> Result<Record, StoreError> {
    let table = inner
        .tables
        .get_mut(model)
        .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;
    match attributes.get(PRIMARY_KEY) {
        Some(key) => {
            if table.rows.iter().any(|r| same_key(&row_key(r), key)) {
                return Err(StoreError::Invalid(format!(
                    "duplicate {} '{}' for {}",
                    PRIMARY_KEY,
                    key_to_string(key),
                    model
                )));
            }
            if let Some(n) = key.as_i64() {
                table.next_id = table.next_id.max(n);
            }
        }
        None => {
            table.next_id += 1;
            attributes.insert(PRIMARY_KEY.into(), Value::from(table.next_id));
        }
    }
    let ts = now();
    attributes.entry("created_at").or_insert_with(|| ts.clone());
    attributes.entry("updated_at").or_insert(ts);
    table.rows.push(attributes);
    let row = table.rows.last().ok_or_else(|| StoreError::Invalid("insert failed".into()))?;
    Ok(to_record(model, row))
}

#[async_trait]
impl Repository for MemoryStore {
    async fn all(&self, scope: &Scope) -> Result<Vec<Record>, StoreError> {
        let inner = self.read()?;
        let target = inner.target(scope)?;
        Ok(inner.rows(&target).map(|r| to_record(&target.model, r)).collect())
    }

    async fn find(&self, scope: &Scope, id: &str) -> Result<Option<Record>, StoreError> {
        let inner = self.read()?;
        let target = inner.target(scope)?;
        let found = inner
            .rows(&target)
            .find(|r| key_to_string(&row_key(r)) == id)
            .map(|r| to_record(&target.model, r));
        Ok(found)
    }

    async fn create(&self, scope: &Scope, mut attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let mut inner = self.write()?;
        let target = inner.target(scope)?;
        attributes.remove(PRIMARY_KEY);
        if let Some((fk, value)) = target.filter {
            attributes.insert(fk, value);
        }
        insert_row(&mut inner, &target.model, attributes)
    }

    async fn update(&self, record: &Record, attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let mut inner = self.write()?;
        let table = inner
            .tables
            .get_mut(&record.model)
            .ok_or_else(|| StoreError::UnknownModel(record.model.clone()))?;
        let row = table
            .rows
            .iter_mut()
            .find(|r| same_key(&row_key(r), &record.key))
            .ok_or_else(|| StoreError::Invalid(format!("{} '{}' no longer exists", record.model, record.key_string())))?;
        for (k, v) in attributes {
            if k != PRIMARY_KEY {
                row.insert(k, v);
            }
        }
        row.insert("updated_at".into(), now());
        Ok(to_record(&record.model, row))
    }

    async fn delete(&self, record: &Record) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let table = inner
            .tables
            .get_mut(&record.model)
            .ok_or_else(|| StoreError::UnknownModel(record.model.clone()))?;
        table.rows.retain(|r| !same_key(&row_key(r), &record.key));
        Ok(())
    }
}
