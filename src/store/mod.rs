//! Persistence boundary: records, scopes and the repository trait the controller drives.

pub mod memory;
pub mod postgres;
mod sql;

pub use memory::MemoryStore;
pub use postgres::{PgModel, PgRelation, PgRepository};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// One persisted instance of a model. `key` is the primary key value as stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub model: String,
    pub key: Value,
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn new(model: impl Into<String>, key: Value, attributes: Map<String, Value>) -> Self {
        Record {
            model: model.into(),
            key,
            attributes,
        }
    }

    /// Key as it appears in a URL segment.
    pub fn key_string(&self) -> String {
        key_to_string(&self.key)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// The record's own plain representation: its attributes as a JSON object.
    pub fn direct_transform(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

pub(crate) fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A queryable collection: every instance of a model, or the instances reachable through
/// a named relation of a parent instance.
#[derive(Clone, Debug, PartialEq)]
pub enum Scope {
    Root { model: String },
    Related { parent: Record, relation: String },
}

impl Scope {
    pub fn root(model: impl Into<String>) -> Self {
        Scope::Root {
            model: model.into(),
        }
    }

    pub fn related(parent: Record, relation: impl Into<String>) -> Self {
        Scope::Related {
            parent,
            relation: relation.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("unknown relation '{relation}' on model '{model}'")]
    UnknownRelation { model: String, relation: String },
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

/// Create/find/update/delete over scopes. Implementations map model names and relation
/// names to storage explicitly; nothing is derived at runtime from names.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn all(&self, scope: &Scope) -> Result<Vec<Record>, StoreError>;

    async fn find(&self, scope: &Scope, id: &str) -> Result<Option<Record>, StoreError>;

    /// The store assigns the primary key; a key among `attributes` is not written.
    async fn create(&self, scope: &Scope, attributes: Map<String, Value>) -> Result<Record, StoreError>;

    /// Partial update: only the given attributes change.
    async fn update(&self, record: &Record, attributes: Map<String, Value>) -> Result<Record, StoreError>;

    async fn delete(&self, record: &Record) -> Result<(), StoreError>;
}
