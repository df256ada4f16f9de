//! Response shaping: records, collections and plain values to JSON, through optional per-model transformers.

use crate::store::Record;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Turns one record into its wire structure.
pub trait Transformer: Send + Sync {
    fn transform(&self, record: &Record) -> Value;
}

impl<F> Transformer for F
where
    F: Fn(&Record) -> Value + Send + Sync,
{
    fn transform(&self, record: &Record) -> Value {
        self(record)
    }
}

/// Value on its way to the wire, tagged with how it serializes.
pub enum Payload {
    /// Already plain JSON; passed through unchanged.
    Plain(Value),
    /// Each element transformed in order.
    Sequence(Vec<Payload>),
    Transformable {
        record: Record,
        transformer: Arc<dyn Transformer>,
    },
    /// Record without a transformer: its own attributes verbatim.
    Direct(Record),
}

impl Payload {
    pub fn into_value(self) -> Value {
        match self {
            Payload::Plain(v) => v,
            Payload::Sequence(items) => Value::Array(items.into_iter().map(Payload::into_value).collect()),
            Payload::Transformable { record, transformer } => transformer.transform(&record),
            Payload::Direct(record) => record.direct_transform(),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Plain(v) => f.debug_tuple("Plain").field(v).finish(),
            Payload::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Payload::Transformable { record, .. } => f.debug_tuple("Transformable").field(record).finish(),
            Payload::Direct(record) => f.debug_tuple("Direct").field(record).finish(),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Plain(value)
    }
}

/// Final status plus body. `None` body means an empty response (204).
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        ApiResponse {
            status,
            body: Some(body),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, json!({ "error": "Not Found" }))
    }

    /// Gate denial.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::FORBIDDEN, json!({ "error": "Unauthorized" }))
    }

    pub fn no_content() -> Self {
        ApiResponse {
            status: StatusCode::NO_CONTENT,
            body: None,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ResponseSerializer {
    transformers: HashMap<String, Arc<dyn Transformer>>,
}

impl ResponseSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `transformer` for every record of `model`.
    pub fn with_transformer(mut self, model: impl Into<String>, transformer: Arc<dyn Transformer>) -> Self {
        self.transformers.insert(model.into(), transformer);
        self
    }

    pub fn record(&self, record: Record) -> Payload {
        match self.transformers.get(&record.model) {
            Some(t) => Payload::Transformable {
                record,
                transformer: Arc::clone(t),
            },
            None => Payload::Direct(record),
        }
    }

    pub fn records(&self, records: Vec<Record>) -> Payload {
        Payload::Sequence(records.into_iter().map(|r| self.record(r)).collect())
    }

    pub fn transform(&self, payload: Payload) -> Value {
        payload.into_value()
    }

    pub fn respond(&self, payload: Payload, status: StatusCode) -> ApiResponse {
        ApiResponse::new(status, self.transform(payload))
    }
}

impl fmt::Debug for ResponseSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<&String> = self.transformers.keys().collect();
        models.sort();
        f.debug_struct("ResponseSerializer").field("transformers", &models).finish()
    }
}
