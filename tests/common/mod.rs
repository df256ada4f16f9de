#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use resource_sdk::{Ability, Authorization, AuthorizationRequest, Gate, MemoryStore};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// One gate call: ability, subject model, number of parents passed as context.
pub type GateCall = (Ability, String, usize);

/// Gate that answers with a fixed decision and remembers every question.
pub struct RecordingGate {
    allow: bool,
    calls: Mutex<Vec<GateCall>>,
}

impl RecordingGate {
    pub fn allowing() -> Arc<Self> {
        Arc::new(RecordingGate {
            allow: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(RecordingGate {
            allow: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<GateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gate for RecordingGate {
    async fn authorize(&self, request: AuthorizationRequest<'_>) -> Authorization {
        self.calls.lock().unwrap().push((
            request.ability,
            request.subject.model().to_string(),
            request.parents.len(),
        ));
        Authorization::from_bool(self.allow)
    }
}

/// Posts with comments (`post_id`), comments with likes (`comment_id`).
pub fn blog_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_model("Post")
            .with_relation("Post", "comments", "Comment", "post_id")
            .with_relation("Comment", "likes", "Like", "comment_id"),
    )
}

pub fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(m) => m,
        _ => panic!("expected a JSON object"),
    }
}

/// Run one request through the router; an empty response body comes back as `Value::Null`.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
