//! Inbound request as seen by the resolver and controller, plus the validated-request hook.

mod rules;

pub use rules::{RuleRequest, ValidationRule};

use crate::error::ValidationErrors;
use crate::inflect;
use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Path parameters, headers and JSON body of one request.
#[derive(Clone, Debug, Default)]
pub struct ApiRequest {
    pub params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Map<String, Value>,
    /// Name of the validated request that accepted this body, if one was applied.
    pub validated_by: Option<String>,
}

impl ApiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    /// Bound value for a resource segment: exact name, then plural, then singular.
    pub fn route_param(&self, name: &str) -> Option<&str> {
        if let Some(v) = self.params.get(name) {
            return Some(v.as_str());
        }
        [inflect::pluralize(name), inflect::singularize(name)]
            .iter()
            .find_map(|candidate| self.params.get(candidate))
            .map(String::as_str)
    }
}

/// Self-authorizing, self-validating request applied to store/update bodies.
pub trait ValidatedRequest: Send + Sync {
    fn authorize(&self, _request: &ApiRequest) -> bool {
        true
    }

    fn validate(&self, request: &ApiRequest) -> Result<(), ValidationErrors>;
}

/// Named validated-request implementations referenced from resource configuration.
#[derive(Clone, Default)]
pub struct RequestRegistry {
    entries: HashMap<String, Arc<dyn ValidatedRequest>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, request: Arc<dyn ValidatedRequest>) {
        self.entries.insert(name.into(), request);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ValidatedRequest>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl fmt::Debug for RequestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("RequestRegistry").field("entries", &names).finish()
    }
}
