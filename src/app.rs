//! Boot-time assembly: registers routes once, checks collaborators against the configuration,
//! and returns a ready `Router`.

use crate::config::FullConfig;
use crate::error::ConfigError;
use crate::gate::{DenyAll, Gate};
use crate::request::{RequestRegistry, ValidatedRequest};
use crate::response::{ResponseSerializer, Transformer};
use crate::routes::{AxumRouteTable, RouteRegistrar};
use crate::service::ResourceController;
use crate::state::AppState;
use crate::store::Repository;
use axum::Router;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Default request body limit (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub struct ResourceApi {
    config: FullConfig,
    repository: Arc<dyn Repository>,
    gate: Option<Arc<dyn Gate>>,
    requests: RequestRegistry,
    serializer: ResponseSerializer,
    body_limit: usize,
}

impl ResourceApi {
    pub fn new(config: FullConfig, repository: Arc<dyn Repository>) -> Self {
        ResourceApi {
            config,
            repository,
            gate: None,
            requests: RequestRegistry::new(),
            serializer: ResponseSerializer::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Policy consulted for resources that require authorization.
    pub fn gate(mut self, gate: Arc<dyn Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Validated request referenced by `request` / `requests` entries under `name`.
    pub fn request(mut self, name: impl Into<String>, request: Arc<dyn ValidatedRequest>) -> Self {
        self.requests.register(name, request);
        self
    }

    pub fn transformer(mut self, model: impl Into<String>, transformer: Arc<dyn Transformer>) -> Self {
        self.serializer = self.serializer.with_transformer(model, transformer);
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Normalize and register every resource, then wire the controller. Fails on any configuration error.
    pub fn build(self) -> Result<Router, ConfigError> {
        let mut table = AxumRouteTable::new(&self.config.group);
        let resolved = RouteRegistrar::register_routes(self.config, &mut table)?;

        for (name, resource) in resolved.resources() {
            if let Some(missing) = resource.request_refs().find(|r| !self.requests.contains(r)) {
                return Err(ConfigError::UnknownRequest {
                    resource: name.to_string(),
                    request: missing.to_string(),
                });
            }
            if self.gate.is_none() && !resource.disable_routing && resolved.requires_authorization(name) {
                return Err(ConfigError::MissingGate(name.to_string()));
            }
        }

        let gate = self.gate.unwrap_or_else(|| Arc::new(DenyAll));
        let controller = ResourceController::new(
            Arc::new(resolved),
            Arc::new(self.requests),
            self.repository,
            gate,
            self.serializer,
        );
        let state = AppState {
            controller: Arc::new(controller),
        };
        Ok(table
            .into_router(state)
            .layer(RequestBodyLimitLayer::new(self.body_limit))
            .layer(TraceLayer::new_for_http()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_json_str;
    use crate::gate::AllowAll;
    use crate::request::RuleRequest;
    use crate::store::MemoryStore;

    fn api(json: &str) -> ResourceApi {
        ResourceApi::new(from_json_str(json).unwrap(), Arc::new(MemoryStore::new().with_model("Post")))
    }

    #[test]
    fn authorization_without_gate_is_rejected() {
        let err = api(r#"{ "group": { "authorization": true }, "resources": { "post": "Post" } }"#)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingGate(ref n) if n == "post"));

        assert!(api(r#"{ "group": { "authorization": true }, "resources": { "post": "Post" } }"#)
            .gate(Arc::new(AllowAll))
            .build()
            .is_ok());
    }

    #[test]
    fn unregistered_request_is_rejected() {
        let json = r#"{ "resources": { "post": { "model": "Post", "requests": { "update": "post.update" } } } }"#;
        let err = api(json).build().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRequest { ref request, .. } if request == "post.update"));

        assert!(api(json)
            .request("post.update", Arc::new(RuleRequest::new().partial()))
            .build()
            .is_ok());
    }
}
