//! Route identifier to resource descriptor, plus validated-request substitution for body actions.

use crate::action::Action;
use crate::config::ResolvedConfig;
use crate::error::AppError;
use crate::request::{ApiRequest, RequestRegistry};
use std::sync::Arc;
use tracing::debug;

/// Resolved resource for one request. Built per request and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    parents: Vec<String>,
    model: String,
    name: String,
    requires_authorization: bool,
}

impl ResourceDescriptor {
    pub fn new(parents: Vec<String>, model: impl Into<String>, name: impl Into<String>, requires_authorization: bool) -> Self {
        ResourceDescriptor {
            parents,
            model: model.into(),
            name: name.into(),
            requires_authorization,
        }
    }

    /// Ancestor segment names, outermost first.
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requires_authorization(&self) -> bool {
        self.requires_authorization
    }

    /// Dotted configuration key of the leaf, e.g. `post.comment`.
    pub fn config_key(&self) -> String {
        self.key_at(self.parents.len())
    }

    /// Dotted configuration key of the parent at `depth` (0 is the outermost).
    pub fn parent_key(&self, depth: usize) -> String {
        self.key_at(depth)
    }

    fn key_at(&self, depth: usize) -> String {
        self.parents[..depth.min(self.parents.len())]
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.segment_at(depth)))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn segment_at(&self, depth: usize) -> &str {
        self.parents.get(depth).map(String::as_str).unwrap_or(&self.name)
    }
}

/// Outcome of resolution: action, descriptor and the effective request.
#[derive(Debug)]
pub struct ResolvedRoute {
    pub action: Action,
    pub descriptor: ResourceDescriptor,
    pub request: ApiRequest,
}

#[derive(Clone, Debug)]
pub struct RequestResolver {
    config: Arc<ResolvedConfig>,
    requests: Arc<RequestRegistry>,
}

impl RequestResolver {
    pub fn new(config: Arc<ResolvedConfig>, requests: Arc<RequestRegistry>) -> Self {
        RequestResolver { config, requests }
    }

    /// Split `route` into action and descriptor. Unknown routes are a misconfiguration, not a client error.
    pub fn parse(&self, route: &str) -> Result<(Action, ResourceDescriptor), AppError> {
        let mut segments: Vec<&str> = route.split('.').filter(|s| !s.is_empty()).collect();
        let action_name = segments
            .pop()
            .ok_or_else(|| AppError::Misconfigured("empty route identifier".into()))?;
        let action = Action::parse(action_name)
            .ok_or_else(|| AppError::Misconfigured(format!("unknown action in route '{}'", route)))?;

        let prefix = self.config.group.route_name_segments();
        if !prefix.is_empty() && segments.starts_with(&prefix) {
            segments = segments.split_off(prefix.len());
        }

        let name = segments
            .pop()
            .ok_or_else(|| AppError::Misconfigured(format!("route '{}' names no resource", route)))?;
        let parents: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
        let key = parents
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".");
        let resource = self
            .config
            .resource(&key)
            .ok_or_else(|| AppError::Misconfigured(format!("route '{}' has no resource '{}'", route, key)))?;

        let descriptor = ResourceDescriptor::new(
            parents,
            resource.model.clone(),
            name,
            self.config.requires_authorization(&key),
        );
        Ok((action, descriptor))
    }

    /// Parse `route`, then run the configured validated request for store/update.
    pub fn resolve(&self, route: &str, mut request: ApiRequest) -> Result<ResolvedRoute, AppError> {
        let (action, descriptor) = self.parse(route)?;
        debug!(route, resource = %descriptor.config_key(), action = %action, "resolved route");

        let key = descriptor.config_key();
        let request_name = self
            .config
            .resource(&key)
            .and_then(|r| r.request_for(action))
            .map(str::to_string);
        if let Some(name) = request_name {
            let validated = self
                .requests
                .get(&name)
                .ok_or_else(|| AppError::Misconfigured(format!("request '{}' is not registered", name)))?;
            if !validated.authorize(&request) {
                debug!(request = %name, "validated request declined authorization");
                return Err(AppError::Forbidden);
            }
            validated.validate(&request).map_err(AppError::Validation)?;
            request.validated_by = Some(name);
        }

        Ok(ResolvedRoute {
            action,
            descriptor,
            request,
        })
    }
}
