//! Boot-time route registration: normalize every resource entry and mount CRUD routes for the routed ones.
//! Collection routes: `/{prefix}/a/:a/b`. Item routes: `/{prefix}/a/:a/b/:b`.

use crate::action::Action;
use crate::config::{check_resource_name, normalize_resource_config, FullConfig, GroupConfig, ResolvedConfig};
use crate::error::ConfigError;
use crate::handlers::resource::dispatch;
use crate::inflect;
use crate::state::AppState;
use axum::{handler::Handler, routing::MethodRouter, Extension, Router};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Route identifier attached to every generated handler: `{prefix segments.}{dotted.name}.{action}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteName(pub String);

impl RouteName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where generated resource routes go.
pub trait RouteTable {
    fn register_resource(&mut self, name: &str, actions: &[Action]) -> Result<(), ConfigError>;
}

/// Records registrations in order; handy for inspecting what a configuration would mount.
impl RouteTable for Vec<(String, Vec<Action>)> {
    fn register_resource(&mut self, name: &str, actions: &[Action]) -> Result<(), ConfigError> {
        self.push((name.to_string(), actions.to_vec()));
        Ok(())
    }
}

pub struct RouteRegistrar;

impl RouteRegistrar {
    /// Check, normalize and register every resource in configuration order. The returned snapshot
    /// replaces the raw configuration for the rest of the process.
    pub fn register_routes<T>(config: FullConfig, table: &mut T) -> Result<ResolvedConfig, ConfigError>
    where
        T: RouteTable + ?Sized,
    {
        let FullConfig { group, resources } = config;
        let names: Vec<String> = resources.iter().map(|(n, _)| n.clone()).collect();
        let mut seen = HashSet::with_capacity(names.len());
        let mut normalized = Vec::with_capacity(resources.len());

        for (name, raw) in resources {
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateResource(name));
            }
            check_resource_name(&name, names.iter().map(String::as_str))?;
            let resource = normalize_resource_config(&name, raw)?;
            if resource.disable_routing {
                debug!(resource = %name, "routing disabled");
            } else {
                let actions = resource.router_options.actions();
                table.register_resource(&name, &actions)?;
                let action_names: Vec<&str> = actions.iter().map(Action::as_str).collect();
                info!(resource = %name, model = %resource.model, actions = ?action_names, "registered resource routes");
            }
            normalized.push((name, resource));
        }
        ResolvedConfig::new(group, normalized)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Endpoint {
    path: String,
    action: Action,
    route: RouteName,
}

/// Route table producing an axum `Router` whose handlers all dispatch to the resource controller.
#[derive(Clone, Debug, Default)]
pub struct AxumRouteTable {
    path_prefix: String,
    name_prefix: String,
    endpoints: Vec<Endpoint>,
}

impl AxumRouteTable {
    pub fn new(group: &GroupConfig) -> Self {
        let prefix = group.prefix.as_deref().unwrap_or("").trim_matches('/');
        AxumRouteTable {
            path_prefix: if prefix.is_empty() {
                String::new()
            } else {
                format!("/{}", prefix)
            },
            name_prefix: group
                .route_name_segments()
                .iter()
                .map(|segment| format!("{}.", segment))
                .collect(),
            endpoints: Vec::new(),
        }
    }

    /// Collection path and item path for a dotted resource name.
    fn paths(&self, name: &str) -> Result<(String, String), ConfigError> {
        let mut seen = HashSet::new();
        let mut collection = self.path_prefix.clone();
        let mut param = String::new();
        let segments: Vec<&str> = name.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            param = inflect::singularize(segment);
            if !seen.insert(param.clone()) {
                return Err(ConfigError::DuplicateParameter {
                    resource: name.to_string(),
                    parameter: param,
                });
            }
            collection.push('/');
            collection.push_str(segment);
            if i + 1 < segments.len() {
                collection.push_str("/:");
                collection.push_str(&param);
            }
        }
        let item = format!("{}/:{}", collection, param);
        Ok((collection, item))
    }

    /// Registered `(path, route identifier)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.endpoints.iter().map(|e| (e.path.as_str(), e.route.as_str()))
    }

    pub fn into_router(self, state: AppState) -> Router {
        let mut grouped: Vec<(String, Vec<Endpoint>)> = Vec::new();
        for endpoint in self.endpoints {
            match grouped.iter_mut().find(|(path, _)| *path == endpoint.path) {
                Some((_, list)) => list.push(endpoint),
                None => grouped.push((endpoint.path.clone(), vec![endpoint])),
            }
        }
        grouped
            .into_iter()
            .fold(Router::new(), |router, (path, endpoints)| {
                router.route(&path, method_router(endpoints))
            })
            .with_state(state)
    }
}

fn method_router(endpoints: Vec<Endpoint>) -> MethodRouter<AppState> {
    endpoints
        .into_iter()
        .fold(MethodRouter::new(), |methods, endpoint| {
            let handler = dispatch.layer(Extension(endpoint.route));
            match endpoint.action {
                Action::Index | Action::Show => methods.get(handler),
                Action::Store => methods.post(handler),
                Action::Update => methods.put(handler.clone()).patch(handler),
                Action::Destroy => methods.delete(handler),
            }
        })
}

impl RouteTable for AxumRouteTable {
    fn register_resource(&mut self, name: &str, actions: &[Action]) -> Result<(), ConfigError> {
        let (collection, item) = self.paths(name)?;
        for &action in actions {
            let path = if action.is_item() { &item } else { &collection };
            self.endpoints.push(Endpoint {
                path: path.clone(),
                action,
                route: RouteName(format!("{}{}.{}", self.name_prefix, name, action)),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_json_str;

    fn register(json: &str) -> Result<(ResolvedConfig, Vec<(String, Vec<Action>)>), ConfigError> {
        let mut table: Vec<(String, Vec<Action>)> = Vec::new();
        let config = RouteRegistrar::register_routes(from_json_str(json)?, &mut table)?;
        Ok((config, table))
    }

    #[test]
    fn registers_in_order_and_skips_disabled() {
        let (config, table) = register(
            r#"{ "resources": {
                "post": { "model": "Post", "disable_routing": true },
                "post.comment": { "model": "Comment", "router_options": { "only": ["index", "show", "create"] } },
                "tag": { "model": "Tag", "router_options": { "except": "destroy" } },
                "draft": { "model": "Draft", "router_options": { "only": ["edit"] } }
            } }"#,
        )
        .unwrap();
        assert_eq!(
            table,
            vec![
                ("post.comment".to_string(), vec![Action::Index, Action::Show]),
                (
                    "tag".to_string(),
                    vec![Action::Index, Action::Show, Action::Store, Action::Update]
                ),
            ]
        );
        assert_eq!(config.resources().count(), 4);
        assert!(config.resource("draft").unwrap().disable_routing);
    }

    #[test]
    fn unknown_parent_stops_registration() {
        let err = register(r#"{ "resources": { "post.comment": "Comment" } }"#).unwrap_err();
        match err {
            ConfigError::UnknownParent { parent, .. } => assert_eq!(parent, "post"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_model_and_duplicates_fail() {
        assert!(matches!(
            register(r#"{ "resources": { "post": { "authorization": true } } }"#),
            Err(ConfigError::MissingModel { .. })
        ));
        let full = FullConfig::default()
            .resource("post", crate::config::RawResourceConfig::Model("Post".into()))
            .resource("post", crate::config::RawResourceConfig::Model("Post".into()));
        let mut table: Vec<(String, Vec<Action>)> = Vec::new();
        let err = RouteRegistrar::register_routes(full, &mut table).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateResource(_)));
    }

    #[test]
    fn normalized_snapshot_registers_identically() {
        let json = r#"{ "resources": { "post": "Post", "post.comment": { "model": "Comment", "router_options": { "only": "index" } } } }"#;
        let (config, table) = register(json).unwrap();
        let mut again: Vec<(String, Vec<Action>)> = Vec::new();
        let reconfigured = RouteRegistrar::register_routes(config.to_full_config(), &mut again).unwrap();
        assert_eq!(table, again);
        assert_eq!(
            reconfigured.resources().collect::<Vec<_>>(),
            config.resources().collect::<Vec<_>>()
        );
    }

    #[test]
    fn axum_paths_and_route_names() {
        let group = GroupConfig {
            prefix: Some("/api/".into()),
            route_name_prefix: Some("api.".into()),
            authorization: None,
        };
        let mut table = AxumRouteTable::new(&group);
        table
            .register_resource("posts.comments", &[Action::Index, Action::Update])
            .unwrap();
        assert_eq!(
            table.routes().collect::<Vec<_>>(),
            vec![
                ("/api/posts/:post/comments", "api.posts.comments.index"),
                ("/api/posts/:post/comments/:comment", "api.posts.comments.update"),
            ]
        );
    }

    #[test]
    fn route_name_prefix_always_ends_in_one_separator() {
        for prefix in ["api", "api.", ".api..", "v1.api."] {
            let group = GroupConfig {
                route_name_prefix: Some(prefix.into()),
                ..GroupConfig::default()
            };
            let mut table = AxumRouteTable::new(&group);
            table.register_resource("post", &[Action::Show]).unwrap();
            let (_, route) = table.routes().next().unwrap();
            let expected = if prefix.starts_with("v1") { "v1.api.post.show" } else { "api.post.show" };
            assert_eq!(route, expected, "prefix {:?}", prefix);
        }
    }

    #[test]
    fn repeated_parameter_names_are_rejected() {
        let mut table = AxumRouteTable::new(&GroupConfig::default());
        let err = table.register_resource("post.posts", &[Action::Show]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateParameter { ref parameter, .. } if parameter == "post"));
    }
}
