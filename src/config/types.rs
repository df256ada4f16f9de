//! Raw config types matching the JSON schema, plus their normalized counterparts.

use crate::action::{Action, FORM_ACTIONS};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Route group shared by every resource: URL prefix, route-name prefix and authorization default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(
        default,
        alias = "as",
        alias = "routeNamePrefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub route_name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<bool>,
}

impl GroupConfig {
    /// Route-name prefix split into dotted segments; empty when unset.
    pub fn route_name_segments(&self) -> Vec<&str> {
        self.route_name_prefix
            .as_deref()
            .map(|p| p.split('.').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRouterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<OneOrMany>,
    /// Route-name overrides. Accepted on input, always stripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<serde_json::Value>,
}

/// Per-action validated-request references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
}

impl RequestOverrides {
    pub fn is_empty(&self) -> bool {
        self.store.is_none() && self.update.is_none()
    }

    pub fn for_action(&self, action: Action) -> Option<&str> {
        match action {
            Action::Store => self.store.as_deref(),
            Action::Update => self.update.as_deref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResourceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_options: Option<RawRouterOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_routing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<bool>,
    /// Relation accessor on the parent instance; defaults to the pluralized leaf segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(default, skip_serializing_if = "RequestOverrides::is_empty")]
    pub requests: RequestOverrides,
}

/// One `resources` entry as written: a bare model reference or a structured entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResourceConfig {
    Model(String),
    Entry(RawResourceEntry),
}

/// Whole configuration file. `resources` keeps file order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub group: GroupConfig,
    #[serde(
        default,
        deserialize_with = "ordered_resources",
        serialize_with = "resources_as_map"
    )]
    pub resources: Vec<(String, RawResourceConfig)>,
}

impl FullConfig {
    pub fn new(group: GroupConfig) -> Self {
        FullConfig {
            group,
            resources: Vec::new(),
        }
    }

    pub fn resource(mut self, name: impl Into<String>, config: RawResourceConfig) -> Self {
        self.resources.push((name.into(), config));
        self
    }
}

fn ordered_resources<'de, D>(deserializer: D) -> Result<Vec<(String, RawResourceConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, RawResourceConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of dotted resource names to resource configs")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, config)) = map.next_entry::<String, RawResourceConfig>()? {
                out.push((name, config));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

fn resources_as_map<S>(resources: &[(String, RawResourceConfig)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(resources.iter().map(|(k, v)| (k, v)))
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,
    #[serde(default)]
    pub except: Vec<String>,
}

impl RouterOptions {
    /// Actions to register: `only` (when set) narrowed by `except`. Unknown names are skipped with a warning.
    pub fn actions(&self) -> Vec<Action> {
        let known = |name: &String| -> Option<Action> {
            let action = Action::parse(name);
            if action.is_none() && !FORM_ACTIONS.contains(&name.as_str()) {
                tracing::warn!(action = %name, "ignoring unknown action in router options");
            }
            action
        };
        let base: Vec<Action> = match &self.only {
            Some(only) => only.iter().filter_map(known).collect(),
            None => Action::ALL.to_vec(),
        };
        let excluded: Vec<Action> = self.except.iter().filter_map(known).collect();
        Action::ALL
            .into_iter()
            .filter(|a| base.contains(a) && !excluded.contains(a))
            .collect()
    }
}

/// Normalized resource entry; produced once at boot and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub model: String,
    pub router_options: RouterOptions,
    pub disable_routing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(default, skip_serializing_if = "RequestOverrides::is_empty")]
    pub requests: RequestOverrides,
}

impl ResourceConfig {
    /// Validated-request reference for an action: per-action entry first, then the resource default.
    pub fn request_for(&self, action: Action) -> Option<&str> {
        if !action.accepts_body() {
            return None;
        }
        self.requests
            .for_action(action)
            .or(self.request.as_deref())
    }

    /// Every request name this resource references.
    pub fn request_refs(&self) -> impl Iterator<Item = &str> {
        self.request
            .as_deref()
            .into_iter()
            .chain(self.requests.store.as_deref())
            .chain(self.requests.update.as_deref())
    }
}

impl From<ResourceConfig> for RawResourceConfig {
    fn from(config: ResourceConfig) -> Self {
        RawResourceConfig::Entry(RawResourceEntry {
            model: Some(config.model),
            router_options: Some(RawRouterOptions {
                only: config.router_options.only.map(OneOrMany::Many),
                except: Some(OneOrMany::Many(config.router_options.except)),
                names: None,
            }),
            disable_routing: Some(config.disable_routing),
            authorization: config.authorization,
            relation: config.relation,
            request: config.request,
            requests: config.requests,
        })
    }
}
