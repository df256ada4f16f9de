//! Resolved configuration: normalized once at boot, then shared read-only with every request.

use crate::config::{FullConfig, GroupConfig, RawResourceConfig, ResourceConfig};
use crate::error::ConfigError;
use crate::inflect;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct ResolvedConfig {
    pub group: GroupConfig,
    resources: Vec<(String, ResourceConfig)>,
    index: HashMap<String, usize>,
}

impl ResolvedConfig {
    pub fn new(
        group: GroupConfig,
        resources: Vec<(String, ResourceConfig)>,
    ) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(resources.len());
        for (i, (name, _)) in resources.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateResource(name.clone()));
            }
        }
        Ok(ResolvedConfig {
            group,
            resources,
            index,
        })
    }

    /// Normalized entry for a dotted resource key.
    pub fn resource(&self, key: &str) -> Option<&ResourceConfig> {
        self.index.get(key).map(|&i| &self.resources[i].1)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceConfig)> {
        self.resources.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Resource-level flag when set, else the group default, else false.
    pub fn requires_authorization(&self, key: &str) -> bool {
        self.resource(key)
            .and_then(|r| r.authorization)
            .or(self.group.authorization)
            .unwrap_or(false)
    }

    /// Relation accessor that reaches `key` from its parent instance.
    pub fn relation_for(&self, key: &str) -> String {
        self.resource(key)
            .and_then(|r| r.relation.clone())
            .unwrap_or_else(|| {
                let leaf = key.rsplit('.').next().unwrap_or(key);
                inflect::pluralize(leaf)
            })
    }

    /// Raw form of the snapshot; normalizing it again yields the same snapshot.
    pub fn to_full_config(&self) -> FullConfig {
        FullConfig {
            group: self.group.clone(),
            resources: self
                .resources
                .iter()
                .map(|(n, c)| (n.clone(), RawResourceConfig::from(c.clone())))
                .collect(),
        }
    }
}
