//! Resource entry normalization and nested-name checks. Runs once at boot.

use crate::action::FORM_ACTIONS;
use crate::config::{
    OneOrMany, RawResourceConfig, RawResourceEntry, RawRouterOptions, ResourceConfig, RouterOptions,
};
use crate::error::ConfigError;

/// Fails on the first ancestor of `resource` (as a dotted prefix) that is not a configured resource.
/// The leaf itself need not be present.
pub fn check_resource_name<'a, I>(resource: &str, known: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let segments: Vec<&str> = resource.split('.').collect();
    for depth in 1..segments.len() {
        let ancestor = segments[..depth].join(".");
        if !known.clone().into_iter().any(|name| name == ancestor) {
            return Err(ConfigError::UnknownParent {
                resource: resource.to_string(),
                parent: ancestor,
            });
        }
    }
    Ok(())
}

/// Wraps bare model references, strips route-name overrides, filters `only`, forces form actions
/// into `except` and fills defaults. Idempotent.
pub fn normalize_resource_config(
    resource: &str,
    raw: RawResourceConfig,
) -> Result<ResourceConfig, ConfigError> {
    let entry = match raw {
        RawResourceConfig::Model(model) => RawResourceEntry {
            model: Some(model),
            ..RawResourceEntry::default()
        },
        RawResourceConfig::Entry(entry) => entry,
    };
    let model = entry.model.ok_or_else(|| ConfigError::MissingModel {
        resource: resource.to_string(),
    })?;

    let RawRouterOptions { only, except, names } = entry.router_options.unwrap_or_default();
    if names.is_some() {
        tracing::debug!(resource, "dropping route name overrides");
    }

    let mut disable_routing = entry.disable_routing.unwrap_or(false);
    // An `only` list with nothing routable left is kept as written; the entry just stops routing.
    let only = only.map(|only| {
        let listed = only.into_vec();
        let kept: Vec<String> = listed
            .iter()
            .filter(|action| !FORM_ACTIONS.contains(&action.as_str()))
            .cloned()
            .collect();
        if kept.is_empty() {
            disable_routing = true;
            listed
        } else {
            kept
        }
    });
    let except = with_form_actions(except.map(OneOrMany::into_vec).unwrap_or_default());

    Ok(ResourceConfig {
        model,
        router_options: RouterOptions { only, except },
        disable_routing,
        authorization: entry.authorization,
        relation: entry.relation,
        request: entry.request,
        requests: entry.requests,
    })
}

/// Explicit entries keep their position; missing form actions are appended.
fn with_form_actions(mut except: Vec<String>) -> Vec<String> {
    for action in FORM_ACTIONS {
        if !except.iter().any(|e| e == action) {
            except.push(action.to_string());
        }
    }
    except
}
