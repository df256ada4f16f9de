//! Authorization gate: a yes/no policy decision delegated to the embedding application.

use crate::store::Record;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::fmt;

/// Capability checked for each action: index/show -> View, store -> Create, update -> Update, destroy -> Delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ability {
    View,
    Create,
    Update,
    Delete,
}

impl Ability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::View => "view",
            Ability::Create => "create",
            Ability::Update => "update",
            Ability::Delete => "delete",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the ability is checked against: a model type (collection-level) or one instance.
#[derive(Clone, Copy, Debug)]
pub enum Subject<'a> {
    Model(&'a str),
    Record(&'a Record),
}

impl Subject<'_> {
    pub fn model(&self) -> &str {
        match self {
            Subject::Model(model) => model,
            Subject::Record(record) => &record.model,
        }
    }
}

/// Everything a policy may look at. `parents` is the resolved chain, outermost first.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizationRequest<'a> {
    pub ability: Ability,
    pub subject: Subject<'a>,
    pub parents: &'a [Record],
    pub headers: &'a HeaderMap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Denied,
}

impl Authorization {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Authorization::Authorized
        } else {
            Authorization::Denied
        }
    }
}

#[async_trait]
pub trait Gate: Send + Sync {
    async fn authorize(&self, request: AuthorizationRequest<'_>) -> Authorization;
}

/// Gate that grants everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl Gate for AllowAll {
    async fn authorize(&self, _request: AuthorizationRequest<'_>) -> Authorization {
        Authorization::Authorized
    }
}

/// Gate that refuses everything; used when no gate is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

#[async_trait]
impl Gate for DenyAll {
    async fn authorize(&self, _request: AuthorizationRequest<'_>) -> Authorization {
        Authorization::Denied
    }
}

/// Synchronous policy closure as a gate.
pub struct PolicyFn<F>(pub F);

#[async_trait]
impl<F> Gate for PolicyFn<F>
where
    F: Fn(&AuthorizationRequest<'_>) -> bool + Send + Sync,
{
    async fn authorize(&self, request: AuthorizationRequest<'_>) -> Authorization {
        Authorization::from_bool((self.0)(&request))
    }
}
