//! Generic CRUD controller: walks the parent chain, checks existence, then authorization, then persists.

use crate::action::Action;
use crate::config::ResolvedConfig;
use crate::error::AppError;
use crate::gate::{Ability, Authorization, AuthorizationRequest, Gate, Subject};
use crate::request::{ApiRequest, RequestRegistry};
use crate::response::{ApiResponse, ResponseSerializer};
use crate::service::resolver::{RequestResolver, ResolvedRoute, ResourceDescriptor};
use crate::store::{Record, Repository, Scope};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tracing::debug;

pub struct ResourceController {
    config: Arc<ResolvedConfig>,
    resolver: RequestResolver,
    repository: Arc<dyn Repository>,
    gate: Arc<dyn Gate>,
    serializer: ResponseSerializer,
}

impl ResourceController {
    pub fn new(
        config: Arc<ResolvedConfig>,
        requests: Arc<RequestRegistry>,
        repository: Arc<dyn Repository>,
        gate: Arc<dyn Gate>,
        serializer: ResponseSerializer,
    ) -> Self {
        ResourceController {
            resolver: RequestResolver::new(Arc::clone(&config), requests),
            config,
            repository,
            gate,
            serializer,
        }
    }

    /// Entry point for one routed request.
    pub async fn handle(&self, route: &str, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let ResolvedRoute {
            action,
            descriptor,
            request,
        } = self.resolver.resolve(route, request)?;
        match action {
            Action::Index => self.index(&descriptor, request).await,
            Action::Show => self.show(&descriptor, request).await,
            Action::Store => self.store(&descriptor, request).await,
            Action::Update => self.update(&descriptor, request).await,
            Action::Destroy => self.destroy(&descriptor, request).await,
        }
    }

    pub async fn index(&self, d: &ResourceDescriptor, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let Some(parents) = self.resolve_parents(d, &request).await? else {
            return Ok(ApiResponse::not_found());
        };
        let subject = Subject::Model(d.model());
        if !self.allowed(d, Ability::View, subject, &parents, &request.headers).await {
            return Ok(ApiResponse::unauthorized());
        }
        let records = self.repository.all(&self.leaf_scope(d, &parents)).await?;
        Ok(self.serializer.respond(self.serializer.records(records), StatusCode::OK))
    }

    pub async fn show(&self, d: &ResourceDescriptor, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let Some((parents, record)) = self.resolve_item(d, &request).await? else {
            return Ok(ApiResponse::not_found());
        };
        if !self
            .allowed(d, Ability::View, Subject::Record(&record), &parents, &request.headers)
            .await
        {
            return Ok(ApiResponse::unauthorized());
        }
        Ok(self.serializer.respond(self.serializer.record(record), StatusCode::OK))
    }

    pub async fn store(&self, d: &ResourceDescriptor, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let Some(parents) = self.resolve_parents(d, &request).await? else {
            return Ok(ApiResponse::not_found());
        };
        let subject = Subject::Model(d.model());
        if !self.allowed(d, Ability::Create, subject, &parents, &request.headers).await {
            return Ok(ApiResponse::unauthorized());
        }
        let scope = self.leaf_scope(d, &parents);
        let created = self.repository.create(&scope, request.body).await?;
        debug!(resource = %d.config_key(), key = %created.key_string(), "created");
        Ok(self.serializer.respond(self.serializer.record(created), StatusCode::CREATED))
    }

    pub async fn update(&self, d: &ResourceDescriptor, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let Some((parents, record)) = self.resolve_item(d, &request).await? else {
            return Ok(ApiResponse::not_found());
        };
        if !self
            .allowed(d, Ability::Update, Subject::Record(&record), &parents, &request.headers)
            .await
        {
            return Ok(ApiResponse::unauthorized());
        }
        let updated = self.repository.update(&record, request.body).await?;
        Ok(self.serializer.respond(self.serializer.record(updated), StatusCode::OK))
    }

    pub async fn destroy(&self, d: &ResourceDescriptor, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let Some((parents, record)) = self.resolve_item(d, &request).await? else {
            return Ok(ApiResponse::not_found());
        };
        if !self
            .allowed(d, Ability::Delete, Subject::Record(&record), &parents, &request.headers)
            .await
        {
            return Ok(ApiResponse::unauthorized());
        }
        self.repository.delete(&record).await?;
        debug!(resource = %d.config_key(), key = %record.key_string(), "deleted");
        Ok(ApiResponse::no_content())
    }

    /// Parent instances outermost first, or `None` as soon as one lookup misses.
    async fn resolve_parents(
        &self,
        d: &ResourceDescriptor,
        request: &ApiRequest,
    ) -> Result<Option<Vec<Record>>, AppError> {
        let mut chain: Vec<Record> = Vec::with_capacity(d.parents().len());
        for (depth, segment) in d.parents().iter().enumerate() {
            let key = d.parent_key(depth);
            let Some(id) = request.route_param(segment) else {
                debug!(parent = %key, "no route parameter bound for parent");
                return Ok(None);
            };
            let scope = match chain.last() {
                None => {
                    let model = self
                        .config
                        .resource(&key)
                        .map(|r| r.model.clone())
                        .ok_or_else(|| AppError::Misconfigured(format!("no resource '{}'", key)))?;
                    Scope::root(model)
                }
                Some(previous) => Scope::related(previous.clone(), self.config.relation_for(&key)),
            };
            match self.repository.find(&scope, id).await? {
                Some(found) => chain.push(found),
                None => {
                    debug!(parent = %key, id, "parent not found");
                    return Ok(None);
                }
            }
        }
        Ok(Some(chain))
    }

    async fn resolve_item(
        &self,
        d: &ResourceDescriptor,
        request: &ApiRequest,
    ) -> Result<Option<(Vec<Record>, Record)>, AppError> {
        let Some(parents) = self.resolve_parents(d, request).await? else {
            return Ok(None);
        };
        let Some(id) = request.route_param(d.name()) else {
            return Ok(None);
        };
        let found = self.repository.find(&self.leaf_scope(d, &parents), id).await?;
        if found.is_none() {
            debug!(resource = %d.config_key(), id, "not found");
        }
        Ok(found.map(|record| (parents, record)))
    }

    /// Whole model for top-level resources, else the leaf's relation on the innermost parent.
    fn leaf_scope(&self, d: &ResourceDescriptor, parents: &[Record]) -> Scope {
        match parents.last() {
            None => Scope::root(d.model()),
            Some(parent) => Scope::related(parent.clone(), self.config.relation_for(&d.config_key())),
        }
    }

    async fn allowed(
        &self,
        d: &ResourceDescriptor,
        ability: Ability,
        subject: Subject<'_>,
        parents: &[Record],
        headers: &HeaderMap,
    ) -> bool {
        if !d.requires_authorization() {
            return true;
        }
        let decision = self
            .gate
            .authorize(AuthorizationRequest {
                ability,
                subject,
                parents,
                headers,
            })
            .await;
        if decision == Authorization::Denied {
            debug!(resource = %d.config_key(), ability = %ability, "denied by gate");
        }
        decision == Authorization::Authorized
    }
}
