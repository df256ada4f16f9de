//! Shared application state for generated routes. Built once at boot; read-only afterwards.

use crate::service::ResourceController;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ResourceController>,
}
