//! Resource SDK: configuration-driven nested REST resources over a pluggable repository.

pub mod action;
pub mod app;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod inflect;
pub mod request;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use action::Action;
pub use app::ResourceApi;
pub use config::{from_json_str, load_from_path, FullConfig, ResolvedConfig, ResourceConfig};
pub use error::{AppError, ConfigError, ValidationErrors};
pub use gate::{Ability, AllowAll, Authorization, AuthorizationRequest, DenyAll, Gate, PolicyFn, Subject};
pub use request::{ApiRequest, RequestRegistry, RuleRequest, ValidatedRequest, ValidationRule};
pub use response::{ApiResponse, Payload, ResponseSerializer, Transformer};
pub use routes::{common_routes, AxumRouteTable, RouteName, RouteRegistrar, RouteTable};
pub use service::{RequestResolver, ResourceController, ResourceDescriptor};
pub use state::AppState;
pub use store::{MemoryStore, PgModel, PgRelation, PgRepository, Record, Repository, Scope, StoreError};
