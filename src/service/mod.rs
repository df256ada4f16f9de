//! Request handling core: route resolution and the generic resource controller.

mod controller;
mod resolver;
pub use controller::ResourceController;
pub use resolver::{RequestResolver, ResolvedRoute, ResourceDescriptor};
