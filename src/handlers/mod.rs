//! HTTP handlers.

pub mod resource;
pub use resource::dispatch;
