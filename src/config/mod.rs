pub mod types;
pub mod loader;
pub mod normalizer;
pub mod resolved;

pub use types::*;
pub use loader::*;
pub use normalizer::*;
pub use resolved::*;
