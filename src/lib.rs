pub mod archive;
pub mod codec;
pub mod domain;
pub mod errors;
pub mod services;
pub mod storage;
pub mod store;

pub mod context;
pub use context::PortabilityContext;
pub use errors::{PortabilityError, PortabilityResult};
