pub mod config;
pub mod types;
pub mod validator;

pub use config::ForgeConfig;
pub use types::*;
pub use validator::{Artifact, Rejected, validate};
