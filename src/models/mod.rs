pub mod deployment;
pub mod project;
pub mod provider;

pub use deployment::*;
pub use project::*;
pub use provider::*;
