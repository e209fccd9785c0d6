//! Domain logic - value types independent of any external tool

pub mod build;
pub mod credentials;
pub mod version;

pub use build::{BuildConfiguration, DockerRunOption};
pub use credentials::S3Credentials;
pub use version::{GitTagComponent, SemanticVersion};
