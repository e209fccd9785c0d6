//! External collaborators behind one narrow trait.
//!
//! - [system::SystemToolchain]: spawns `swift`, `docker`, `tar` and `aws`,
//!   and tags through `git2`
//! - [mock::RecordingToolchain]: records calls for tests

pub mod mock;
pub mod system;

pub use mock::{Call, RecordingToolchain};
pub use system::SystemToolchain;

use std::path::{Path, PathBuf};

use crate::domain::{BuildConfiguration, DockerRunOption, GitTagComponent, S3Credentials};
use crate::error::Result;

/// Everything `docker-build` hands to the container runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerBuildRequest {
    pub source_dir: PathBuf,
    pub run_options: Vec<DockerRunOption>,
    pub configuration: BuildConfiguration,
    pub image: String,
    /// Subdirectory of `.build` for this platform.
    pub volume: Option<String>,
}

/// Operations the command handlers delegate to.
///
/// Every method blocks until the underlying tool finishes.
pub trait Toolchain: Send + Sync {
    /// `swift package update` in `dir`.
    fn update_macos_packages(&self, dir: &Path) -> Result<()>;

    /// `swift package update` inside `image`, building under `.build/<volume>`.
    fn update_docker_packages(&self, dir: &Path, image: &str, volume: &str) -> Result<()>;

    fn docker_build(&self, request: &DockerBuildRequest) -> Result<()>;

    /// `swift package clean` in `dir`.
    fn clean(&self, dir: &Path) -> Result<()>;

    /// Point `Packages/<name>` at every checkout in `.build/checkouts`.
    fn symlink_dependencies(&self, dir: &Path) -> Result<()>;

    fn generate_xcode_project(&self, dir: &Path) -> Result<()>;

    /// Archive exactly `files` into `archive`. `flat` drops directory structure.
    fn create_archive(&self, archive: &Path, files: &[PathBuf], flat: bool) -> Result<()>;

    fn upload_archive(
        &self,
        archive: &Path,
        bucket: &str,
        region: &str,
        credentials: &S3Credentials,
    ) -> Result<()>;

    /// Create `version` verbatim as a tag on HEAD of the repository at `dir`.
    fn git_tag(&self, dir: &Path, version: &str) -> Result<()>;

    /// Create and return the next tag.
    ///
    /// # Returns
    /// * `Err(XcHelperError::NoTag)` - the repository has no tag to increment
    fn increment_git_tag(&self, dir: &Path, component: GitTagComponent) -> Result<String>;

    /// Push the current branch, then `tag`.
    fn push_git_tag(&self, dir: &Path, tag: &str) -> Result<()>;

    /// Create the `.xcarchive` bundle and return its path.
    fn create_xcarchive(&self, path: &Path, name: &str, scheme: &str) -> Result<PathBuf>;
}
