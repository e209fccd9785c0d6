//! Semantic version tag management.

use crate::domain::{GitTagComponent, SemanticVersion};
use crate::error::{Result, XcHelperError};
use crate::git::Repository;
use tracing::info;

/// Tag created when a repository has no tags yet.
pub const INITIAL_TAG: &str = "0.0.1";

/// Default remote used for pushes.
pub const DEFAULT_REMOTE: &str = "origin";

/// Computes, creates and pushes version tags on a [Repository].
pub struct TagManager<'r, R: Repository + ?Sized> {
    repo: &'r R,
    remote: String,
}

impl<'r, R: Repository + ?Sized> TagManager<'r, R> {
    pub fn new(repo: &'r R, remote: impl Into<String>) -> Self {
        TagManager {
            repo,
            remote: remote.into(),
        }
    }

    /// Compute the tag after the latest one.
    ///
    /// # Returns
    /// * `Err(XcHelperError::NoTag)` - if the repository has no tag yet
    /// * `Err(XcHelperError::Version)` - if the latest tag is not `X.Y.Z` or
    ///   the component cannot grow
    pub fn next_tag(&self, component: GitTagComponent) -> Result<String> {
        let latest = self
            .repo
            .latest_tag()?
            .ok_or_else(|| XcHelperError::NoTag(self.repo.location()))?;

        let version = SemanticVersion::parse(&latest)?;
        Ok(version.increment(component)?.to_string())
    }

    /// Create `version` verbatim on HEAD.
    pub fn tag(&self, version: &str) -> Result<()> {
        let head = self.repo.head_oid()?;
        self.repo.create_tag(version, head)?;
        info!(tag = version, repo = %self.repo.location(), "created tag");
        Ok(())
    }

    /// Create the next tag and return it.
    pub fn increment(&self, component: GitTagComponent) -> Result<String> {
        let next = self.next_tag(component)?;
        self.tag(&next)?;
        Ok(next)
    }

    /// Push the current branch, then the tag.
    ///
    /// The branch goes first so a tag never reaches the remote without the
    /// commits it points to. A failed tag push is still an error.
    pub fn push(&self, tag: &str) -> Result<()> {
        let branch = self.repo.current_branch()?;
        self.repo.push_branch(&self.remote, &branch)?;
        self.repo.push_tags(&self.remote, &[tag])?;
        info!(tag, remote = %self.remote, branch = %branch, "pushed tag");
        Ok(())
    }
}
