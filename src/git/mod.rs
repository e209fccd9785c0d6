//! Git operations abstraction layer
//!
//! The [Repository] trait covers the handful of git operations `git-tag`
//! needs: reading the latest tag, creating a tag on HEAD and pushing.
//!
//! - [repository::Git2Repository]: real implementation using the `git2` crate
//! - [mock::MockRepository]: in-memory implementation for tests
//!
//! [tagger::TagManager] holds the versioning rules on top of any
//! [Repository].

pub mod mock;
pub mod repository;
pub mod tagger;

pub use mock::MockRepository;
pub use repository::Git2Repository;
pub use tagger::TagManager;

use std::cmp::Ordering;

use crate::domain::SemanticVersion;
use crate::error::Result;
use git2::Oid;

/// Common git operation trait for abstraction
///
/// Implementations map underlying errors (like `git2::Error`) to
/// [crate::error::XcHelperError] variants.
pub trait Repository: Send {
    /// Human-readable location, used in messages.
    fn location(&self) -> String;

    /// Commit that HEAD points at.
    fn head_oid(&self) -> Result<Oid>;

    /// Short name of the checked-out branch.
    ///
    /// # Returns
    /// * `Err` - if HEAD is detached or unborn
    fn current_branch(&self) -> Result<String>;

    /// The tag on the nearest commit reachable from HEAD.
    ///
    /// Handles both lightweight and annotated tags. When several tags point at
    /// that commit, the highest semantic version wins.
    ///
    /// # Returns
    /// * `Ok(Some(tag))` - the latest tag name
    /// * `Ok(None)` - no tag is reachable from HEAD
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Create a lightweight tag at the given commit.
    ///
    /// Fails if the tag already exists.
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;

    /// Push a local branch to the remote branch of the same name.
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Push tags to the remote.
    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()>;
}

/// Pick the highest tag by semantic version.
///
/// Parsable tags rank above unparsable ones; unparsable tags compare by name.
pub fn highest_tag(names: &[String]) -> Option<&String> {
    names.iter().max_by(|a, b| compare_tags(a, b))
}

fn compare_tags(a: &str, b: &str) -> Ordering {
    match (SemanticVersion::parse(a), SemanticVersion::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
