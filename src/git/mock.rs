use crate::error::{Result, XcHelperError};
use crate::git::{highest_tag, Repository};
use git2::Oid;
use std::sync::Mutex;

/// A push recorded by [MockRepository].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushRecord {
    Branch { remote: String, branch: String },
    Tags { remote: String, tags: Vec<String> },
}

#[derive(Debug, Default)]
struct MockState {
    tags: Vec<(String, Oid)>,
    pushes: Vec<PushRecord>,
}

/// Mock repository for testing without actual git operations
///
/// History is linear, so every tag is reachable from HEAD.
#[derive(Debug)]
pub struct MockRepository {
    head: Oid,
    branch: String,
    fail_tag_push: bool,
    state: Mutex<MockState>,
}

impl MockRepository {
    /// Create a new mock repository with no tags on branch `main`
    pub fn new() -> Self {
        MockRepository {
            head: Oid::from_bytes(&[1; 20]).unwrap_or_else(|_| Oid::zero()),
            branch: "main".to_string(),
            fail_tag_push: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Add an existing tag
    pub fn with_tag(self, name: impl Into<String>) -> Self {
        let head = self.head;
        self.lock().tags.push((name.into(), head));
        self
    }

    /// Make every tag push fail with a remote error
    pub fn failing_tag_push(mut self) -> Self {
        self.fail_tag_push = true;
        self
    }

    /// Tag names in creation order
    pub fn tags(&self) -> Vec<String> {
        self.lock().tags.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Pushes in the order they happened
    pub fn pushes(&self) -> Vec<PushRecord> {
        self.lock().pushes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn location(&self) -> String {
        "mock".to_string()
    }

    fn head_oid(&self) -> Result<Oid> {
        Ok(self.head)
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(highest_tag(&self.tags()).cloned())
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let mut state = self.lock();
        if state.tags.iter().any(|(existing, _)| existing == name) {
            return Err(XcHelperError::Git(git2::Error::from_str(&format!(
                "Cannot create tag '{}': tag already exists",
                name
            ))));
        }
        state.tags.push((name.to_string(), oid));
        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.lock().pushes.push(PushRecord::Branch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()> {
        if self.fail_tag_push {
            return Err(XcHelperError::remote("Push rejected"));
        }
        self.lock().pushes.push(PushRecord::Tags {
            remote: remote.to_string(),
            tags: tag_names.iter().map(|t| t.to_string()).collect(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_tags() {
        let repo = MockRepository::new().with_tag("1.0.0").with_tag("1.1.0");
        assert_eq!(repo.latest_tag().unwrap(), Some("1.1.0".to_string()));
        assert_eq!(repo.tags(), vec!["1.0.0".to_string(), "1.1.0".to_string()]);
    }

    #[test]
    fn test_mock_repository_duplicate_tag() {
        let repo = MockRepository::new().with_tag("1.0.0");
        let head = repo.head_oid().unwrap();
        assert!(repo.create_tag("1.0.0", head).is_err());
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert_eq!(repo.latest_tag().unwrap(), None);
        assert!(repo.pushes().is_empty());
    }
}
