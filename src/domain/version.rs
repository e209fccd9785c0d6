use crate::error::{Result, XcHelperError};
use std::fmt;

/// Semantic version representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse version from a tag string (e.g., "1.2.3" or "v1.2.3" -> 1.2.3)
    ///
    /// Pre-release and build metadata are accepted and discarded.
    pub fn parse(tag: &str) -> Result<Self> {
        let clean_tag = tag
            .trim()
            .trim_start_matches('v')
            .trim_start_matches('V');

        let parsed = semver::Version::parse(clean_tag).map_err(|e| {
            XcHelperError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z ({})",
                tag, e
            ))
        })?;

        Ok(SemanticVersion::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Increment one component, zeroing every less significant one.
    ///
    /// Fails when the component is already `u64::MAX`.
    pub fn increment(&self, component: GitTagComponent) -> Result<Self> {
        let bump = |value: u64| {
            value.checked_add(1).ok_or_else(|| {
                XcHelperError::version(format!(
                    "Cannot increment the {} component of {}: already at its maximum",
                    component, self
                ))
            })
        };

        Ok(match component {
            GitTagComponent::Major => SemanticVersion::new(bump(self.major)?, 0, 0),
            GitTagComponent::Minor => SemanticVersion::new(self.major, bump(self.minor)?, 0),
            GitTagComponent::Patch => {
                SemanticVersion::new(self.major, self.minor, bump(self.patch)?)
            }
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Which part of a version `git-tag` should increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GitTagComponent {
    Major,
    Minor,
    #[default]
    Patch,
}

impl GitTagComponent {
    /// Parse from the exact lowercase names; anything else is no component.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "major" => Some(GitTagComponent::Major),
            "minor" => Some(GitTagComponent::Minor),
            "patch" => Some(GitTagComponent::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GitTagComponent::Major => "major",
            GitTagComponent::Minor => "minor",
            GitTagComponent::Patch => "patch",
        }
    }
}

impl fmt::Display for GitTagComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
