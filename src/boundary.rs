use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions a command recovers from.
/// These are reported to the user on stderr and the command carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The repository had no tag to increment, so the first tag was created
    NoExistingTag { repository: PathBuf, seed: String },
    /// `--after-success` found no successful Xcode build, so nothing was built
    BuildNotSucceeded { build_dir: String },
    /// `--after-success` was given but no build directory was known
    BuildDirectoryUnset,
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoExistingTag { repository, seed } => {
                write!(
                    f,
                    "No existing tag in '{}', created initial tag '{}'",
                    repository.display(),
                    seed
                )
            }
            BoundaryWarning::BuildNotSucceeded { build_dir } => {
                write!(
                    f,
                    "Last Xcode build in '{}' did not succeed, skipping docker build",
                    build_dir
                )
            }
            BoundaryWarning::BuildDirectoryUnset => {
                write!(
                    f,
                    "--after-success needs a build directory (BUILD_DIR is not set), building anyway"
                )
            }
        }
    }
}
