use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::{GitTagComponent, S3Credentials};
use crate::error::{Result, XcHelperError};
use crate::git::tagger::DEFAULT_REMOTE;
use crate::git::{MockRepository, TagManager};
use crate::toolchain::{DockerBuildRequest, Toolchain};

/// One recorded [Toolchain] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    UpdateMacOsPackages {
        dir: PathBuf,
    },
    UpdateDockerPackages {
        dir: PathBuf,
        image: String,
        volume: String,
    },
    DockerBuild(DockerBuildRequest),
    Clean {
        dir: PathBuf,
    },
    SymlinkDependencies {
        dir: PathBuf,
    },
    GenerateXcodeProject {
        dir: PathBuf,
    },
    CreateArchive {
        archive: PathBuf,
        files: Vec<PathBuf>,
        flat: bool,
    },
    UploadArchive {
        archive: PathBuf,
        bucket: String,
        region: String,
        credentials: S3Credentials,
    },
    GitTag {
        dir: PathBuf,
        version: String,
    },
    IncrementGitTag {
        dir: PathBuf,
        component: GitTagComponent,
    },
    PushGitTag {
        dir: PathBuf,
        tag: String,
    },
    CreateXcarchive {
        path: PathBuf,
        name: String,
        scheme: String,
    },
}

/// In-memory [Toolchain] that records every call.
///
/// Git operations run the real tag rules against a [MockRepository], so
/// `increment_git_tag` reports `NoTag` on an untagged repository.
#[derive(Debug, Default)]
pub struct RecordingToolchain {
    calls: Mutex<Vec<Call>>,
    repo: MockRepository,
    tool_failure: Option<(String, i32)>,
}

impl RecordingToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(mut self, repo: MockRepository) -> Self {
        self.repo = repo;
        self
    }

    /// Make every non-git call fail as if `program` exited with `code`.
    pub fn failing_tool(mut self, program: impl Into<String>, code: i32) -> Self {
        self.tool_failure = Some((program.into(), code));
        self
    }

    /// Calls in the order they were made.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    pub fn repository(&self) -> &MockRepository {
        &self.repo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: Call) -> Result<()> {
        self.lock().push(call);
        match &self.tool_failure {
            Some((program, code)) => Err(XcHelperError::Tool {
                program: program.clone(),
                code: *code,
                stderr: String::new(),
            }),
            None => Ok(()),
        }
    }

    fn tags(&self) -> TagManager<'_, MockRepository> {
        TagManager::new(&self.repo, DEFAULT_REMOTE)
    }
}

impl Toolchain for RecordingToolchain {
    fn update_macos_packages(&self, dir: &Path) -> Result<()> {
        self.record(Call::UpdateMacOsPackages {
            dir: dir.to_path_buf(),
        })
    }

    fn update_docker_packages(&self, dir: &Path, image: &str, volume: &str) -> Result<()> {
        self.record(Call::UpdateDockerPackages {
            dir: dir.to_path_buf(),
            image: image.to_string(),
            volume: volume.to_string(),
        })
    }

    fn docker_build(&self, request: &DockerBuildRequest) -> Result<()> {
        self.record(Call::DockerBuild(request.clone()))
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        self.record(Call::Clean {
            dir: dir.to_path_buf(),
        })
    }

    fn symlink_dependencies(&self, dir: &Path) -> Result<()> {
        self.record(Call::SymlinkDependencies {
            dir: dir.to_path_buf(),
        })
    }

    fn generate_xcode_project(&self, dir: &Path) -> Result<()> {
        self.record(Call::GenerateXcodeProject {
            dir: dir.to_path_buf(),
        })
    }

    fn create_archive(&self, archive: &Path, files: &[PathBuf], flat: bool) -> Result<()> {
        self.record(Call::CreateArchive {
            archive: archive.to_path_buf(),
            files: files.to_vec(),
            flat,
        })
    }

    fn upload_archive(
        &self,
        archive: &Path,
        bucket: &str,
        region: &str,
        credentials: &S3Credentials,
    ) -> Result<()> {
        self.record(Call::UploadArchive {
            archive: archive.to_path_buf(),
            bucket: bucket.to_string(),
            region: region.to_string(),
            credentials: credentials.clone(),
        })
    }

    fn git_tag(&self, dir: &Path, version: &str) -> Result<()> {
        self.lock().push(Call::GitTag {
            dir: dir.to_path_buf(),
            version: version.to_string(),
        });
        self.tags().tag(version)
    }

    fn increment_git_tag(&self, dir: &Path, component: GitTagComponent) -> Result<String> {
        self.lock().push(Call::IncrementGitTag {
            dir: dir.to_path_buf(),
            component,
        });
        self.tags().increment(component)
    }

    fn push_git_tag(&self, dir: &Path, tag: &str) -> Result<()> {
        self.lock().push(Call::PushGitTag {
            dir: dir.to_path_buf(),
            tag: tag.to_string(),
        });
        self.tags().push(tag)
    }

    fn create_xcarchive(&self, path: &Path, name: &str, scheme: &str) -> Result<PathBuf> {
        self.record(Call::CreateXcarchive {
            path: path.to_path_buf(),
            name: name.to_string(),
            scheme: scheme.to_string(),
        })?;
        Ok(path.to_path_buf())
    }
}
