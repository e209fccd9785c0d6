use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::{Config, ToolsConfig};
use crate::domain::{GitTagComponent, S3Credentials};
use crate::error::{Result, XcHelperError};
use crate::git::{Git2Repository, TagManager};
use crate::process::{Invocation, OutputMode, ProcessRunner};
use crate::toolchain::{DockerBuildRequest, Toolchain};

/// Directory under the package root where dependency checkouts live.
pub const CHECKOUTS_DIR: &str = ".build/checkouts";

/// Directory Xcode projects reference dependencies through.
pub const PACKAGES_DIR: &str = "Packages";

const ARCHIVE_VERSION: u32 = 2;

/// [Toolchain] backed by real executables.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    runner: ProcessRunner,
    tools: ToolsConfig,
    remote: String,
}

impl SystemToolchain {
    pub fn new(config: &Config) -> Self {
        SystemToolchain {
            runner: ProcessRunner::new(),
            tools: config.tools.clone(),
            remote: config.git.remote.clone(),
        }
    }

    fn stream(&self, invocation: Invocation) -> Result<()> {
        self.runner.run(&invocation, OutputMode::Stream)?;
        Ok(())
    }

    /// `docker run` prefix that mounts `dir` at the same path inside the
    /// container, so compiler diagnostics point at host files.
    fn docker_run(&self, dir: &Path, run_flags: &[&str], image: &str) -> Invocation {
        let mount = format!("{0}:{0}", dir.display());
        Invocation::new(&self.tools.docker)
            .arg("run")
            .args(run_flags.iter().copied())
            .args(["-v", mount.as_str(), "-w"])
            .arg(dir.display().to_string())
            .arg(image)
    }
}

fn build_path(volume: &str) -> String {
    format!(".build/{}", volume)
}

impl Toolchain for SystemToolchain {
    fn update_macos_packages(&self, dir: &Path) -> Result<()> {
        self.stream(
            Invocation::new(&self.tools.swift)
                .args(["package", "update"])
                .current_dir(dir),
        )?;
        info!(dir = %dir.display(), "updated packages");
        Ok(())
    }

    fn update_docker_packages(&self, dir: &Path, image: &str, volume: &str) -> Result<()> {
        let invocation = self
            .docker_run(dir, &["--rm"], image)
            .args(["swift", "package", "--build-path"])
            .arg(build_path(volume))
            .arg("update");
        self.stream(invocation)?;
        info!(dir = %dir.display(), image, volume, "updated docker packages");
        Ok(())
    }

    fn docker_build(&self, request: &DockerBuildRequest) -> Result<()> {
        let flags: Vec<&str> = request.run_options.iter().map(|o| o.as_flag()).collect();
        let mut invocation = self
            .docker_run(&request.source_dir, &flags, &request.image)
            .args(["swift", "build", "-c", request.configuration.as_str()]);
        if let Some(volume) = &request.volume {
            invocation = invocation.arg("--build-path").arg(build_path(volume));
        }
        self.stream(invocation)?;
        info!(
            dir = %request.source_dir.display(),
            configuration = %request.configuration,
            "docker build finished"
        );
        Ok(())
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        self.stream(
            Invocation::new(&self.tools.swift)
                .args(["package", "clean"])
                .current_dir(dir),
        )
    }

    fn symlink_dependencies(&self, dir: &Path) -> Result<()> {
        let checkouts = dir.join(CHECKOUTS_DIR);
        let packages = dir.join(PACKAGES_DIR);

        let entries = fs::read_dir(&checkouts)
            .with_context(|| format!("Cannot read {}", checkouts.display()))?;
        fs::create_dir_all(&packages)
            .with_context(|| format!("Cannot create {}", packages.display()))?;

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let link = packages.join(&name);
            let target = Path::new("..").join(CHECKOUTS_DIR).join(&name);

            if let Ok(meta) = fs::symlink_metadata(&link) {
                if !meta.file_type().is_symlink() {
                    debug!(path = %link.display(), "keeping existing directory");
                    continue;
                }
                fs::remove_file(&link)
                    .with_context(|| format!("Cannot remove stale link {}", link.display()))?;
            }

            make_symlink(&target, &link)?;
            debug!(link = %link.display(), target = %target.display(), "linked dependency");
        }

        info!(dir = %packages.display(), "symlinked dependencies");
        Ok(())
    }

    fn generate_xcode_project(&self, dir: &Path) -> Result<()> {
        self.stream(
            Invocation::new(&self.tools.swift)
                .args(["package", "generate-xcodeproj"])
                .current_dir(dir),
        )
    }

    fn create_archive(&self, archive: &Path, files: &[PathBuf], flat: bool) -> Result<()> {
        if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }

        let mut invocation = Invocation::new(&self.tools.tar)
            .arg("-czf")
            .arg(archive.display().to_string());
        for file in files {
            match (flat, file.parent(), file.file_name()) {
                (true, Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                    invocation = invocation
                        .arg("-C")
                        .arg(parent.display().to_string())
                        .arg(name.to_string_lossy());
                }
                _ => invocation = invocation.arg(file.display().to_string()),
            }
        }

        self.runner.run(&invocation, OutputMode::Capture)?;
        info!(archive = %archive.display(), files = files.len(), "created archive");
        Ok(())
    }

    fn upload_archive(
        &self,
        archive: &Path,
        bucket: &str,
        region: &str,
        credentials: &S3Credentials,
    ) -> Result<()> {
        let file_name = archive
            .file_name()
            .ok_or_else(|| {
                XcHelperError::invalid_argument(format!(
                    "'{}' does not name a file",
                    archive.display()
                ))
            })?
            .to_string_lossy();
        let destination = format!("s3://{}/{}", bucket, file_name);

        let invocation = Invocation::new(&self.tools.aws)
            .args(["s3", "cp"])
            .arg(archive.display().to_string())
            .arg(destination.as_str())
            .args(["--region", region])
            .envs(credentials.to_env_vars());
        self.runner.run(&invocation, OutputMode::Capture)?;
        info!(archive = %archive.display(), %destination, "uploaded archive");
        Ok(())
    }

    fn git_tag(&self, dir: &Path, version: &str) -> Result<()> {
        let repo = Git2Repository::open(dir)?;
        TagManager::new(&repo, self.remote.as_str()).tag(version)
    }

    fn increment_git_tag(&self, dir: &Path, component: GitTagComponent) -> Result<String> {
        let repo = Git2Repository::open(dir)?;
        TagManager::new(&repo, self.remote.as_str()).increment(component)
    }

    fn push_git_tag(&self, dir: &Path, tag: &str) -> Result<()> {
        let repo = Git2Repository::open(dir)?;
        TagManager::new(&repo, self.remote.as_str()).push(tag)
    }

    fn create_xcarchive(&self, path: &Path, name: &str, scheme: &str) -> Result<PathBuf> {
        let products = path.join("Products");
        fs::create_dir_all(&products)
            .with_context(|| format!("Cannot create {}", products.display()))?;

        let plist_path = path.join("Info.plist");
        fs::write(&plist_path, info_plist(name, scheme, Utc::now()))
            .with_context(|| format!("Cannot write {}", plist_path.display()))?;

        info!(archive = %path.display(), name, scheme, "created xcarchive");
        Ok(path.to_path_buf())
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Cannot link {} to {}", link.display(), target.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, link: &Path) -> Result<()> {
    Err(XcHelperError::invalid_argument(format!(
        "Cannot create {}: symbolic links are only supported on unix",
        link.display()
    )))
}

/// Info.plist contents for an Xcode Organizer archive.
pub fn info_plist(name: &str, scheme: &str, created: DateTime<Utc>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>ArchiveVersion</key>
	<integer>{}</integer>
	<key>CreationDate</key>
	<date>{}</date>
	<key>Name</key>
	<string>{}</string>
	<key>SchemeName</key>
	<string>{}</string>
</dict>
</plist>
"#,
        ARCHIVE_VERSION,
        created.format("%Y-%m-%dT%H:%M:%SZ"),
        escape_xml(name),
        escape_xml(scheme),
    )
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
