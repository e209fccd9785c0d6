//! One function per command.
//!
//! Handlers read already-validated values out of the [ArgumentIndex] and
//! delegate to the [Toolchain]. Each returns an [Outcome]: an optional result
//! line for stdout plus any warnings it recovered from.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::boundary::BoundaryWarning;
use crate::build_log;
use crate::cli::args::{working_directory, ArgumentIndex};
use crate::cli::options::{
    clean, create_archive, create_xcarchive, docker_build, git_tag, symlink_dependencies,
    update_docker_packages, update_macos_packages, upload_archive, CliOption,
};
use crate::domain::{BuildConfiguration, DockerRunOption, GitTagComponent, S3Credentials};
use crate::error::{MissingArgument, Result, XcHelperError};
use crate::git::tagger::INITIAL_TAG;
use crate::toolchain::{DockerBuildRequest, Toolchain};

/// Inputs shared by every handler.
pub struct HandlerContext<'a> {
    pub toolchain: &'a dyn Toolchain,
    pub index: &'a ArgumentIndex,
    pub cwd: &'a Path,
}

impl HandlerContext<'_> {
    fn working_directory(&self, change_directory: &CliOption) -> PathBuf {
        working_directory(self.index, change_directory.key(), self.cwd)
    }

    fn path(&self, value: &str) -> PathBuf {
        self.cwd.join(value)
    }

    fn value(&self, option: &CliOption) -> Result<&str> {
        self.index.first(option.key()).ok_or_else(|| {
            XcHelperError::MissingArguments(vec![MissingArgument {
                keys: option.keys_owned(),
            }])
        })
    }

    fn positionals(&self, command: &CliOption) -> &[String] {
        self.index.values(command.key()).unwrap_or(&[])
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub output: Option<String>,
    pub warnings: Vec<BoundaryWarning>,
}

impl Outcome {
    pub fn output(line: impl Into<String>) -> Self {
        Outcome {
            output: Some(line.into()),
            warnings: Vec::new(),
        }
    }

    fn warn(mut self, warning: BoundaryWarning) -> Self {
        debug!(%warning, "recovered");
        self.warnings.push(warning);
        self
    }
}

pub type Handler = fn(&HandlerContext<'_>) -> Result<Outcome>;

pub fn handle_update_macos_packages(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let dir = ctx.working_directory(&update_macos_packages::CHANGE_DIRECTORY);
    ctx.toolchain.update_macos_packages(&dir)?;

    if ctx.index.contains(update_macos_packages::GENERATE_XCODE_PROJECT.key()) {
        ctx.toolchain.generate_xcode_project(&dir)?;
    }
    if ctx.index.contains(update_macos_packages::SYMLINK.key()) {
        ctx.toolchain.symlink_dependencies(&dir)?;
    }
    Ok(Outcome::default())
}

pub fn handle_update_docker_packages(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let dir = ctx.working_directory(&update_docker_packages::CHANGE_DIRECTORY);
    let image = ctx.value(&update_docker_packages::IMAGE_NAME)?;
    let volume = ctx.value(&update_docker_packages::VOLUME_NAME)?;
    ctx.toolchain.update_docker_packages(&dir, image, volume)?;
    Ok(Outcome::default())
}

pub fn handle_docker_build(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let dir = ctx.working_directory(&docker_build::CHANGE_DIRECTORY);
    let configuration = ctx
        .index
        .first(docker_build::BUILD_CONFIGURATION.key())
        .map(BuildConfiguration::parse)
        .unwrap_or_default();
    let image = ctx.value(&docker_build::IMAGE_NAME)?;
    let volume = ctx
        .index
        .first(docker_build::VOLUME_NAME.key())
        .map(String::from);

    let mut outcome = Outcome::default();
    if ctx.index.contains(docker_build::BUILD_ON_SUCCESS.key()) {
        match ctx.index.first(docker_build::BUILD_ON_SUCCESS.key()) {
            Some(build_dir) => {
                if !build_log::last_build_was_success(&ctx.path(build_dir))? {
                    return Ok(outcome.warn(BoundaryWarning::BuildNotSucceeded {
                        build_dir: build_dir.to_string(),
                    }));
                }
            }
            None => outcome = outcome.warn(BoundaryWarning::BuildDirectoryUnset),
        }
    }

    ctx.toolchain.docker_build(&DockerBuildRequest {
        source_dir: dir,
        run_options: vec![DockerRunOption::RemoveWhenDone],
        configuration,
        image: image.to_string(),
        volume,
    })?;
    Ok(outcome)
}

pub fn handle_clean(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let dir = ctx.working_directory(&clean::CHANGE_DIRECTORY);
    ctx.toolchain.clean(&dir)?;
    Ok(Outcome::default())
}

pub fn handle_symlink_dependencies(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let dir = ctx.working_directory(&symlink_dependencies::CHANGE_DIRECTORY);
    ctx.toolchain.symlink_dependencies(&dir)?;
    Ok(Outcome::default())
}

pub fn handle_create_archive(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let (archive, files) = match ctx.positionals(&create_archive::COMMAND).split_first() {
        None => return Err(XcHelperError::invalid_argument("You didn't provide any paths.")),
        Some((_, [])) => {
            return Err(XcHelperError::invalid_argument(
                "You didn't provide any files to archive.",
            ))
        }
        Some((archive, files)) => (archive, files),
    };

    let files: Vec<PathBuf> = files.iter().map(|f| ctx.path(f)).collect();
    let flat = ctx.index.contains(create_archive::FLAT_LIST.key());
    ctx.toolchain.create_archive(&ctx.path(archive), &files, flat)?;
    Ok(Outcome::default())
}

pub fn handle_upload_archive(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let archive = ctx
        .positionals(&upload_archive::COMMAND)
        .first()
        .ok_or_else(|| {
            XcHelperError::invalid_argument("You didn't provide the archive to upload.")
        })?;
    let bucket = ctx.value(&upload_archive::BUCKET)?;
    let region = ctx.value(&upload_archive::REGION)?;

    let key = ctx.index.first(upload_archive::KEY.key());
    let secret = ctx.index.first(upload_archive::SECRET.key());
    let file = ctx.index.first(upload_archive::CREDENTIALS_FILE.key());
    let credentials = match (key, secret, file) {
        (Some(key), Some(secret), _) => S3Credentials::KeyPair {
            key: key.to_string(),
            secret: secret.to_string(),
        },
        (_, _, Some(file)) => S3Credentials::File(ctx.path(file)),
        (Some(_), None, None) => {
            return Err(XcHelperError::invalid_argument(format!(
                "You provided a key without a secret {:?}",
                upload_archive::SECRET.keys
            )))
        }
        (None, Some(_), None) => {
            return Err(XcHelperError::invalid_argument(format!(
                "You provided a secret without a key {:?}",
                upload_archive::KEY.keys
            )))
        }
        (None, None, None) => {
            return Err(XcHelperError::invalid_argument(
                "You must provide either a credentials file or a key and secret",
            ))
        }
    };

    ctx.toolchain
        .upload_archive(&ctx.path(archive), bucket, region, &credentials)?;
    Ok(Outcome::default())
}

pub fn handle_git_tag(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let dir = ctx.working_directory(&git_tag::CHANGE_DIRECTORY);
    let mut outcome = Outcome::default();

    let tag = if let Some(version) = ctx.index.first(git_tag::VERSION.key()) {
        ctx.toolchain.git_tag(&dir, version)?;
        version.to_string()
    } else {
        let value = ctx.index.first(git_tag::INCREMENT.key()).ok_or_else(|| {
            XcHelperError::invalid_argument(format!(
                "You must provide either {:?} OR {:?}",
                git_tag::VERSION.keys,
                git_tag::INCREMENT.keys
            ))
        })?;
        let component = GitTagComponent::parse(value).ok_or_else(|| {
            XcHelperError::invalid_argument(format!(
                "Unknown value '{}' for {:?}",
                value,
                git_tag::INCREMENT.keys
            ))
        })?;

        match ctx.toolchain.increment_git_tag(&dir, component) {
            Ok(tag) => tag,
            Err(XcHelperError::NoTag(_)) => {
                ctx.toolchain.git_tag(&dir, INITIAL_TAG)?;
                outcome = outcome.warn(BoundaryWarning::NoExistingTag {
                    repository: dir.clone(),
                    seed: INITIAL_TAG.to_string(),
                });
                INITIAL_TAG.to_string()
            }
            Err(e) => return Err(e),
        }
    };

    if ctx.index.contains(git_tag::PUSH.key()) {
        ctx.toolchain.push_git_tag(&dir, &tag)?;
    }

    info!(tag = %tag, "git-tag finished");
    outcome.output = Some(tag);
    Ok(outcome)
}

pub fn handle_create_xcarchive(ctx: &HandlerContext<'_>) -> Result<Outcome> {
    let path = ctx
        .positionals(&create_xcarchive::COMMAND)
        .first()
        .ok_or_else(|| {
            XcHelperError::invalid_argument("You didn't provide the path to the xcarchive.")
        })?;
    let name = ctx.value(&create_xcarchive::NAME)?;
    let scheme = ctx.value(&create_xcarchive::SCHEME)?;

    let created = ctx
        .toolchain
        .create_xcarchive(&ctx.path(path), name, scheme)?;
    Ok(Outcome::output(created.display().to_string()))
}
