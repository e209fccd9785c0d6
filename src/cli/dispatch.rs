//! Command selection, validation and handler dispatch.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::cli::args::{help_requested, resolve, ArgumentIndex};
use crate::cli::handlers::{self, Handler, HandlerContext, Outcome};
use crate::cli::options::{CliOption, CommandKind, Registry};
use crate::config::Config;
use crate::error::{MissingArgument, Result, XcHelperError};
use crate::toolchain::Toolchain;
use crate::ui::format_usage;

/// One process invocation: arguments after the binary name, an environment
/// snapshot and the directory relative paths resolve against.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: PathBuf,
}

impl Request {
    pub fn new<I, S>(args: I, cwd: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Request {
            args: args.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
            cwd: cwd.into(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Help(String),
    Version(String),
    Completed {
        command: &'static str,
        outcome: Outcome,
    },
}

/// Routes a [Request] to the handler of the matching command.
pub struct Dispatcher<'a> {
    registry: Registry,
    toolchain: &'a dyn Toolchain,
    config: &'a Config,
}

impl<'a> Dispatcher<'a> {
    pub fn new(toolchain: &'a dyn Toolchain, config: &'a Config) -> Self {
        Dispatcher {
            registry: Registry::new(),
            toolchain,
            config,
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Run one request to completion.
    ///
    /// Nothing reaches the toolchain unless the command is known and every
    /// required argument is present.
    pub fn dispatch(&self, request: &Request) -> Result<Response> {
        let Some((token, rest)) = request.args.split_first() else {
            return Err(XcHelperError::MissingCommand(self.registry.command_names()));
        };

        match token.as_str() {
            "--help" | "-h" => return Ok(Response::Help(format_usage(&self.registry))),
            "--version" | "-V" => {
                return Ok(Response::Version(format!(
                    "xchelper {}",
                    env!("CARGO_PKG_VERSION")
                )))
            }
            _ => {}
        }

        let command =
            self.registry
                .find_command(token)
                .ok_or_else(|| XcHelperError::UnknownCommand {
                    command: token.clone(),
                    available: self.registry.command_names(),
                })?;

        if let Some(help) = help_requested(command, rest) {
            return Ok(Response::Help(help));
        }

        let index = resolve(command, rest, &request.env, self.config)?;

        let missing = missing_arguments(command, &index);
        if !missing.is_empty() {
            return Err(XcHelperError::MissingArguments(missing));
        }

        let kind = command.command.ok_or_else(|| {
            XcHelperError::invalid_argument(format!("'{}' has no handler", command.key()))
        })?;

        debug!(command = command.key(), arguments = index.len(), "dispatching");
        let outcome = handler_for(kind)(&HandlerContext {
            toolchain: self.toolchain,
            index: &index,
            cwd: &request.cwd,
        })?;

        Ok(Response::Completed {
            command: command.key(),
            outcome,
        })
    }
}

/// Every required sub-option absent from `index`, plus the positional list
/// when the command needs one.
pub fn missing_arguments(command: &CliOption, index: &ArgumentIndex) -> Vec<MissingArgument> {
    let mut missing: Vec<MissingArgument> = command
        .required
        .iter()
        .filter(|option| !index.contains(option.key()))
        .map(|option| MissingArgument {
            keys: option.keys_owned(),
        })
        .collect();

    if command.requires_value && !index.contains(command.key()) {
        let mut keys: Vec<String> = command.positional.map(String::from).into_iter().collect();
        keys.extend(command.env_key().map(String::from));
        missing.push(MissingArgument { keys });
    }

    missing
}

/// Handler for each command kind.
pub fn handler_for(kind: CommandKind) -> Handler {
    match kind {
        CommandKind::UpdateMacOsPackages => handlers::handle_update_macos_packages,
        CommandKind::UpdateDockerPackages => handlers::handle_update_docker_packages,
        CommandKind::DockerBuild => handlers::handle_docker_build,
        CommandKind::Clean => handlers::handle_clean,
        CommandKind::SymlinkDependencies => handlers::handle_symlink_dependencies,
        CommandKind::CreateArchive => handlers::handle_create_archive,
        CommandKind::UploadArchive => handlers::handle_upload_archive,
        CommandKind::GitTag => handlers::handle_git_tag,
        CommandKind::CreateXcarchive => handlers::handle_create_xcarchive,
    }
}
