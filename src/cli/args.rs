//! Argument resolution: process arguments + environment -> [ArgumentIndex].

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use tracing::debug;

use crate::cli::options::{CliOption, DefaultValue};
use crate::config::Config;
use crate::error::{Result, XcHelperError};

/// Option key -> values supplied for one invocation.
///
/// A key that is absent was not supplied. Order of values is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentIndex {
    values: HashMap<String, Vec<String>>,
}

impl ArgumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.values.insert(key.into(), values);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(|v| v.as_slice())
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.first()).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Convert process arguments to UTF-8, rejecting any that are not.
pub fn utf8_args<I>(args: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| {
                XcHelperError::Usage(format!(
                    "Argument is not valid UTF-8: {}",
                    raw.to_string_lossy()
                ))
            })
        })
        .collect()
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    CommandLine,
    Environment,
    Config,
    Default,
}

/// Build the clap parser for one command from its option table.
pub fn clap_command(command: &CliOption) -> Command {
    let mut cmd = Command::new(command.key())
        .no_binary_name(true)
        .about(command.description)
        .disable_version_flag(true);

    if let Some(usage) = command.usage {
        cmd = cmd.override_usage(usage);
    }

    for option in command.sub_options() {
        cmd = cmd.arg(clap_arg(option));
    }

    if let Some(value_name) = command.positional {
        let arg = Arg::new(command.key()).value_name(value_name);
        cmd = cmd.arg(if command.positional_list {
            arg.num_args(1..).action(ArgAction::Append)
        } else {
            arg.num_args(1).action(ArgAction::Set)
        });
    }

    cmd
}

fn clap_arg(option: &CliOption) -> Arg {
    let mut arg = Arg::new(option.key()).help(option.description);
    if let Some(short) = option.short_flag() {
        arg = arg.short(short);
    }
    if let Some(long) = option.long_flag() {
        arg = arg.long(long);
        if option.requires_value {
            arg = arg.value_name(long.to_uppercase());
        }
    }
    if let Some(env_key) = option.env_key() {
        arg = arg.long_help(format!("{} [env: {}]", option.description, env_key));
    }

    if option.requires_value {
        arg.action(ArgAction::Set).num_args(1)
    } else {
        arg.action(ArgAction::SetTrue)
    }
}

/// Rendered help for `command` when `args` ask for it in flag position.
///
/// `-h` given as an option value (`--version=-h`) or after `--` is not a
/// help request.
pub fn help_requested(command: &CliOption, args: &[String]) -> Option<String> {
    match clap_command(command).try_get_matches_from(args.iter()) {
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            Some(e.render().to_string().trim_end().to_string())
        }
        _ => None,
    }
}

/// Resolve the arguments of `command` into an [ArgumentIndex].
///
/// `args` are the tokens after the command name. Per option the first source
/// that has a value wins: command line, the option's environment key,
/// `[defaults]` in the config file, then the built-in default (value options
/// only). Pure function of its inputs.
pub fn resolve(
    command: &CliOption,
    args: &[String],
    env: &HashMap<String, String>,
    config: &Config,
) -> Result<ArgumentIndex> {
    let matches = clap_command(command)
        .try_get_matches_from(args.iter())
        .map_err(|e| {
            let rendered = e.render().to_string();
            XcHelperError::Usage(
                rendered
                    .trim_start_matches("error: ")
                    .trim_end()
                    .to_string(),
            )
        })?;

    let mut index = ArgumentIndex::new();

    for option in command.sub_options() {
        let key = option.key();

        let from_cli = if option.requires_value {
            matches
                .get_many::<String>(key)
                .map(|values| values.cloned().collect::<Vec<_>>())
        } else if matches.get_flag(key) {
            Some(default_values(option, env).unwrap_or_default())
        } else {
            None
        };

        let resolved = from_cli
            .map(|v| (v, ValueSource::CommandLine))
            .or_else(|| from_environment(option, env).map(|v| (v, ValueSource::Environment)))
            .or_else(|| from_config(option, config).map(|v| (v, ValueSource::Config)))
            .or_else(|| {
                option
                    .requires_value
                    .then(|| default_values(option, env))
                    .flatten()
                    .map(|v| (v, ValueSource::Default))
            });

        if let Some((values, source)) = resolved {
            debug!(command = command.key(), option = key, ?source, "resolved option");
            index.insert(key, values);
        }
    }

    if let Some(value_name) = command.positional {
        let positional = matches
            .get_many::<String>(command.key())
            .map(|values| values.cloned().collect::<Vec<_>>())
            .or_else(|| {
                let value = env.get(command.env_key()?)?;
                let values: Vec<String> = value.split_whitespace().map(String::from).collect();
                (!values.is_empty()).then_some(values)
            });
        if let Some(values) = positional {
            if !command.positional_list && values.len() > 1 {
                return Err(XcHelperError::Usage(format!(
                    "'{}' takes a single {}, got {}: {}",
                    command.key(),
                    value_name,
                    values.len(),
                    values.join(" ")
                )));
            }
            index.insert(command.key(), values);
        }
    }

    Ok(index)
}

fn from_environment(option: &CliOption, env: &HashMap<String, String>) -> Option<Vec<String>> {
    let value = env.get(option.env_key()?)?;
    (!value.is_empty()).then(|| vec![value.clone()])
}

fn from_config(option: &CliOption, config: &Config) -> Option<Vec<String>> {
    config
        .default_for(option.env_key()?)
        .map(|value| vec![value.to_string()])
}

fn default_values(option: &CliOption, env: &HashMap<String, String>) -> Option<Vec<String>> {
    match option.default_value? {
        DefaultValue::Literal(value) => Some(vec![value.to_string()]),
        DefaultValue::Environment(variable) => env
            .get(variable)
            .filter(|value| !value.is_empty())
            .map(|value| vec![value.clone()]),
    }
}

/// Directory a command works in: the change-directory option, resolved
/// against `cwd`, or `cwd` itself.
pub fn working_directory(index: &ArgumentIndex, key: &str, cwd: &Path) -> PathBuf {
    match index.first(key) {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            if dir.is_absolute() {
                dir
            } else {
                cwd.join(dir)
            }
        }
        None => cwd.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::options::{create_archive, docker_build, git_tag, upload_archive};

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_flag_beats_environment() {
        let index = resolve(
            &docker_build::COMMAND,
            &args(&["--image-name", "swift:5.10"]),
            &env(&[("DOCKER_BUILD_IMAGE_NAME", "swift:5.9")]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(index.first("-i"), Some("swift:5.10"));
    }

    #[test]
    fn test_environment_fallback() {
        let index = resolve(
            &docker_build::COMMAND,
            &[],
            &env(&[("DOCKER_BUILD_IMAGE_NAME", "swift:5.9")]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(index.first("-i"), Some("swift:5.9"));
    }

    #[test]
    fn test_config_default_between_env_and_builtin() {
        let mut config = Config::default();
        config
            .defaults
            .insert("DOCKER_BUILD_CONFIGURATION".to_string(), "release".to_string());

        let index = resolve(&docker_build::COMMAND, &[], &HashMap::new(), &config).unwrap();
        assert_eq!(index.first("-c"), Some("release"));

        let index = resolve(
            &docker_build::COMMAND,
            &[],
            &env(&[("DOCKER_BUILD_CONFIGURATION", "debug")]),
            &config,
        )
        .unwrap();
        assert_eq!(index.first("-c"), Some("debug"));
    }

    #[test]
    fn test_builtin_defaults() {
        let index =
            resolve(&docker_build::COMMAND, &[], &HashMap::new(), &Config::default()).unwrap();
        assert_eq!(index.first("-c"), Some("debug"));
        assert_eq!(index.first("-i"), Some("saltzmanjoelh/swiftubuntu"));
        assert!(!index.contains("-v"));
        assert!(!index.contains("-d"));
        assert!(!index.contains("-s"));
    }

    #[test]
    fn test_presence_flag_takes_default_from_environment() {
        let index = resolve(
            &docker_build::COMMAND,
            &args(&["-s"]),
            &env(&[("BUILD_DIR", "/derived/App/Build/Products")]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(index.first("-s"), Some("/derived/App/Build/Products"));
    }

    #[test]
    fn test_presence_flag_without_default_value() {
        let index = resolve(
            &docker_build::COMMAND,
            &args(&["--after-success"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(index.values("-s"), Some(&[][..]));
    }

    #[test]
    fn test_presence_flag_absent_ignores_build_dir() {
        let index = resolve(
            &docker_build::COMMAND,
            &[],
            &env(&[("BUILD_DIR", "/derived/App/Build/Products")]),
            &Config::default(),
        )
        .unwrap();
        assert!(!index.contains("-s"));
    }

    #[test]
    fn test_presence_flag_from_environment() {
        let index = resolve(
            &git_tag::COMMAND,
            &[],
            &env(&[("GIT_TAG_PUSH", "1")]),
            &Config::default(),
        )
        .unwrap();
        assert!(index.contains("-p"));
    }

    #[test]
    fn test_long_flag_with_equals() {
        let index = resolve(
            &git_tag::COMMAND,
            &args(&["--increment=minor", "-p"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(index.first("-i"), Some("minor"));
        assert!(index.contains("-p"));
    }

    #[test]
    fn test_positional_list_keeps_order() {
        let index = resolve(
            &create_archive::COMMAND,
            &args(&["-f", "out.tar.gz", "b", "a", "c"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(
            index.values("create-archive"),
            Some(&args(&["out.tar.gz", "b", "a", "c"])[..])
        );
        assert!(index.contains("-f"));
    }

    #[test]
    fn test_positional_list_from_environment() {
        let index = resolve(
            &create_archive::COMMAND,
            &[],
            &env(&[("CREATE_ARCHIVE", "out.tar.gz  one two")]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(
            index.values("create-archive"),
            Some(&args(&["out.tar.gz", "one", "two"])[..])
        );
    }

    #[test]
    fn test_single_path_rejects_extra_paths() {
        let err = resolve(
            &upload_archive::COMMAND,
            &args(&["a.tar", "b.tar", "-b", "bk", "-k", "k", "-s", "s"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, XcHelperError::Usage(_)));
        assert!(err.to_string().contains("b.tar"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_single_path_from_environment_rejects_list() {
        let err = resolve(
            &upload_archive::COMMAND,
            &[],
            &env(&[("UPLOAD_ARCHIVE", "a.tar b.tar")]),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, XcHelperError::Usage(_)));

        let index = resolve(
            &upload_archive::COMMAND,
            &[],
            &env(&[("UPLOAD_ARCHIVE", " a.tar ")]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(index.values("upload-archive"), Some(&args(&["a.tar"])[..]));
    }

    #[test]
    fn test_help_only_in_flag_position() {
        let help = help_requested(&docker_build::COMMAND, &args(&["-c", "release", "-h"]))
            .unwrap();
        assert!(help.contains("--after-success"));
        assert!(help_requested(&docker_build::COMMAND, &args(&["--help"])).is_some());

        assert!(help_requested(&create_archive::COMMAND, &args(&["out.tar", "--", "-h"])).is_none());
        assert!(help_requested(&git_tag::COMMAND, &args(&["--version=-h"])).is_none());
        assert!(help_requested(&git_tag::COMMAND, &args(&["-i", "minor"])).is_none());
    }

    #[test]
    fn test_file_named_like_help_flag_after_separator() {
        let index = resolve(
            &create_archive::COMMAND,
            &args(&["out.tar", "--", "-h"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(
            index.values("create-archive"),
            Some(&args(&["out.tar", "-h"])[..])
        );
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = resolve(
            &upload_archive::COMMAND,
            &args(&["a.tar.gz", "--bukket", "b"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, XcHelperError::Usage(_)));
        assert!(err.to_string().contains("--bukket"));
    }

    #[test]
    fn test_missing_value_is_usage_error() {
        let err = resolve(
            &git_tag::COMMAND,
            &args(&["--version"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, XcHelperError::Usage(_)));
    }

    #[test]
    fn test_stray_positional_is_usage_error() {
        let err = resolve(
            &git_tag::COMMAND,
            &args(&["1.0.0"]),
            &HashMap::new(),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, XcHelperError::Usage(_)));
    }

    #[test]
    fn test_empty_environment_value_is_absent() {
        let index = resolve(
            &upload_archive::COMMAND,
            &args(&["a.tar.gz"]),
            &env(&[("UPLOAD_ARCHIVE_S3_BUCKET", "")]),
            &Config::default(),
        )
        .unwrap();
        assert!(!index.contains("-b"));
        assert_eq!(index.first("-r"), Some("us-east-1"));
    }

    #[test]
    fn test_utf8_args() {
        let converted = utf8_args(vec![OsString::from("git-tag"), OsString::from("-p")]).unwrap();
        assert_eq!(converted, args(&["git-tag", "-p"]));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_is_usage_error() {
        use std::os::unix::ffi::OsStringExt;

        let err = utf8_args(vec![
            OsString::from("create-archive"),
            OsString::from_vec(vec![b'a', 0xff, b'.', b't', b'a', b'r']),
        ])
        .unwrap_err();
        assert!(matches!(err, XcHelperError::Usage(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_working_directory() {
        let cwd = Path::new("/work");
        let mut index = ArgumentIndex::new();
        assert_eq!(working_directory(&index, "-d", cwd), PathBuf::from("/work"));

        index.insert("-d", vec!["pkg".to_string()]);
        assert_eq!(working_directory(&index, "-d", cwd), PathBuf::from("/work/pkg"));

        index.insert("-d", vec!["/abs/pkg".to_string()]);
        assert_eq!(working_directory(&index, "-d", cwd), PathBuf::from("/abs/pkg"));
    }
}
