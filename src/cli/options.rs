//! Declarative command table.
//!
//! Every command and its sub-options are `const` [CliOption] records. The first
//! key of an option is its canonical key in an
//! [ArgumentIndex](crate::cli::args::ArgumentIndex); the all-uppercase key is
//! the environment variable consulted when the flag is absent.

/// Handler selector for top-level commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    UpdateMacOsPackages,
    UpdateDockerPackages,
    DockerBuild,
    Clean,
    SymlinkDependencies,
    CreateArchive,
    UploadArchive,
    GitTag,
    CreateXcarchive,
}

/// Value used when an option is not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Literal(&'static str),
    /// Read from another environment variable at resolution time.
    Environment(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliOption {
    pub keys: &'static [&'static str],
    pub description: &'static str,
    pub usage: Option<&'static str>,
    pub requires_value: bool,
    pub default_value: Option<DefaultValue>,
    /// Value name of the trailing positional, for commands that take paths.
    pub positional: Option<&'static str>,
    /// Whether the positional takes any number of paths instead of exactly one.
    pub positional_list: bool,
    pub required: &'static [CliOption],
    pub optional: &'static [CliOption],
    pub command: Option<CommandKind>,
}

impl CliOption {
    pub const fn new(keys: &'static [&'static str], description: &'static str) -> Self {
        CliOption {
            keys,
            description,
            usage: None,
            requires_value: false,
            default_value: None,
            positional: None,
            positional_list: false,
            required: &[],
            optional: &[],
            command: None,
        }
    }

    pub const fn usage(self, usage: &'static str) -> Self {
        CliOption {
            usage: Some(usage),
            ..self
        }
    }

    pub const fn requires_value(self) -> Self {
        CliOption {
            requires_value: true,
            ..self
        }
    }

    pub const fn default_value(self, value: &'static str) -> Self {
        CliOption {
            default_value: Some(DefaultValue::Literal(value)),
            ..self
        }
    }

    pub const fn default_from_env(self, variable: &'static str) -> Self {
        CliOption {
            default_value: Some(DefaultValue::Environment(variable)),
            ..self
        }
    }

    pub const fn positional(self, value_name: &'static str) -> Self {
        CliOption {
            positional: Some(value_name),
            positional_list: false,
            ..self
        }
    }

    pub const fn positional_list(self, value_name: &'static str) -> Self {
        CliOption {
            positional: Some(value_name),
            positional_list: true,
            ..self
        }
    }

    pub const fn required(self, options: &'static [CliOption]) -> Self {
        CliOption {
            required: options,
            ..self
        }
    }

    pub const fn optional(self, options: &'static [CliOption]) -> Self {
        CliOption {
            optional: options,
            ..self
        }
    }

    pub const fn handled_by(self, kind: CommandKind) -> Self {
        CliOption {
            command: Some(kind),
            ..self
        }
    }

    /// Key used in the argument index.
    pub fn key(&self) -> &'static str {
        self.keys.first().copied().unwrap_or_default()
    }

    /// The all-uppercase environment key, if any.
    pub fn env_key(&self) -> Option<&'static str> {
        self.keys.iter().copied().find(|key| is_env_key(key))
    }

    /// Single-character flag from a `-x` key.
    pub fn short_flag(&self) -> Option<char> {
        self.keys.iter().find_map(|key| {
            let rest = key.strip_prefix('-')?;
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '-' => Some(c),
                _ => None,
            }
        })
    }

    /// Long flag name from a `--xxx` key.
    pub fn long_flag(&self) -> Option<&'static str> {
        self.keys.iter().find_map(|key| key.strip_prefix("--"))
    }

    /// Whether `token` names this option by any key.
    pub fn matches(&self, token: &str) -> bool {
        self.keys.contains(&token)
    }

    /// Required sub-options followed by optional ones.
    pub fn sub_options(&self) -> impl Iterator<Item = &'static CliOption> {
        let (required, optional) = (self.required, self.optional);
        required.iter().chain(optional.iter())
    }

    pub fn keys_owned(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.to_string()).collect()
    }
}

/// Environment keys are all-uppercase and are not flags.
pub fn is_env_key(key: &str) -> bool {
    !key.starts_with('-')
        && key.chars().any(|c| c.is_ascii_uppercase())
        && !key.chars().any(|c| c.is_ascii_lowercase())
}

/// Named set of options, for help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliOptionGroup {
    pub description: &'static str,
    pub options: &'static [CliOption],
}

const CHDIR_DESCRIPTION: &str = "Change the current working directory.";
const DEFAULT_IMAGE: &str = "saltzmanjoelh/swiftubuntu";

pub mod update_macos_packages {
    use super::*;

    pub const CHANGE_DIRECTORY: CliOption = CliOption::new(
        &["-d", "--chdir", "UPDATE_MACOS_PACKAGES_CHDIR"],
        CHDIR_DESCRIPTION,
    )
    .requires_value();

    pub const GENERATE_XCODE_PROJECT: CliOption = CliOption::new(
        &["-g", "--generate", "UPDATE_PACKAGES_GENERATE_XCPROJECT"],
        "Generate a new Xcode project after updating.",
    );

    pub const SYMLINK: CliOption = CliOption::new(
        &["-s", "--symlink", "UPDATE_PACKAGES_SYMLINK"],
        "Symlink the updated dependencies into 'Packages' so the existing Xcode project keeps working.",
    );

    const OPTIONAL: &[CliOption] = &[CHANGE_DIRECTORY, GENERATE_XCODE_PROJECT, SYMLINK];

    pub const COMMAND: CliOption = CliOption::new(
        &["update-macos-packages", "UPDATE_MACOS_PACKAGES"],
        "Update package dependencies with 'swift package update' without breaking Xcode file references.",
    )
    .usage("xchelper update-macos-packages [OPTIONS]")
    .optional(OPTIONAL)
    .handled_by(CommandKind::UpdateMacOsPackages);
}

pub mod update_docker_packages {
    use super::*;

    pub const CHANGE_DIRECTORY: CliOption = CliOption::new(
        &["-d", "--chdir", "UPDATE_DOCKER_PACKAGES_CHDIR"],
        CHDIR_DESCRIPTION,
    )
    .requires_value();

    pub const IMAGE_NAME: CliOption = CliOption::new(
        &["-i", "--image-name", "UPDATE_DOCKER_PACKAGES_IMAGE_NAME"],
        "The Docker image to run the update in.",
    )
    .requires_value()
    .default_value(DEFAULT_IMAGE);

    pub const VOLUME_NAME: CliOption = CliOption::new(
        &["-v", "--volume", "UPDATE_DOCKER_PACKAGES_PERSISTENT_VOLUME"],
        "Build directory name under .build that keeps Linux packages apart from macOS ones.",
    )
    .requires_value()
    .default_value("Docker");

    const REQUIRED: &[CliOption] = &[IMAGE_NAME];
    const OPTIONAL: &[CliOption] = &[CHANGE_DIRECTORY, VOLUME_NAME];

    pub const COMMAND: CliOption = CliOption::new(
        &["update-docker-packages", "UPDATE_DOCKER_PACKAGES"],
        "Update the packages for your Docker container in its persistent build directory.",
    )
    .usage("xchelper update-docker-packages [OPTIONS]")
    .required(REQUIRED)
    .optional(OPTIONAL)
    .handled_by(CommandKind::UpdateDockerPackages);
}

pub mod docker_build {
    use super::*;

    pub const BUILD_ON_SUCCESS: CliOption = CliOption::new(
        &["-s", "--after-success", "DOCKER_BUILD_AFTER_SUCCESS"],
        "Only build after a successful macOS build (reads the build directory from BUILD_DIR). Reduces duplicate errors in Xcode.",
    )
    .default_from_env("BUILD_DIR");

    pub const CHANGE_DIRECTORY: CliOption =
        CliOption::new(&["-d", "--chdir", "DOCKER_BUILD_CHDIR"], CHDIR_DESCRIPTION)
            .requires_value();

    pub const BUILD_CONFIGURATION: CliOption = CliOption::new(
        &["-c", "--build-configuration", "DOCKER_BUILD_CONFIGURATION"],
        "debug or release mode",
    )
    .requires_value()
    .default_value("debug");

    pub const IMAGE_NAME: CliOption = CliOption::new(
        &["-i", "--image-name", "DOCKER_BUILD_IMAGE_NAME"],
        "The Docker image to build in.",
    )
    .requires_value()
    .default_value(DEFAULT_IMAGE);

    pub const VOLUME_NAME: CliOption = CliOption::new(
        &["-v", "--persistent-volume", "DOCKER_BUILD_PERSISTENT_VOLUME"],
        "Subdirectory of .build for this platform, keeping macOS and Docker build files apart.",
    )
    .usage("-v [PLATFORM_NAME] ie: -v android")
    .requires_value();

    const OPTIONAL: &[CliOption] = &[
        BUILD_ON_SUCCESS,
        CHANGE_DIRECTORY,
        BUILD_CONFIGURATION,
        IMAGE_NAME,
        VOLUME_NAME,
    ];

    pub const COMMAND: CliOption = CliOption::new(
        &["docker-build", "DOCKER_BUILD"],
        "Build a Swift package in Linux and have the build errors appear in Xcode.",
    )
    .usage("xchelper docker-build [OPTIONS]")
    .optional(OPTIONAL)
    .handled_by(CommandKind::DockerBuild);
}

pub mod clean {
    use super::*;

    pub const CHANGE_DIRECTORY: CliOption =
        CliOption::new(&["-d", "--chdir", "CLEAN_CHDIR"], CHDIR_DESCRIPTION).requires_value();

    const OPTIONAL: &[CliOption] = &[CHANGE_DIRECTORY];

    pub const COMMAND: CliOption = CliOption::new(
        &["clean", "CLEAN"],
        "Remove the package's build artifacts with 'swift package clean'.",
    )
    .usage("xchelper clean [OPTIONS]")
    .optional(OPTIONAL)
    .handled_by(CommandKind::Clean);
}

pub mod symlink_dependencies {
    use super::*;

    pub const CHANGE_DIRECTORY: CliOption = CliOption::new(
        &["-d", "--chdir", "SYMLINK_DEPENDENCIES_CHDIR"],
        CHDIR_DESCRIPTION,
    )
    .requires_value();

    const OPTIONAL: &[CliOption] = &[CHANGE_DIRECTORY];

    pub const COMMAND: CliOption = CliOption::new(
        &["symlink-dependencies", "SYMLINK_DEPENDENCIES"],
        "Symlink dependency checkouts into 'Packages' so you don't have to generate a new Xcode project.",
    )
    .usage("xchelper symlink-dependencies [OPTIONS]")
    .optional(OPTIONAL)
    .handled_by(CommandKind::SymlinkDependencies);
}

pub mod create_archive {
    use super::*;

    pub const FLAT_LIST: CliOption = CliOption::new(
        &["-f", "--flat-list", "CREATE_ARCHIVE_FLAT_LIST"],
        "Put all the files in a flat list instead of keeping the directory structure.",
    );

    const OPTIONAL: &[CliOption] = &[FLAT_LIST];

    pub const COMMAND: CliOption = CliOption::new(
        &["create-archive", "CREATE_ARCHIVE"],
        "Archive files with tar.",
    )
    .usage("xchelper create-archive ARCHIVE_PATH FILES [OPTIONS]. ARCHIVE_PATH is the path of the archive to create. FILES is a space separated list of paths to archive.")
    .positional_list("ARCHIVE_PATH FILES")
    .optional(OPTIONAL)
    .handled_by(CommandKind::CreateArchive);
}

pub mod upload_archive {
    use super::*;

    pub const BUCKET: CliOption = CliOption::new(
        &["-b", "--bucket", "UPLOAD_ARCHIVE_S3_BUCKET"],
        "The bucket to upload the archive to.",
    )
    .requires_value();

    pub const REGION: CliOption = CliOption::new(
        &["-r", "--region", "UPLOAD_ARCHIVE_S3_REGION"],
        "The bucket's region.",
    )
    .requires_value()
    .default_value("us-east-1");

    pub const KEY: CliOption = CliOption::new(
        &["-k", "--key", "UPLOAD_ARCHIVE_S3_KEY"],
        "The S3 access key.",
    )
    .requires_value();

    pub const SECRET: CliOption = CliOption::new(
        &["-s", "--secret", "UPLOAD_ARCHIVE_S3_SECRET"],
        "The secret for the access key.",
    )
    .requires_value();

    pub const CREDENTIALS_FILE: CliOption = CliOption::new(
        &["-d", "--credentials", "UPLOAD_ARCHIVE_CREDENTIALS"],
        "AWS credentials file to use instead of a key and secret.",
    )
    .requires_value();

    const REQUIRED: &[CliOption] = &[BUCKET, REGION];
    const OPTIONAL: &[CliOption] = &[KEY, SECRET, CREDENTIALS_FILE];

    pub const COMMAND: CliOption = CliOption::new(
        &["upload-archive", "UPLOAD_ARCHIVE"],
        "Upload an archive to S3.",
    )
    .usage("xchelper upload-archive ARCHIVE_PATH [OPTIONS]. ARCHIVE_PATH is the archive to upload.")
    .requires_value()
    .positional("ARCHIVE_PATH")
    .required(REQUIRED)
    .optional(OPTIONAL)
    .handled_by(CommandKind::UploadArchive);
}

pub mod git_tag {
    use super::*;

    pub const CHANGE_DIRECTORY: CliOption =
        CliOption::new(&["-d", "--chdir", "GIT_TAG_CHDIR"], CHDIR_DESCRIPTION).requires_value();

    pub const VERSION: CliOption = CliOption::new(
        &["-v", "--version", "GIT_TAG_VERSION"],
        "Specify exactly what the version should be.",
    )
    .requires_value();

    pub const INCREMENT: CliOption = CliOption::new(
        &["-i", "--increment", "GIT_TAG_INCREMENT"],
        "Increment a portion of the repo's latest tag. Valid values are [major, minor, patch]",
    )
    .requires_value()
    .default_value("patch");

    pub const PUSH: CliOption = CliOption::new(
        &["-p", "--push", "GIT_TAG_PUSH"],
        "Push the current branch and then the new tag to the remote.",
    );

    const OPTIONAL: &[CliOption] = &[CHANGE_DIRECTORY, VERSION, INCREMENT, PUSH];

    pub const COMMAND: CliOption = CliOption::new(
        &["git-tag", "GIT_TAG"],
        "Update your package's git repo's semantic versioned tag.",
    )
    .usage("xchelper git-tag [OPTIONS]")
    .optional(OPTIONAL)
    .handled_by(CommandKind::GitTag);
}

pub mod create_xcarchive {
    use super::*;

    pub const NAME: CliOption = CliOption::new(
        &["-n", "--name", "CREATE_PLIST_APP_NAME"],
        "The app name for the `Name` field of the Info.plist.",
    )
    .requires_value();

    pub const SCHEME: CliOption = CliOption::new(
        &["-s", "--scheme", "CREATE_PLIST_SCHEME"],
        "The scheme name for the `SchemeName` field of the Info.plist.",
    )
    .requires_value();

    const REQUIRED: &[CliOption] = &[NAME, SCHEME];

    pub const COMMAND: CliOption = CliOption::new(
        &["create-xcarchive", "CREATE_XCARCHIVE"],
        "Store your built binary in an xcarchive so Xcode's Organizer can keep track of it.",
    )
    .usage("xchelper create-xcarchive XCARCHIVE_PATH [OPTIONS]. XCARCHIVE_PATH is the .xcarchive directory to create the Info.plist in.")
    .requires_value()
    .positional("XCARCHIVE_PATH")
    .required(REQUIRED)
    .handled_by(CommandKind::CreateXcarchive);
}

const COMMANDS: &[CliOption] = &[
    update_macos_packages::COMMAND,
    update_docker_packages::COMMAND,
    docker_build::COMMAND,
    clean::COMMAND,
    symlink_dependencies::COMMAND,
    create_archive::COMMAND,
    upload_archive::COMMAND,
    git_tag::COMMAND,
    create_xcarchive::COMMAND,
];

const GROUPS: &[CliOptionGroup] = &[CliOptionGroup {
    description: "Commands:",
    options: COMMANDS,
}];

/// Read-only view over the command table.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    groups: &'static [CliOptionGroup],
}

impl Registry {
    pub fn new() -> Self {
        Registry { groups: GROUPS }
    }

    pub fn with_groups(groups: &'static [CliOptionGroup]) -> Self {
        Registry { groups }
    }

    pub fn groups(&self) -> &'static [CliOptionGroup] {
        self.groups
    }

    pub fn commands(&self) -> impl Iterator<Item = &'static CliOption> {
        let groups = self.groups;
        groups.iter().flat_map(|group| group.options.iter())
    }

    /// Command whose keys include `token` (case-sensitive).
    pub fn find_command(&self, token: &str) -> Option<&'static CliOption> {
        self.commands().find(|command| command.matches(token))
    }

    /// Canonical command names, for error listings.
    pub fn command_names(&self) -> Vec<String> {
        self.commands().map(|c| c.key().to_string()).collect()
    }

    /// Every environment key a command or option answers to.
    pub fn environment_keys(&self) -> Vec<&'static str> {
        self.commands()
            .flat_map(|command| std::iter::once(command).chain(command.sub_options()))
            .filter_map(|option| option.env_key())
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
