use std::fmt;

/// Swift build configuration passed to `swift build -c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildConfiguration {
    #[default]
    Debug,
    Release,
}

impl BuildConfiguration {
    /// Parse case-insensitively. Unrecognized input falls back to debug.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("release") {
            BuildConfiguration::Release
        } else {
            BuildConfiguration::Debug
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "debug",
            BuildConfiguration::Release => "release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags applied to a `docker run` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerRunOption {
    /// `--rm`
    RemoveWhenDone,
}

impl DockerRunOption {
    pub fn as_flag(&self) -> &'static str {
        match self {
            DockerRunOption::RemoveWhenDone => "--rm",
        }
    }
}
