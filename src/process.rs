use crate::error::{Result, XcHelperError};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

/// How the child's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Output goes straight to the terminal. Used for long builds.
    Stream,
    /// Output is captured and returned.
    Capture,
}

/// A single external command invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn envs(mut self, vars: Vec<(String, String)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs external tools and turns non-zero exits into errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner
    }

    /// Run an invocation to completion.
    ///
    /// # Returns
    /// * `Ok(ProcessOutput)` if the program exits with code 0
    /// * `Err(XcHelperError::Tool)` if it cannot be started or exits non-zero.
    ///   The error carries the exit code and the captured stderr (empty in
    ///   stream mode, where stderr already reached the terminal).
    pub fn run(&self, invocation: &Invocation, mode: OutputMode) -> Result<ProcessOutput> {
        debug!(command = %invocation.display(), cwd = ?invocation.cwd, "spawning");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let output = match mode {
            OutputMode::Stream => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(|e| spawn_error(invocation, e))?;
                ProcessOutput {
                    stdout: String::new(),
                    stderr: String::new(),
                    code: status.code().unwrap_or(-1),
                }
            }
            OutputMode::Capture => {
                let output = cmd.output().map_err(|e| spawn_error(invocation, e))?;
                ProcessOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    code: output.status.code().unwrap_or(-1),
                }
            }
        };

        if output.code != 0 {
            return Err(XcHelperError::Tool {
                program: invocation.program.clone(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output)
    }
}

fn spawn_error(invocation: &Invocation, err: std::io::Error) -> XcHelperError {
    XcHelperError::Tool {
        program: invocation.program.clone(),
        code: 127,
        stderr: format!("Failed to execute {}: {}", invocation.display(), err),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stdout() {
        let inv = Invocation::new("sh").args(["-c", "echo hello"]);
        let out = ProcessRunner::new().run(&inv, OutputMode::Capture).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.code, 0);
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let inv = Invocation::new("sh").args(["-c", "echo broken >&2; exit 3"]);
        let err = ProcessRunner::new()
            .run(&inv, OutputMode::Capture)
            .unwrap_err();
        match err {
            XcHelperError::Tool { program, code, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program() {
        let inv = Invocation::new("/nonexistent/path/to/tool");
        let err = ProcessRunner::new()
            .run(&inv, OutputMode::Capture)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to execute"));
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn test_env_and_cwd_are_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let inv = Invocation::new("sh")
            .args(["-c", "echo $XCHELPER_PROBE; pwd"])
            .current_dir(dir.path())
            .envs(vec![("XCHELPER_PROBE".to_string(), "probe".to_string())]);
        let out = ProcessRunner::new().run(&inv, OutputMode::Capture).unwrap();
        let mut lines = out.stdout.lines();
        assert_eq!(lines.next(), Some("probe"));
        let pwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(pwd, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_display() {
        let inv = Invocation::new("tar").arg("-czf").arg("out.tar.gz");
        assert_eq!(inv.display(), "tar -czf out.tar.gz");
    }
}
