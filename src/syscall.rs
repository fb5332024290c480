// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command invocation.
//!
//! Every tool devboot drives (package managers, SSH tooling, Python) is
//! reached through a [`Syscall`], a structured program plus argument list.
//! Nothing is ever routed through a shell string, so quoting ambiguity does
//! not exist. Execution itself sits behind the [`Syscaller`] trait so that
//! callers can be exercised against scripted fakes.
//!
//! Arguments added through [`Syscall::secret_arg`] are passed to the program
//! as-is, but rendered as [`REDACTED`] everywhere a command line gets shown,
//! i.e., logs, spans, and error messages.

use std::{
    ffi::{OsStr, OsString},
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    io::Write,
    process::{Command, Stdio},
};
use tracing::{debug, instrument};

/// Placeholder shown instead of secret arguments.
pub const REDACTED: &str = "***";

/// Single command line argument.
#[derive(Clone, PartialEq, Eq)]
enum Argument {
    Plain(OsString),
    Secret(OsString),
}

impl Argument {
    fn value(&self) -> &OsStr {
        match self {
            Self::Plain(value) | Self::Secret(value) => value.as_os_str(),
        }
    }
}

impl Display for Argument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Plain(value) => fmt.write_str(value.to_string_lossy().as_ref()),
            Self::Secret(_) => fmt.write_str(REDACTED),
        }
    }
}

impl Debug for Argument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Plain(value) => Debug::fmt(value, fmt),
            Self::Secret(_) => Debug::fmt(REDACTED, fmt),
        }
    }
}

/// Structured command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syscall {
    program: OsString,
    args: Vec<Argument>,
    stdin: Option<String>,
}

impl Syscall {
    /// Construct new system call for target program.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(Argument::Plain(arg.into()));
        self
    }

    /// Append a listing of arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args
            .extend(args.into_iter().map(|arg| Argument::Plain(arg.into())));
        self
    }

    /// Append one argument that must never be displayed.
    pub fn secret_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(Argument::Secret(arg.into()));
        self
    }

    /// Feed input to the standard input of the program.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        self.program.as_os_str()
    }

    /// Arguments as passed to the program, secrets included.
    pub fn arguments(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(Argument::value)
    }

    pub fn input(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

impl Display for Syscall {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.program.to_string_lossy().as_ref())?;
        for arg in &self.args {
            write!(fmt, " {arg}")?;
        }

        Ok(())
    }
}

/// Captured result of a finished system call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyscallOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SyscallOutput {
    /// Construct successful output with given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Construct failed output with given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Both output streams joined together with trailing newline chomped.
    pub fn message(&self) -> String {
        let mut message = String::new();

        if !self.stdout.is_empty() {
            message.push_str(format!("stdout: {}", self.stdout).as_str());
        }

        if !self.stderr.is_empty() {
            message.push_str(format!("stderr: {}", self.stderr).as_str());
        }

        // INVARIANT: Chomp trailing newlines.
        message
            .strip_suffix("\r\n")
            .or(message.strip_suffix('\n'))
            .map(ToString::to_string)
            .unwrap_or(message)
    }
}

/// Layer of indirection for running external commands.
pub trait Syscaller {
    /// Run command to completion, capturing its output.
    ///
    /// A non-zero exit is _not_ an error here; only failing to spawn is.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if the program cannot be started.
    fn call(&self, syscall: &Syscall) -> Result<SyscallOutput>;

    /// Run command attached to the current terminal.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if the program cannot be started.
    /// - Return [`SyscallError::Failed`] if the program exits unsuccessfully.
    fn call_interactive(&self, syscall: &Syscall) -> Result<()>;

    /// Run command to completion, treating a non-zero exit as an error.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if the program cannot be started.
    /// - Return [`SyscallError::Failed`] if the program exits unsuccessfully.
    fn call_checked(&self, syscall: &Syscall) -> Result<SyscallOutput> {
        let output = self.call(syscall)?;
        if !output.success() {
            return Err(SyscallError::Failed {
                command: syscall.to_string(),
                message: output.message(),
            });
        }

        Ok(output)
    }
}

impl<S> Syscaller for &S
where
    S: Syscaller + ?Sized,
{
    fn call(&self, syscall: &Syscall) -> Result<SyscallOutput> {
        (**self).call(syscall)
    }

    fn call_interactive(&self, syscall: &Syscall) -> Result<()> {
        (**self).call_interactive(syscall)
    }
}

/// Run commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSyscaller;

impl Syscaller for SystemSyscaller {
    #[instrument(skip(self, syscall), fields(command = %syscall), level = "debug")]
    fn call(&self, syscall: &Syscall) -> Result<SyscallOutput> {
        let spawn_error = |source| SyscallError::Spawn {
            source,
            command: syscall.to_string(),
        };

        let mut child = Command::new(syscall.program())
            .args(syscall.arguments())
            .stdin(if syscall.input().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let (Some(input), Some(mut stdin)) = (syscall.input(), child.stdin.take()) {
            stdin.write_all(input.as_bytes()).map_err(spawn_error)?;
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        let output = SyscallOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        };
        debug!("exit code {:?}", output.code);

        Ok(output)
    }

    #[instrument(skip(self, syscall), fields(command = %syscall), level = "debug")]
    fn call_interactive(&self, syscall: &Syscall) -> Result<()> {
        let status = Command::new(syscall.program())
            .args(syscall.arguments())
            .spawn()
            .and_then(|mut child| child.wait())
            .map_err(|source| SyscallError::Spawn {
                source,
                command: syscall.to_string(),
            })?;

        if !status.success() {
            return Err(SyscallError::Failed {
                command: syscall.to_string(),
                message: format!("exited with {status}"),
            });
        }

        Ok(())
    }
}

/// System call error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Program could not be started or communicated with.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Program exited unsuccessfully.
    #[error("command {command:?} failed:\n{message}")]
    Failed { command: String, message: String },
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn syscall_display_joins_arguments() {
        let syscall = Syscall::new("brew").args(["install", "--cask"]).arg("iterm2");
        assert_eq!(syscall.to_string(), "brew install --cask iterm2");
    }

    #[test]
    fn secret_arguments_are_never_shown() {
        let syscall = Syscall::new("ssh-keygen")
            .args(["-C", "octocat@github.com", "-N"])
            .secret_arg("hunter2")
            .arg("-f");
        assert_eq!(syscall.to_string(), "ssh-keygen -C octocat@github.com -N *** -f");
        assert!(!format!("{syscall:?}").contains("hunter2"));

        let arguments = syscall.arguments().collect::<Vec<_>>();
        assert_eq!(arguments[3], OsStr::new("hunter2"));
    }

    #[cfg(unix)]
    #[test]
    fn failed_call_does_not_leak_secret() {
        let syscall = Syscall::new("false").secret_arg("hunter2");
        match SystemSyscaller.call_checked(&syscall) {
            Err(error @ SyscallError::Failed { .. }) => {
                assert!(!error.to_string().contains("hunter2"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn syscall_output_message_chomps_newline() {
        let output = SyscallOutput {
            code: Some(1),
            stdout: "installing\n".into(),
            stderr: "no bottle\n".into(),
        };
        assert_eq!(output.message(), "stdout: installing\nstderr: no bottle");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn system_syscaller_captures_output_and_stdin() -> anyhow::Result<()> {
        let output = SystemSyscaller.call(&Syscall::new("cat").stdin("hello\n"))?;
        assert_eq!(output, SyscallOutput::ok("hello\n"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn call_checked_rejects_non_zero_exit() {
        let result = SystemSyscaller.call_checked(&Syscall::new("false"));
        assert!(matches!(result, Err(SyscallError::Failed { .. })));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let result = SystemSyscaller.call(&Syscall::new("devboot-no-such-program"));
        assert!(matches!(result, Err(SyscallError::Spawn { .. })));
    }
}
