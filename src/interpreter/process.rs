//! Interpreter subprocess: spawn, feed source, wait, reap

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use tempfile::NamedTempFile;

use crate::common::config::SourceDelivery;
use crate::common::{Error, Result};

/// How the interpreter process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with a status code
    Exited(i32),
    /// Killed by a signal (crash, abort, external kill)
    Signaled(i32),
}

impl Termination {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Termination::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Termination::Signaled(signal);
            }
        }
        Termination::Exited(-1)
    }

    /// One-line description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Termination::Exited(code) => format!("interpreter exited with status {}", code),
            Termination::Signaled(signal) => format!(
                "interpreter terminated by signal {} ({})",
                signal_name(*signal),
                signal
            ),
        }
    }
}

/// Symbolic name of a signal number
#[cfg(unix)]
pub fn signal_name(signal: i32) -> String {
    let name = match signal {
        libc::SIGHUP => "SIGHUP",
        libc::SIGINT => "SIGINT",
        libc::SIGQUIT => "SIGQUIT",
        libc::SIGILL => "SIGILL",
        libc::SIGTRAP => "SIGTRAP",
        libc::SIGABRT => "SIGABRT",
        libc::SIGBUS => "SIGBUS",
        libc::SIGFPE => "SIGFPE",
        libc::SIGKILL => "SIGKILL",
        libc::SIGUSR1 => "SIGUSR1",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGUSR2 => "SIGUSR2",
        libc::SIGPIPE => "SIGPIPE",
        libc::SIGALRM => "SIGALRM",
        libc::SIGTERM => "SIGTERM",
        _ => return format!("signal {}", signal),
    };
    name.to_string()
}

#[cfg(not(unix))]
pub fn signal_name(signal: i32) -> String {
    format!("signal {}", signal)
}

/// What the interpreter printed and how it ended
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub termination: Termination,
    pub stdout: String,
    pub stderr: String,
}

/// Everything needed to start one interpreter run
pub struct Invocation<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub source: &'a str,
    pub delivery: SourceDelivery,
    pub source_suffix: &'a str,
}

/// A spawned interpreter
///
/// Dropping this before `wait` kills and reaps the child, so no exit path
/// leaves a zombie behind.
pub struct RunningProcess {
    child: Option<Child>,
    writer: Option<JoinHandle<io::Result<()>>>,
    // Held until the interpreter has exited
    _source_file: Option<NamedTempFile>,
}

impl RunningProcess {
    /// Start the interpreter with the source delivered as configured
    pub fn spawn(invocation: Invocation<'_>) -> Result<Self> {
        let mut command = Command::new(invocation.program);
        command
            .args(invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let source_file = match invocation.delivery {
            SourceDelivery::File => {
                let mut file = tempfile::Builder::new()
                    .prefix("pagetest-")
                    .suffix(invocation.source_suffix)
                    .tempfile()?;
                file.write_all(invocation.source.as_bytes())?;
                file.flush()?;
                command.arg(file.path()).stdin(Stdio::null());
                Some(file)
            }
            SourceDelivery::Stdin => {
                command.stdin(Stdio::piped());
                None
            }
        };

        let mut child = command
            .spawn()
            .map_err(|e| Error::spawn_failed(invocation.program, &e))?;

        tracing::debug!(
            pid = child.id(),
            program = %invocation.program.display(),
            "interpreter spawned"
        );

        // Written from a thread so a chatty interpreter can't deadlock us
        // while its stdout pipe fills up.
        let writer = match (invocation.delivery, child.stdin.take()) {
            (SourceDelivery::Stdin, Some(mut stdin)) => {
                let payload = invocation.source.to_string();
                Some(std::thread::spawn(move || {
                    match stdin.write_all(payload.as_bytes()) {
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                        other => other,
                    }
                }))
            }
            _ => None,
        };

        Ok(Self {
            child: Some(child),
            writer,
            _source_file: source_file,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Block until the interpreter exits and collect its output
    ///
    /// The child stays owned by `self` until it has been reaped, so an
    /// error part way through still goes through the kill-and-reap `Drop`.
    pub fn wait(mut self) -> Result<ProcessOutput> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| Error::Io(io::Error::other("interpreter already reaped")))?;

        // stderr drains on its own thread so neither pipe can fill and stall
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || read_stream(stderr));
        let stdout = read_stream(child.stdout.take())?;
        let stderr = stderr_reader
            .join()
            .map_err(|_| Error::Io(io::Error::other("stderr reader thread panicked")))??;

        let status = child.wait()?;
        self.child = None;

        if let Some(writer) = self.writer.take() {
            match writer.join() {
                Ok(Err(e)) => tracing::warn!(error = %e, "failed to write source to interpreter"),
                Err(_) => tracing::warn!("source writer thread panicked"),
                Ok(Ok(())) => {}
            }
        }

        Ok(ProcessOutput {
            termination: Termination::from_status(status),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

fn read_stream<R: Read>(stream: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::warn!(pid = child.id(), "killing unreaped interpreter");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
