//! Query Runners
//!
//! `QueryRunner` is the seam to the external query executor. `PsqlRunner`
//! runs each query through `psql`, feeding the SQL on stdin and capturing
//! stdout and stderr through one shared pipe so error messages stay in
//! place relative to the plan text.
//!
//! Timeouts follow a graceful escalation: SIGTERM, drain the pipe for a
//! short grace period, then kill.

use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::io::{FromRawFd, RawFd};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Grace period between SIGTERM and kill
const TERM_GRACE: Duration = Duration::from_millis(500);

/// Upper bound of a single poll wait
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Outcome of one query execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The query finished; the captured plan text
    Completed(String),
    /// The deadline passed before the query finished
    TimedOut,
    /// The runner could not execute the query or it exited with an error
    Failed {
        /// Short description (exit status, spawn error)
        message: String,
        /// Whatever output was captured
        output: String,
    },
}

/// Executes rendered SQL against the database under test
pub trait QueryRunner {
    /// Run `sql`, giving up after `timeout`
    fn run(&mut self, sql: &str, timeout: Duration) -> RunOutcome;
}

/// Runs queries with `psql <connection> -q -f -`
#[derive(Debug, Clone)]
pub struct PsqlRunner {
    psql: String,
    connection: String,
}

impl PsqlRunner {
    /// Create a runner for the given psql executable and connection string
    pub fn new(psql: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            psql: psql.into(),
            connection: connection.into(),
        }
    }

    fn spawn(&self) -> std::io::Result<(Child, File)> {
        let (read_fd, write_fd) = create_pipe()?;
        // SAFETY: both descriptors were just created by pipe(2) and are owned here
        let reader = unsafe { File::from_raw_fd(read_fd) };
        let writer = unsafe { File::from_raw_fd(write_fd) };
        let stderr = writer.try_clone()?;

        let mut command = Command::new(&self.psql);
        command
            .arg(&self.connection)
            .args(["-q", "-v", "ON_ERROR_STOP=1", "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(stderr));

        let child = command.spawn()?;
        // Drop the parent's copies of the write end so EOF arrives on exit
        drop(command);
        Ok((child, reader))
    }
}

impl QueryRunner for PsqlRunner {
    fn run(&mut self, sql: &str, timeout: Duration) -> RunOutcome {
        let (mut child, mut reader) = match self.spawn() {
            Ok(spawned) => spawned,
            Err(e) => {
                return RunOutcome::Failed {
                    message: format!("Failed to start {}: {}", self.psql, e),
                    output: String::new(),
                };
            }
        };

        // Feed stdin from a helper thread; a large payload must not block
        // the poll loop draining the output pipe
        let feeder = child.stdin.take().map(|mut stdin| {
            let sql = sql.to_string();
            std::thread::spawn(move || {
                let _ = stdin.write_all(sql.as_bytes());
            })
        });

        let deadline = Instant::now() + timeout;
        let mut output = Vec::new();
        let finished = drain_until(&mut reader, &mut output, deadline);

        if !finished {
            terminate(&mut child, &mut reader, &mut output);
            if let Some(feeder) = feeder {
                let _ = feeder.join();
            }
            return RunOutcome::TimedOut;
        }

        if let Some(feeder) = feeder {
            let _ = feeder.join();
        }
        let text = String::from_utf8_lossy(&output).into_owned();
        match child.wait() {
            Ok(status) if status.success() => RunOutcome::Completed(text),
            Ok(status) => RunOutcome::Failed {
                message: format!("psql exited with {}", status),
                output: text,
            },
            Err(e) => RunOutcome::Failed {
                message: format!("Failed to wait for psql: {}", e),
                output: text,
            },
        }
    }
}

/// Read from `reader` until EOF (`true`) or until `deadline` passes (`false`)
fn drain_until(reader: &mut File, output: &mut Vec<u8>, deadline: Instant) -> bool {
    let mut buf = [0u8; 8192];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }

        match wait_for_data(reader_fd(reader), remaining.min(POLL_SLICE)) {
            PollResult::Timeout => continue,
            PollResult::DataAvailable | PollResult::PipeClosed => match reader.read(&mut buf) {
                Ok(0) => return true,
                Ok(n) => output.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => return true,
            },
            PollResult::Error(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            PollResult::Error(_) => return true,
        }
    }
}

/// SIGTERM, drain whatever is flushed within the grace period, then kill
fn terminate(child: &mut Child, reader: &mut File, output: &mut Vec<u8>) {
    let _ = send_sigterm(child.id());
    drain_until(reader, output, Instant::now() + TERM_GRACE);
    if matches!(child.try_wait(), Ok(None)) {
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[derive(Debug)]
enum PollResult {
    DataAvailable,
    Timeout,
    PipeClosed,
    Error(std::io::Error),
}

fn reader_fd(file: &File) -> RawFd {
    use std::os::unix::io::AsRawFd;
    file.as_raw_fd()
}

/// Wait for data to be available on a file descriptor with timeout
fn wait_for_data(fd: RawFd, timeout: Duration) -> PollResult {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
    // SAFETY: pollfd is a valid, exclusively borrowed struct for one descriptor
    let result = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };

    if result < 0 {
        PollResult::Error(std::io::Error::last_os_error())
    } else if result == 0 {
        PollResult::Timeout
    } else if pollfd.revents & libc::POLLIN != 0 {
        PollResult::DataAvailable
    } else if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        PollResult::PipeClosed
    } else {
        PollResult::Timeout
    }
}

/// Create a close-on-exec pipe pair, returning (read_fd, write_fd)
fn create_pipe() -> std::io::Result<(RawFd, RawFd)> {
    let mut fds = [0 as RawFd; 2];
    // SAFETY: fds has room for the two descriptors pipe(2) writes
    let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    for &fd in &fds {
        // SAFETY: fd is a descriptor returned by pipe(2) above
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
        }
    }
    Ok((fds[0], fds[1]))
}

/// Send SIGTERM to a process. Returns `Err` if the signal could not be delivered.
fn send_sigterm(pid: u32) -> std::io::Result<()> {
    // SAFETY: kill(2) has no memory-safety preconditions
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}
