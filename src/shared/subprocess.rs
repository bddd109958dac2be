use std::fs;
use std::io::{BufReader, Read};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Companion CLI calls never wait longer than this.
pub const COMPANION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("binary `{0}` was not found")]
    MissingBinary(String),
    #[error("`{binary}` timed out after {timeout_ms}ms")]
    Timeout { binary: String, timeout_ms: u64 },
    #[error("failed to run `{binary}`: {source}")]
    Io {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn trimmed_stdout(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs `binary args..` to completion, killing it and anything it spawned
/// once `timeout` elapses.
pub fn run_with_timeout(
    binary: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let io_err = |source: std::io::Error| CommandError::Io {
        binary: binary.to_string(),
        source,
    };

    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Own process group, so a timeout also reaches wrapper-spawned children.
    #[cfg(unix)]
    command.process_group(0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CommandError::MissingBinary(binary.to_string()))
        }
        Err(err) => return Err(io_err(err)),
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_err(std::io::Error::other("missing stdout pipe")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io_err(std::io::Error::other("missing stderr pipe")))?;

    let stdout_reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(stdout).read_to_string(&mut buf);
        buf
    });
    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut buf);
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    kill_process_group(child.id());
                    let _ = child.kill();
                    let _ = child.wait();
                    // Readers are left detached: a survivor may still hold the pipes.
                    drop(stdout_reader);
                    drop(stderr_reader);
                    return Err(CommandError::Timeout {
                        binary: binary.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(err) => return Err(io_err(err)),
        }
    };

    Ok(CommandOutput {
        exit_code: status.code(),
        success: status.success(),
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    })
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let _ = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pgid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

/// True when `binary` is an executable path or resolves through `PATH`.
pub fn is_binary_available(binary: &str) -> bool {
    if binary.trim().is_empty() {
        return false;
    }
    let explicit = Path::new(binary);
    if explicit.components().count() > 1 || explicit.is_absolute() {
        return is_executable_file(explicit);
    }

    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        if is_executable_file(&dir.join(binary)) {
            return true;
        }
        #[cfg(windows)]
        {
            if is_executable_file(&dir.join(format!("{binary}.cmd")))
                || is_executable_file(&dir.join(format!("{binary}.exe")))
            {
                return true;
            }
        }
        false
    })
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).expect("write script");
        let mut perms = fs::metadata(path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).expect("chmod");
    }

    #[test]
    fn captures_stdout_and_exit_code() {
        let dir = tempdir().expect("tempdir");
        let bin = dir.path().join("az");
        write_script(&bin, "#!/bin/sh\necho \"user@contoso.com\"\nexit 0\n");

        let output = run_with_timeout(bin.to_str().expect("utf8"), &["account"], COMPANION_TIMEOUT)
            .expect("run");
        assert!(output.success);
        assert_eq!(output.trimmed_stdout(), "user@contoso.com");
    }

    #[test]
    fn reports_non_zero_exit_without_error() {
        let dir = tempdir().expect("tempdir");
        let bin = dir.path().join("az");
        write_script(&bin, "#!/bin/sh\necho nope >&2\nexit 3\n");

        let output =
            run_with_timeout(bin.to_str().expect("utf8"), &[], COMPANION_TIMEOUT).expect("run");
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "nope");
    }

    #[test]
    fn kills_processes_that_outlive_the_timeout() {
        let dir = tempdir().expect("tempdir");
        let bin = dir.path().join("slow");
        write_script(&bin, "#!/bin/sh\nexec sleep 5\n");

        let err = run_with_timeout(
            bin.to_str().expect("utf8"),
            &[],
            Duration::from_millis(100),
        )
        .expect_err("timeout");
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[test]
    fn timeout_holds_when_a_grandchild_keeps_the_pipes_open() {
        let dir = tempdir().expect("tempdir");
        let bin = dir.path().join("wrapper");
        write_script(&bin, "#!/bin/sh\nsleep 4\ntrue\n");

        let started = Instant::now();
        let err = run_with_timeout(
            bin.to_str().expect("utf8"),
            &[],
            Duration::from_millis(100),
        )
        .expect_err("timeout");
        let elapsed = started.elapsed();
        assert!(matches!(err, CommandError::Timeout { .. }));
        assert!(
            elapsed < Duration::from_secs(2),
            "timeout of 100ms took {elapsed:?}"
        );
    }

    #[test]
    fn missing_binary_is_reported_distinctly() {
        let err = run_with_timeout("/definitely/not/here/az", &[], COMPANION_TIMEOUT)
            .expect_err("missing");
        assert!(matches!(err, CommandError::MissingBinary(_)));
        assert!(!is_binary_available("/definitely/not/here/az"));
    }

    #[test]
    fn binary_availability_requires_execute_bit() {
        let dir = tempdir().expect("tempdir");
        let plain = dir.path().join("plain");
        fs::write(&plain, "x").expect("write");
        assert!(!is_binary_available(plain.to_str().expect("utf8")));

        let exec = dir.path().join("exec");
        write_script(&exec, "#!/bin/sh\n");
        assert!(is_binary_available(exec.to_str().expect("utf8")));
    }
}
