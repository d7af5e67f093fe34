//! Bounded external commands for the blocking samplers.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run `program` and return its stdout, killing it once `timeout` elapses.
///
/// Returns `None` if the command cannot be started or runs out of time. A
/// non-zero exit still returns whatever was written to stdout; `df` exits
/// non-zero when only some of its arguments are unreadable.
pub fn output_within(program: &str, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| tracing::debug!("cannot run {}: {}", program, e))
        .ok()?;

    // Drain stdout on its own thread so a full pipe cannot stall the child.
    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        let mut buf = String::new();
        stdout.read_to_string(&mut buf).map(|_| buf)
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if Instant::now() >= deadline => break None,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::debug!("waiting on {} failed: {}", program, e);
                break None;
            }
        }
    };

    let Some(status) = status else {
        tracing::warn!("{} did not finish within {:?}, killing it", program, timeout);
        let _ = child.kill();
        let _ = child.wait();
        return None;
    };
    if !status.success() {
        tracing::debug!("{} exited with {}", program, status);
    }

    match reader.join() {
        Ok(Ok(out)) => Some(out),
        Ok(Err(e)) => {
            tracing::debug!("reading {} output failed: {}", program, e);
            None
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let out = output_within("echo", &["hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_kills_command_past_deadline() {
        let started = Instant::now();
        assert!(output_within("sleep", &["30"], Duration::from_millis(100)).is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_program() {
        assert!(output_within("definitely-not-a-real-binary", &[], Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_failing_command_keeps_stdout() {
        let out = output_within("sh", &["-c", "echo partial; exit 1"], Duration::from_secs(5));
        assert_eq!(out.as_deref(), Some("partial\n"));
    }
}
