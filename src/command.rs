use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program args...` in `cwd` and return its trimmed stdout.
///
/// Returns `None` if the program cannot be spawned, exits nonzero, prints
/// nothing or non-UTF-8, or is still running after `timeout` (in which case
/// it is killed and reaped). The deadline also covers reading stdout, so a
/// background process that inherited the pipe can't hold the caller.
/// Stderr is discarded.
pub fn capture(program: &str, args: &[&str], cwd: &Path, timeout: Duration) -> Option<String> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    // Drain stdout on a helper thread so a full pipe can't stall the child
    // while we poll for exit.
    let mut stdout = child.stdout.take()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if Instant::now() >= deadline => break None,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(_) => break None,
        }
    };

    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        return None;
    };

    if !status.success() {
        return None;
    }
    let remaining = deadline.saturating_duration_since(Instant::now());
    let output = rx.recv_timeout(remaining).ok()?.ok()?;
    let text = String::from_utf8(output).ok()?.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwd() -> std::path::PathBuf {
        std::env::temp_dir()
    }

    #[test]
    fn missing_program_is_none() {
        assert_eq!(
            capture("prompt-refiner-no-such-binary", &[], &cwd(), Duration::from_secs(1)),
            None
        );
    }

    #[test]
    fn missing_cwd_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        assert_eq!(capture("echo", &["hi"], &gone, Duration::from_secs(1)), None);
    }

    #[cfg(unix)]
    #[test]
    fn captures_trimmed_stdout() {
        assert_eq!(
            capture("echo", &["  hello  "], &cwd(), Duration::from_secs(5)).as_deref(),
            Some("hello")
        );
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_none() {
        assert_eq!(capture("false", &[], &cwd(), Duration::from_secs(5)), None);
    }

    #[cfg(unix)]
    #[test]
    fn empty_output_is_none() {
        assert_eq!(capture("true", &[], &cwd(), Duration::from_secs(5)), None);
    }

    #[cfg(unix)]
    #[test]
    fn background_child_holding_stdout_does_not_outlive_timeout() {
        let start = Instant::now();
        assert_eq!(
            capture("sh", &["-c", "echo hi; sleep 4 &"], &cwd(), Duration::from_millis(500)),
            None
        );
        assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_output_is_none() {
        assert_eq!(
            capture("sh", &["-c", "printf 'src/\\377.rs'"], &cwd(), Duration::from_secs(5)),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn slow_program_times_out() {
        let start = Instant::now();
        assert_eq!(capture("sleep", &["10"], &cwd(), Duration::from_millis(200)), None);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
