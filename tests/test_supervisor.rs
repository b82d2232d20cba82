//! End-to-end tests driving the supervisor binary the way an operator
//! would: spawn it in a scratch root, watch its stderr log for startup,
//! then fault it with a signal.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serial_test::serial;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_forgeweb");

fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if cond() {
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    panic!("timed out waiting for {what}");
}

/// Spawn the supervisor in `root` with a prepared makefiles directory,
/// stderr redirected to a log file we can poll for readiness.
fn spawn_supervisor(root: &Path, extra: &[&str]) -> (Child, PathBuf) {
    fs::create_dir(root.join("makefiles")).unwrap();
    let log = root.join("stderr.log");
    let child = Command::new(BIN)
        .current_dir(root)
        .args(["--port", "0"])
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(File::create(&log).unwrap())
        .spawn()
        .unwrap();
    (child, log)
}

fn started(log: &Path) -> bool {
    fs::read_to_string(log).map(|s| s.contains("type ctrl-c to quit")).unwrap_or(false)
}

#[test]
fn help_exits_clean_without_bootstrap() {
    let root = TempDir::new().unwrap();
    let output = Command::new(BIN).current_dir(root.path()).arg("--help").output().unwrap();

    assert!(output.status.success());
    // No makefiles check, no sessions directory, no service.
    assert!(!root.path().join("sessions").exists());
}

#[test]
fn missing_makefiles_directory_exits_nonzero() {
    let root = TempDir::new().unwrap();
    let output = Command::new(BIN).current_dir(root.path()).output().unwrap();

    assert!(!output.status.success());
    assert!(!root.path().join("sessions").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("makefiles"));
}

#[test]
fn unknown_flags_exit_nonzero() {
    let root = TempDir::new().unwrap();
    let output =
        Command::new(BIN).current_dir(root.path()).arg("--logfile=web.log").output().unwrap();

    assert!(!output.status.success());
    assert!(!root.path().join("sessions").exists());
}

#[test]
#[serial]
fn fatal_signal_reexecs_the_original_argument_vector() {
    let root = TempDir::new().unwrap();
    let (child, log) = spawn_supervisor(
        root.path(),
        &["--recover-cmd", "/bin/echo", "--max-clients", "3"],
    );
    wait_for("supervisor startup", || started(&log));
    assert!(root.path().join("sessions").is_dir());

    kill(Pid::from_raw(child.id() as i32), Signal::SIGSEGV).unwrap();
    let output = child.wait_with_output().unwrap();

    // The process image was replaced by /bin/echo, which received the
    // original arguments (argv[0] aside) and exited cleanly.
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--port 0"));
    assert!(stdout.contains("--recover-cmd /bin/echo"));
    assert!(stdout.contains("--max-clients 3"));
}

#[test]
#[serial]
fn fatal_signal_without_recovery_terminates_nonzero() {
    let root = TempDir::new().unwrap();
    let (mut child, log) = spawn_supervisor(root.path(), &[]);
    wait_for("supervisor startup", || started(&log));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGSEGV).unwrap();
    let status = child.wait().unwrap();

    assert!(!status.success());
    let stderr = fs::read_to_string(&log).unwrap();
    assert!(stderr.contains("no recovery command"));
}
