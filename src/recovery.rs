use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use libc::{STDERR_FILENO, c_char, c_int};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use once_cell::sync::OnceCell;
use tracing::debug;

/// Upper bound on preserved invocation arguments, including argv[0].
const MAX_ARGS: usize = 255;

/// Signals treated as unrecoverable faults of the supervisor process.
/// SIGINT is deliberately absent; operator interrupts keep their default
/// disposition.
const FATAL_SIGNALS: [Signal; 3] = [Signal::SIGSEGV, Signal::SIGILL, Signal::SIGFPE];

/// State read by the fault handler: the recovery target and the original
/// argument vector in execv form. Written once before the handlers are
/// registered, immutable afterwards.
struct RecoveryState {
    cmd: Option<CString>,
    args: Vec<CString>,
    /// Pointers into `args` plus a terminating NULL. Stable for the
    /// process lifetime because `args` is never touched again.
    argv: Vec<*const c_char>,
}

// SAFETY: the raw pointers target the CStrings stored alongside them in
// the same cell and are only read, never written, after construction.
unsafe impl Send for RecoveryState {}
unsafe impl Sync for RecoveryState {}

static RECOVERY: OnceCell<RecoveryState> = OnceCell::new();

impl RecoveryState {
    fn new(cmd: Option<&Path>, args: impl IntoIterator<Item = OsString>) -> Result<Self> {
        let args: Vec<CString> = args
            .into_iter()
            .map(|arg| CString::new(arg.as_bytes()).context("argument contains a NUL byte"))
            .collect::<Result<_>>()?;
        assert!(args.len() <= MAX_ARGS, "argument vector exceeds {MAX_ARGS} entries");

        let mut argv: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(std::ptr::null());

        let cmd = cmd
            .map(|cmd| {
                CString::new(cmd.as_os_str().as_bytes())
                    .context("recovery command contains a NUL byte")
            })
            .transpose()?;

        Ok(RecoveryState { cmd, args, argv })
    }
}

/// Capture the original argument vector and register the fault handlers.
///
/// Call exactly once, before the compile service is constructed, so that
/// faults anywhere in service construction or operation are caught. With
/// no recovery command the handler still runs and turns the fault into a
/// non-zero exit.
pub fn install(recover_cmd: Option<&Path>) -> Result<()> {
    let state = RecoveryState::new(recover_cmd, std::env::args_os())?;
    RECOVERY.set(state).map_err(|_| anyhow!("fault handlers already installed"))?;

    let action =
        SigAction::new(SigHandler::Handler(on_fatal_signal), SaFlags::empty(), SigSet::empty());
    for signal in FATAL_SIGNALS {
        // SAFETY: `on_fatal_signal` restricts itself to async-signal-safe
        // calls and only reads the cell populated above.
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("installing handler for {signal}"))?;
    }
    debug!("fault handlers installed for {FATAL_SIGNALS:?}");
    Ok(())
}

/// Runs in async-signal context: only `write`, `execv` and `_exit`, and
/// only the pre-captured immutable state.
extern "C" fn on_fatal_signal(signal: c_int) {
    write_stderr(b"\nfatal signal ");
    write_signal_number(signal);
    write_stderr(b" caught\n");

    let Some(state) = RECOVERY.get() else {
        // Handlers are only registered after the cell is populated.
        unsafe { libc::_exit(1) }
    };

    match &state.cmd {
        Some(cmd) => {
            write_stderr(b"exec recovery command\n");
            // SAFETY: cmd and argv are NUL-terminated and outlive the
            // process image. On success execv does not return.
            let _ = unsafe { libc::execv(cmd.as_ptr(), state.argv.as_ptr()) };
            // execv only returns on failure, and the process was
            // already faulting.
            unsafe { libc::_exit(1) }
        }
        None => {
            write_stderr(b"no recovery command -> exit\n");
            unsafe { libc::_exit(1) }
        }
    }
}

fn write_stderr(msg: &[u8]) {
    // SAFETY: write(2) is async-signal-safe; a short write while the
    // process is dying is of no consequence.
    let _ = unsafe { libc::write(STDERR_FILENO, msg.as_ptr().cast(), msg.len()) };
}

/// Decimal rendering without allocation; signal numbers are small
/// positive integers.
fn write_signal_number(signal: c_int) {
    let mut buf = [0u8; 12];
    let mut n = signal.max(0) as u32;
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    write_stderr(&buf[i..]);
}
