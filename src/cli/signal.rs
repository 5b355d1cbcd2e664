//! Interrupt handling.
//!
//! The first SIGINT/SIGTERM (Ctrl-C, Ctrl-Break or console close on
//! Windows) cancels the run's token: workers finish the files in flight and
//! the partial summary is still printed. The handler then steps aside, so a
//! second interrupt terminates the process.

use media_ingest::core::pipeline::CancellationToken;
use std::sync::OnceLock;

static RUN_TOKEN: OnceLock<CancellationToken> = OnceLock::new();

/// Route interrupts to `token`. Only the first call has any effect.
pub fn cancel_on_interrupt(token: &CancellationToken) {
    if RUN_TOKEN.set(token.clone()).is_err() {
        return;
    }
    platform::install();
}

/// Runs inside the signal handler: an atomic load and an atomic store only.
fn interrupted() {
    if let Some(token) = RUN_TOKEN.get() {
        token.cancel();
    }
}

#[cfg(unix)]
mod platform {
    pub fn install() {
        for signal in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: `on_signal` is async-signal-safe; see `interrupted`.
            let previous = unsafe { libc::signal(signal, on_signal as libc::sighandler_t) };
            if previous == libc::SIG_ERR {
                tracing::warn!(signal, "could not install interrupt handler");
            }
        }
    }

    extern "C" fn on_signal(signal: libc::c_int) {
        super::interrupted();
        // SAFETY: resetting the disposition is async-signal-safe.
        unsafe {
            libc::signal(signal, libc::SIG_DFL);
        }
    }
}

#[cfg(windows)]
mod platform {
    use windows_sys::Win32::System::Console::{
        SetConsoleCtrlHandler, CTRL_BREAK_EVENT, CTRL_CLOSE_EVENT, CTRL_C_EVENT,
    };

    pub fn install() {
        // SAFETY: the handler only touches atomics and unregisters itself.
        if unsafe { SetConsoleCtrlHandler(Some(on_console_event), 1) } == 0 {
            tracing::warn!("could not install console control handler");
        }
    }

    unsafe extern "system" fn on_console_event(event: u32) -> i32 {
        match event {
            CTRL_C_EVENT | CTRL_BREAK_EVENT | CTRL_CLOSE_EVENT => {
                super::interrupted();
                // SAFETY: removing our own handler from within it is allowed.
                unsafe {
                    SetConsoleCtrlHandler(Some(on_console_event), 0);
                }
                1
            }
            _ => 0,
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    pub fn install() {}
}
