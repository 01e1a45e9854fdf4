//! Process-wide shutdown flag.
//!
//! Raised by SIGINT/SIGTERM/SIGHUP or by the kill chord, and polled by the
//! session manager between units of work.  Nothing is interrupted
//! preemptively: a blocking wait finishes its timeout before the flag is seen.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

/// Cloneable handle to a single shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.  Idempotent.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Makes SIGINT, SIGTERM and SIGHUP raise this flag.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a handler cannot be installed.
    pub fn register_termination_signals(&self) -> io::Result<()> {
        for signal in [SIGINT, SIGTERM, SIGHUP] {
            signal_hook::flag::register(signal, Arc::clone(&self.0))?;
        }
        Ok(())
    }
}
