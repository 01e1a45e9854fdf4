//! Service registration around the session loop.
//!
//! A host only offers to connect to devices that advertise a HID service, so
//! the service record is registered before the first accept and withdrawn
//! after the last session closes.  The registrar itself is an infrastructure
//! concern (BlueZ over D-Bus); this module only fixes the ordering and the
//! failure policy:
//!
//! - registration failure aborts startup, the loop never runs;
//! - unregistration failure is logged and otherwise ignored, because the
//!   process is exiting anyway and BlueZ drops the profile with our bus name.

use thiserror::Error;
use tracing::{info, warn};

/// Failures talking to the service discovery daemon.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// No connection to the daemon could be made.
    #[error("cannot reach the service discovery daemon: {0}")]
    Unavailable(String),

    /// The daemon refused the record.
    #[error("service registration rejected: {0}")]
    Rejected(String),

    #[error("service unregistration failed: {0}")]
    Unregister(String),
}

/// Publishes and withdraws the HID service record.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceRegistrar {
    /// Publishes `record` (BlueZ XML).
    fn register(&mut self, record: &str) -> Result<(), RegistrationError>;

    /// Withdraws the previously published record.
    fn unregister(&mut self) -> Result<(), RegistrationError>;
}

/// Registers `record`, runs `body`, then unregisters.
///
/// # Errors
///
/// Returns the registration error without running `body`.
pub fn run_registered<R, T>(
    registrar: &mut R,
    record: &str,
    body: impl FnOnce() -> T,
) -> Result<T, RegistrationError>
where
    R: ServiceRegistrar + ?Sized,
{
    registrar.register(record)?;
    info!("HID keyboard/mouse service registered");

    let out = body();

    match registrar.unregister() {
        Ok(()) => info!("HID service unregistered"),
        Err(e) => warn!("{e}"),
    }
    Ok(out)
}
