//! Bluetooth HID transport: the control and interrupt L2CAP listeners.
//!
//! A HID device listens on two well-known PSMs (Protocol/Service Multiplexers,
//! the L2CAP equivalent of a port number): 17 for *control* and 19 for
//! *interrupt*.  The host connects to control first, then to interrupt.
//! Both listeners are created once at startup and reused for every session.

pub mod l2cap;
pub mod mock;

use std::time::Duration;

use crate::application::session::{Channel, HidTransport, TransportError};
use l2cap::{L2capChannel, L2capListener};

/// HID control channel PSM.
pub const PSM_HID_CONTROL: u16 = 0x11;
/// HID interrupt channel PSM.
pub const PSM_HID_INTERRUPT: u16 = 0x13;

/// The real transport: two listening L2CAP sockets.
#[derive(Debug)]
pub struct BluetoothTransport {
    control: L2capListener,
    interrupt: L2capListener,
}

impl BluetoothTransport {
    /// Binds and listens on both PSMs.
    ///
    /// # Errors
    ///
    /// Returns the first socket, bind or listen failure.
    pub fn bind(control_psm: u16, interrupt_psm: u16) -> Result<Self, TransportError> {
        let interrupt = L2capListener::bind(Channel::Interrupt, interrupt_psm)?;
        let control = L2capListener::bind(Channel::Control, control_psm)?;
        tracing::info!(
            control_psm = control.psm(),
            interrupt_psm = interrupt.psm(),
            "ready to accept connections"
        );
        Ok(Self { control, interrupt })
    }
}

impl HidTransport for BluetoothTransport {
    type Channel = L2capChannel;

    fn accept_control(&mut self, timeout: Duration) -> Result<Option<L2capChannel>, TransportError> {
        self.control.accept(timeout)
    }

    fn accept_interrupt(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<L2capChannel>, TransportError> {
        self.interrupt.accept(timeout)
    }
}
