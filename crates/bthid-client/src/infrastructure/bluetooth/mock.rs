//! Mock Bluetooth transport for unit and integration testing.
//!
//! # Why a mock transport?
//!
//! The real transport needs a Bluetooth adapter, root privileges and a remote
//! host willing to connect.  None of that exists on a CI runner.
//!
//! `MockTransport` answers each accept call from a script of [`Accept`]
//! outcomes.  Every channel it hands out shares a [`ChannelLog`] that records
//! what was sent on it and when it was closed (dropped), so tests can assert
//! on wire bytes and teardown order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let log = ChannelLog::default();
//! let transport = MockTransport::new()
//!     .with_control(Accept::Connect)
//!     .with_interrupt(Accept::Connect)
//!     .with_log(log.clone());
//! // ... drive a SessionManager ...
//! assert_eq!(log.sent_on("interrupt").len(), 1);
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::application::session::{Channel, HidChannel, HidTransport, TransportError};

/// Peer address reported by every mock channel.
pub const MOCK_PEER: &str = "00:11:22:33:44:55";

/// Scripted outcome of one accept call.  An empty script means [`Accept::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Timeout,
    Connect,
    /// Connects, but every send on the channel fails.
    ConnectFailingSend,
    /// Accept error (recoverable).
    Fail,
    /// Readiness wait error (fatal).
    Broken,
}

#[derive(Debug, Default)]
struct LogInner {
    sent: Vec<(&'static str, Vec<u8>)>,
    closed: Vec<String>,
}

/// Shared record of channel activity.
#[derive(Debug, Clone, Default)]
pub struct ChannelLog(Arc<Mutex<LogInner>>);

impl ChannelLog {
    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Frames sent on the channel named `"control"` or `"interrupt"`.
    pub fn sent_on(&self, name: &str) -> Vec<Vec<u8>> {
        self.lock()
            .sent
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    /// Names of closed channels, in close order.
    pub fn closed(&self) -> Vec<String> {
        self.lock().closed.clone()
    }
}

/// A channel that records into a [`ChannelLog`].
#[derive(Debug)]
pub struct MockChannel {
    name: &'static str,
    fail_send: bool,
    log: ChannelLog,
}

impl HidChannel for MockChannel {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.fail_send {
            return Err(TransportError::Send(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        self.log.lock().sent.push((self.name, frame.to_vec()));
        Ok(())
    }

    fn peer(&self) -> String {
        MOCK_PEER.to_string()
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.log.lock().closed.push(self.name.to_string());
    }
}

/// Transport driven by per-channel accept scripts.
#[derive(Debug, Default)]
pub struct MockTransport {
    control: VecDeque<Accept>,
    interrupt: VecDeque<Accept>,
    log: ChannelLog,
    /// Every (channel, timeout) pair passed to an accept call.
    pub accept_calls: Vec<(Channel, Duration)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, outcome: Accept) -> Self {
        self.control.push_back(outcome);
        self
    }

    pub fn with_interrupt(mut self, outcome: Accept) -> Self {
        self.interrupt.push_back(outcome);
        self
    }

    pub fn with_log(mut self, log: ChannelLog) -> Self {
        self.log = log;
        self
    }

    fn accept(&mut self, channel: Channel, timeout: Duration) -> Result<Option<MockChannel>, TransportError> {
        self.accept_calls.push((channel, timeout));
        let (script, name) = match channel {
            Channel::Control => (&mut self.control, "control"),
            Channel::Interrupt => (&mut self.interrupt, "interrupt"),
        };
        let outcome = script.pop_front().unwrap_or(Accept::Timeout);
        let open = |fail_send| MockChannel {
            name,
            fail_send,
            log: self.log.clone(),
        };
        match outcome {
            Accept::Timeout => Ok(None),
            Accept::Connect => Ok(Some(open(false))),
            Accept::ConnectFailingSend => Ok(Some(open(true))),
            Accept::Fail => Err(TransportError::Accept {
                channel,
                source: io::Error::from(io::ErrorKind::ConnectionAborted),
            }),
            Accept::Broken => Err(TransportError::Wait {
                channel,
                source: io::Error::from_raw_os_error(libc::EBADF),
            }),
        }
    }
}

impl HidTransport for MockTransport {
    type Channel = MockChannel;

    fn accept_control(&mut self, timeout: Duration) -> Result<Option<MockChannel>, TransportError> {
        self.accept(Channel::Control, timeout)
    }

    fn accept_interrupt(&mut self, timeout: Duration) -> Result<Option<MockChannel>, TransportError> {
        self.accept(Channel::Interrupt, timeout)
    }
}
