//! Session lifecycle: accept a host, stream reports to it, tear down, repeat.
//!
//! A Bluetooth HID host connects on two L2CAP channels: *control* first, then
//! *interrupt*.  Reports travel on the interrupt channel only.  At most one
//! host is served at a time.
//!
//! ```text
//!            ┌───────────── timeout / accept error ─────────────┐
//!            v                                                  │
//!  Listening ──> AwaitingControl ──> AwaitingInterrupt ──> Active ──> Closing
//!      ^              │ timeout            │ timeout                   │
//!      └──────────────┴────────────────────┘ (control dropped)         │
//!      └───────────────────────── cool-down ──────────────────────────┘
//! ```
//!
//! # Why drain input outside a session? (for beginners)
//!
//! The local keyboard keeps producing events while nobody is connected.  If
//! they piled up in the kernel buffer, the next host would receive a burst of
//! stale keystrokes the moment it connected.  So:
//!
//! - While **Listening**, pending input is read with a very short wait and run
//!   through the translator with nowhere to send it.  Key state stays current
//!   and the kill chord still works.
//! - On entering **Active**, any input that arrived during the handshake is
//!   drained the same way, then the key state is reset so the first report
//!   the host sees is clean.
//!
//! All collaborators sit behind traits ([`InputMultiplexer`], [`HidTransport`],
//! [`HidChannel`]) so the state machine can be driven by scripted fakes.

use std::io;
use std::time::Duration;

use bthid_core::{translate, ControlSignal, KeyState, RawInputEvent};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::application::shutdown::ShutdownFlag;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures of the input side.
#[derive(Debug, Error)]
pub enum InputError {
    /// A device or the FIFO could not be opened.
    #[error("cannot open input source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The FIFO path exists but is something else.
    #[error("{0} exists but is not a fifo")]
    NotAFifo(String),

    /// The FIFO could not be created.
    #[error("cannot create fifo {path}: {source}")]
    CreateFifo {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Not a single source could be opened.
    #[error("no usable input source")]
    NoSources,

    /// The readiness wait itself failed.
    #[error("readiness wait on input sources failed: {0}")]
    Wait(#[source] io::Error),
}

/// Which of the two listening endpoints an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Control,
    Interrupt,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Control => f.write_str("control"),
            Channel::Interrupt => f.write_str("interrupt"),
        }
    }
}

/// Failures of the Bluetooth side.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Creating the socket failed (adapter missing, no permission ...).
    #[error("cannot create {channel} socket: {source}")]
    Socket {
        channel: Channel,
        #[source]
        source: io::Error,
    },

    #[error("cannot bind {channel} socket to psm {psm}: {source}")]
    Bind {
        channel: Channel,
        psm: u16,
        #[source]
        source: io::Error,
    },

    #[error("cannot listen on {channel} socket: {source}")]
    Listen {
        channel: Channel,
        #[source]
        source: io::Error,
    },

    /// Waiting on a listener failed.  Not recoverable.
    #[error("readiness wait on {channel} listener failed: {source}")]
    Wait {
        channel: Channel,
        #[source]
        source: io::Error,
    },

    /// A pending connection could not be accepted.  Recoverable.
    #[error("accept on {channel} channel failed: {source}")]
    Accept {
        channel: Channel,
        #[source]
        source: io::Error,
    },

    /// Writing a report to the peer failed.
    #[error("send to peer failed: {0}")]
    Send(#[source] io::Error),
}

impl TransportError {
    /// `true` when the listeners can no longer be trusted and the process must exit.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Accept { .. } | TransportError::Send(_))
    }
}

/// Errors that end [`SessionManager::run`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("control listener failed: {0}")]
    ControlListener(#[source] TransportError),

    #[error("interrupt listener failed: {0}")]
    InterruptListener(#[source] TransportError),
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// A set of input sources that can be waited on together.
pub trait InputMultiplexer {
    /// Blocks until at least one source is readable or `timeout` elapses.
    ///
    /// Returns the number of ready sources; `0` means the wait timed out.
    fn wait_ready(&mut self, timeout: Duration) -> Result<usize, InputError>;

    /// Reads one record from every source found ready by the last
    /// [`wait_ready`](Self::wait_ready).  Malformed or empty reads are skipped.
    fn read_ready(&mut self) -> Vec<RawInputEvent>;
}

/// An established L2CAP channel to the host.
pub trait HidChannel {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Printable address of the remote device.
    fn peer(&self) -> String;
}

/// The pair of listening endpoints a host connects to.
pub trait HidTransport {
    type Channel: HidChannel;

    /// Waits up to `timeout` for a control connection.  `Ok(None)` on timeout.
    fn accept_control(&mut self, timeout: Duration)
        -> Result<Option<Self::Channel>, TransportError>;

    /// Waits up to `timeout` for an interrupt connection.  `Ok(None)` on timeout.
    fn accept_interrupt(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Self::Channel>, TransportError>;
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Timing parameters of the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub control_accept_timeout: Duration,
    pub interrupt_accept_timeout: Duration,
    /// Pause after a session closes, before listening again.
    pub cooldown: Duration,
    /// Readiness wait per pass while a session is active.
    pub active_poll: Duration,
    /// Readiness wait per pass while draining input with no session.
    pub idle_poll: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            control_accept_timeout: Duration::from_secs(1),
            interrupt_accept_timeout: Duration::from_secs(3),
            cooldown: Duration::from_millis(500),
            active_poll: Duration::from_secs(1),
            idle_poll: Duration::from_micros(500),
        }
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

/// A connected host: both channels plus its address.
pub struct Session<C> {
    control: C,
    interrupt: C,
    peer: String,
}

impl<C: HidChannel> Session<C> {
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

/// Why a session is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// PAUSE released.
    Disconnect,
    /// Kill chord.
    Terminate,
    /// A report could not be delivered.
    SendFailed,
    /// Signal received while the session was active.
    Shutdown,
}

enum State<C> {
    Listening,
    AwaitingControl,
    AwaitingInterrupt { control: C },
    Active(Session<C>),
    Closing { session: Session<C>, reason: CloseReason },
}

/// Observable phase of the lifecycle, without the channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Listening,
    AwaitingControl,
    AwaitingInterrupt,
    Active,
    Closing,
}

/// Result of a single [`SessionManager::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Running,
    /// Shutdown was requested and no session is open.
    Stopped,
}

/// Owns the key state and drives one host at a time.
pub struct SessionManager<I, T: HidTransport> {
    input: I,
    transport: T,
    keys: KeyState,
    state: State<T::Channel>,
    config: SessionConfig,
    shutdown: ShutdownFlag,
}

impl<I, T> SessionManager<I, T>
where
    I: InputMultiplexer,
    T: HidTransport,
{
    pub fn new(input: I, transport: T, config: SessionConfig, shutdown: ShutdownFlag) -> Self {
        Self {
            input,
            transport,
            keys: KeyState::new(),
            state: State::Listening,
            config,
            shutdown,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Listening => Phase::Listening,
            State::AwaitingControl => Phase::AwaitingControl,
            State::AwaitingInterrupt { .. } => Phase::AwaitingInterrupt,
            State::Active(_) => Phase::Active,
            State::Closing { .. } => Phase::Closing,
        }
    }

    pub fn key_state(&self) -> &KeyState {
        &self.keys
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs until shutdown is requested or a listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when a listener's readiness wait fails.
    pub fn run(&mut self) -> Result<(), SessionError> {
        while self.step()? == Step::Running {}
        info!("session loop stopped");
        Ok(())
    }

    /// Performs one state transition.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when a listener's readiness wait fails.
    pub fn step(&mut self) -> Result<Step, SessionError> {
        let state = std::mem::replace(&mut self.state, State::Listening);
        self.state = match state {
            State::Listening => {
                if self.shutdown.is_requested() {
                    return Ok(Step::Stopped);
                }
                self.pump_idle();
                if self.shutdown.is_requested() {
                    return Ok(Step::Stopped);
                }
                State::AwaitingControl
            }
            State::AwaitingControl => self.await_control()?,
            State::AwaitingInterrupt { control } => self.await_interrupt(control)?,
            State::Active(session) => self.serve(session),
            State::Closing { session, reason } => self.close(session, reason),
        };
        Ok(Step::Running)
    }

    fn await_control(&mut self) -> Result<State<T::Channel>, SessionError> {
        match self
            .transport
            .accept_control(self.config.control_accept_timeout)
        {
            Ok(Some(control)) => {
                debug!(peer = %control.peer(), "control channel accepted");
                Ok(State::AwaitingInterrupt { control })
            }
            Ok(None) => {
                trace!("no control connection");
                Ok(State::Listening)
            }
            Err(e) if e.is_fatal() => Err(SessionError::ControlListener(e)),
            Err(e) => {
                warn!("failed to get a control connection: {e}");
                Ok(State::Listening)
            }
        }
    }

    fn await_interrupt(&mut self, control: T::Channel) -> Result<State<T::Channel>, SessionError> {
        match self
            .transport
            .accept_interrupt(self.config.interrupt_accept_timeout)
        {
            Ok(Some(interrupt)) => Ok(self.activate(control, interrupt)),
            Ok(None) => {
                warn!(
                    peer = %control.peer(),
                    "interrupt channel did not follow the control channel in time"
                );
                drop(control);
                Ok(State::Listening)
            }
            Err(e) if e.is_fatal() => Err(SessionError::InterruptListener(e)),
            Err(e) => {
                warn!("failed to get an interrupt connection: {e}");
                drop(control);
                Ok(State::Listening)
            }
        }
    }

    fn activate(&mut self, control: T::Channel, interrupt: T::Channel) -> State<T::Channel> {
        let peer = interrupt.peer();
        info!(%peer, "incoming connection accepted and established");
        let session = Session {
            control,
            interrupt,
            peer,
        };

        // Discard input that queued up during the handshake, then start clean.
        let terminated = self.drain_without_session(Duration::ZERO);
        self.keys.reset();
        if terminated {
            return State::Closing {
                session,
                reason: CloseReason::Terminate,
            };
        }
        State::Active(session)
    }

    fn serve(&mut self, mut session: Session<T::Channel>) -> State<T::Channel> {
        match self.input.wait_ready(self.config.active_poll) {
            Ok(0) => {}
            Ok(_) => {
                for event in self.input.read_ready() {
                    let t = translate(&event, &mut self.keys);
                    if let Some(report) = t.report {
                        if let Err(e) = session.interrupt.send(&report.encode()) {
                            warn!(peer = %session.peer, "{e}");
                            return State::Closing {
                                session,
                                reason: CloseReason::SendFailed,
                            };
                        }
                    }
                    match t.signal {
                        ControlSignal::Continue => {}
                        ControlSignal::Disconnect => {
                            info!("disconnect key released");
                            return State::Closing {
                                session,
                                reason: CloseReason::Disconnect,
                            };
                        }
                        ControlSignal::Terminate => {
                            info!("kill chord received, shutting down");
                            self.shutdown.request();
                            return State::Closing {
                                session,
                                reason: CloseReason::Terminate,
                            };
                        }
                    }
                }
            }
            Err(e) => {
                warn!(peer = %session.peer, "waiting for input failed: {e}");
                std::thread::sleep(self.config.active_poll);
            }
        }

        if self.shutdown.is_requested() {
            return State::Closing {
                session,
                reason: CloseReason::Shutdown,
            };
        }
        State::Active(session)
    }

    fn close(&mut self, session: Session<T::Channel>, reason: CloseReason) -> State<T::Channel> {
        let Session {
            control,
            interrupt,
            peer,
        } = session;
        drop(interrupt);
        drop(control);
        info!(%peer, ?reason, "connection closed");

        if !self.shutdown.is_requested() && !self.config.cooldown.is_zero() {
            std::thread::sleep(self.config.cooldown);
        }
        State::Listening
    }

    /// Idle drain before each control accept.
    fn pump_idle(&mut self) {
        self.drain_without_session(self.config.idle_poll);
    }

    /// Translates every pending event without sending anything.
    ///
    /// Stops at the first pass with nothing ready.  Returns `true` if the
    /// kill chord was seen, in which case shutdown has been requested.
    fn drain_without_session(&mut self, timeout: Duration) -> bool {
        loop {
            match self.input.wait_ready(timeout) {
                Ok(0) => return false,
                Ok(_) => {}
                Err(e) => {
                    debug!("{e}");
                    return false;
                }
            }
            for event in self.input.read_ready() {
                if translate(&event, &mut self.keys).signal == ControlSignal::Terminate {
                    info!("kill chord received, shutting down");
                    self.shutdown.request();
                    return true;
                }
            }
        }
    }
}
