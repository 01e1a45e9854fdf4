//! Raw L2CAP sockets (BlueZ `AF_BLUETOOTH` / `BTPROTO_L2CAP`).
//!
//! The standard library has no Bluetooth socket support, so the socket calls
//! go through `libc` and every descriptor is wrapped in an [`OwnedFd`] the
//! moment it exists.  Dropping a listener or channel closes it.

use std::fmt;
use std::io;
use std::mem::{size_of, zeroed};
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd};
use std::time::Duration;

use libc::{c_int, c_void, sockaddr, socklen_t};
use rustix::event::{poll, PollFd, PollFlags};
use tracing::{debug, warn};

use crate::application::session::{Channel, HidChannel, TransportError};

const BTPROTO_L2CAP: c_int = 0;

/// `struct sockaddr_l2` from `<bluetooth/l2cap.h>`.
#[repr(C)]
#[derive(Clone, Copy)]
struct SockaddrL2 {
    l2_family: libc::sa_family_t,
    /// Little-endian on the wire.
    l2_psm: u16,
    l2_bdaddr: [u8; 6],
    l2_cid: u16,
    l2_bdaddr_type: u8,
}

impl SockaddrL2 {
    fn any(psm: u16) -> Self {
        Self {
            l2_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            l2_psm: psm.to_le(),
            l2_bdaddr: [0; 6],
            l2_cid: 0,
            l2_bdaddr_type: 0,
        }
    }
}

/// A Bluetooth device address, stored little-endian as the kernel does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdAddr(pub [u8; 6]);

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

/// A bound, listening L2CAP socket on one PSM.
#[derive(Debug)]
pub struct L2capListener {
    fd: OwnedFd,
    channel: Channel,
    psm: u16,
}

impl L2capListener {
    /// Creates, binds and listens (backlog 1) on `psm` for any local adapter.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Socket`], [`TransportError::Bind`] or
    /// [`TransportError::Listen`] for the step that failed.
    pub fn bind(channel: Channel, psm: u16) -> Result<Self, TransportError> {
        // SAFETY: plain syscall; the result is checked before use.
        let raw = unsafe { libc::socket(libc::AF_BLUETOOTH, libc::SOCK_SEQPACKET, BTPROTO_L2CAP) };
        if raw < 0 {
            return Err(TransportError::Socket {
                channel,
                source: io::Error::last_os_error(),
            });
        }
        // SAFETY: `raw` is a freshly created descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        for opt in [libc::SO_REUSEADDR, libc::SO_REUSEPORT] {
            if let Err(e) = set_flag(&fd, opt) {
                warn!(%channel, "setsockopt({opt}) failed: {e}");
            }
        }

        let addr = SockaddrL2::any(psm);
        // SAFETY: `addr` is a valid sockaddr_l2 and the length matches it.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const SockaddrL2 as *const sockaddr,
                size_of::<SockaddrL2>() as socklen_t,
            )
        };
        if rc < 0 {
            return Err(TransportError::Bind {
                channel,
                psm,
                source: io::Error::last_os_error(),
            });
        }

        // SAFETY: `fd` is a valid bound socket.
        if unsafe { libc::listen(fd.as_raw_fd(), 1) } < 0 {
            return Err(TransportError::Listen {
                channel,
                source: io::Error::last_os_error(),
            });
        }

        debug!(%channel, psm, "listening");
        Ok(Self { fd, channel, psm })
    }

    pub fn psm(&self) -> u16 {
        self.psm
    }

    /// Waits up to `timeout` for a pending connection and accepts it.
    ///
    /// # Errors
    ///
    /// [`TransportError::Wait`] if the wait itself fails (fatal),
    /// [`TransportError::Accept`] if the connection cannot be accepted.
    pub fn accept(&self, timeout: Duration) -> Result<Option<L2capChannel>, TransportError> {
        let mut fds = [PollFd::new(&self.fd, PollFlags::IN)];
        let ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        match poll(&mut fds, ms) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(e) if e == rustix::io::Errno::INTR => return Ok(None),
            Err(e) => {
                return Err(TransportError::Wait {
                    channel: self.channel,
                    source: e.into(),
                })
            }
        }

        // SAFETY: an all-zero sockaddr_l2 is a valid value.
        let mut addr: SockaddrL2 = unsafe { zeroed() };
        let mut len = size_of::<SockaddrL2>() as socklen_t;
        // SAFETY: `addr`/`len` describe a writable buffer of the right size.
        let raw = unsafe {
            libc::accept(
                self.fd.as_raw_fd(),
                &mut addr as *mut SockaddrL2 as *mut sockaddr,
                &mut len,
            )
        };
        if raw < 0 {
            return Err(TransportError::Accept {
                channel: self.channel,
                source: io::Error::last_os_error(),
            });
        }
        // SAFETY: `raw` is a freshly accepted descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Some(L2capChannel {
            fd,
            channel: self.channel,
            peer: BdAddr(addr.l2_bdaddr),
        }))
    }
}

/// One accepted L2CAP connection.
#[derive(Debug)]
pub struct L2capChannel {
    fd: OwnedFd,
    channel: Channel,
    peer: BdAddr,
}

impl L2capChannel {
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl HidChannel for L2capChannel {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        // SAFETY: `frame` is a valid readable buffer of `frame.len()` bytes.
        let n = unsafe {
            libc::send(
                self.fd.as_raw_fd(),
                frame.as_ptr() as *const c_void,
                frame.len(),
                libc::MSG_NOSIGNAL,
            )
        };
        if n < 1 {
            return Err(TransportError::Send(io::Error::last_os_error()));
        }
        Ok(())
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}

fn set_flag(fd: &impl AsFd, opt: c_int) -> io::Result<()> {
    let one: c_int = 1;
    // SAFETY: `one` outlives the call and the length matches its type.
    let rc = unsafe {
        libc::setsockopt(
            fd.as_fd().as_raw_fd(),
            libc::SOL_SOCKET,
            opt,
            &one as *const c_int as *const c_void,
            size_of::<c_int>() as socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
