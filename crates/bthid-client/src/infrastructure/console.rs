//! Discarding keystrokes the local console buffered while they were forwarded.
//!
//! When the forwarded keyboard is also the console keyboard, everything typed
//! for the remote host is echoed into this terminal's input queue too.  If it
//! were left there the shell would execute it after we exit.

use std::io;
use std::os::fd::AsFd;

use rustix::event::{poll, PollFd, PollFlags};
use tracing::debug;

/// Reads and drops whatever is pending on stdin, if stdin is a terminal.
pub fn discard_pending_stdin() {
    let stdin = io::stdin();
    let fd = stdin.as_fd();
    if !rustix::termios::isatty(fd) {
        return;
    }
    match drain(fd) {
        Ok(0) => {}
        Ok(n) => debug!(bytes = n, "discarded pending console input"),
        Err(e) => debug!("console cleanup failed: {e}"),
    }
}

/// Reads from `fd` until nothing is immediately readable.  Returns the byte count.
fn drain(fd: impl AsFd) -> rustix::io::Result<usize> {
    let mut buf = [0u8; 256];
    let mut total = 0;
    loop {
        let mut fds = [PollFd::new(&fd, PollFlags::IN)];
        if poll(&mut fds, 0)? == 0 || !fds[0].revents().contains(PollFlags::IN) {
            return Ok(total);
        }
        match rustix::io::read(&fd, &mut buf)? {
            0 => return Ok(total),
            n => total += n,
        }
    }
}
