//! Input ingestion: event devices or a FIFO, multiplexed with `poll(2)`.
//!
//! Two mutually exclusive configurations exist:
//!
//! - **Devices**: `/dev/input/eventN` nodes, each opened independently.  A node
//!   that cannot be opened is logged and skipped; only an empty result is fatal.
//! - **FIFO**: a single named pipe carrying the same `struct input_event`
//!   records, so other programs can inject input.  Created on demand.
//!
//! Every source is non-blocking.  [`SourceSet::wait_ready`] blocks once across
//! all of them, and [`SourceSet::read_ready`] then reads exactly one record
//! from each source that was reported readable.
//!
//! # Why keep a write end on the FIFO? (for beginners)
//!
//! When the last writer closes a pipe, `poll` reports the read end as
//! hung up and keeps reporting it, forever, until someone reopens it for
//! writing.  The loop would spin at 100% CPU.  Holding our own idle write
//! end means there is always a writer, so the pipe never hangs up.

pub mod mock;

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bthid_core::{RawInputEvent, RECORD_SIZE};
use rustix::event::{poll, PollFd, PollFlags};
use tracing::{debug, info, trace, warn};

use crate::application::session::{InputError, InputMultiplexer};

/// Highest number of event devices considered (`event0` … `event63`).
pub const MAX_EVENT_DEVICES: u8 = 64;

/// What an [`InputSource`] reads from.
#[derive(Debug)]
pub enum SourceKind {
    Device {
        index: u8,
        /// Kernel-reported device name, used for X11 muting.
        name: Option<String>,
    },
    Fifo {
        /// Idle write end; never written to.
        _writer: File,
    },
}

/// One open, readable input handle.
#[derive(Debug)]
pub struct InputSource {
    path: PathBuf,
    file: File,
    kind: SourceKind,
}

enum ReadOutcome {
    Event(RawInputEvent),
    Nothing,
    Gone(io::Error),
}

impl InputSource {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Device name, if this is an event device whose name could be read.
    pub fn device_name(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::Device { name, .. } => name.as_deref(),
            SourceKind::Fifo { .. } => None,
        }
    }

    fn read_record(&mut self) -> ReadOutcome {
        let mut buf = [0u8; RECORD_SIZE];
        match self.file.read(&mut buf) {
            Ok(0) => {
                trace!(path = %self.path.display(), "empty read");
                ReadOutcome::Nothing
            }
            Ok(n) if n < RECORD_SIZE => {
                trace!(path = %self.path.display(), got = n, "dropping partial input record");
                ReadOutcome::Nothing
            }
            Ok(_) => match RawInputEvent::from_record(&buf) {
                Some(event) => ReadOutcome::Event(event),
                None => ReadOutcome::Nothing,
            },
            Err(e) if e.raw_os_error() == Some(libc::ENODEV) => ReadOutcome::Gone(e),
            Err(e) => {
                if e.kind() != io::ErrorKind::WouldBlock && e.kind() != io::ErrorKind::Interrupted {
                    debug!(path = %self.path.display(), "read failed: {e}");
                }
                ReadOutcome::Nothing
            }
        }
    }
}

/// The set of open input sources.
#[derive(Debug)]
pub struct SourceSet {
    sources: Vec<InputSource>,
    ready: Vec<usize>,
}

impl SourceSet {
    /// Opens event devices under `dir`.
    ///
    /// With an empty `indices`, every `event0`…`event63` that exists is tried.
    /// Otherwise only the listed indices are, each at most once, and each
    /// failure is reported.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NoSources`] if nothing could be opened.
    pub fn open_devices(dir: &Path, indices: &[u8]) -> Result<Self, InputError> {
        let explicit = !indices.is_empty();
        let candidates: Vec<u8> = if explicit {
            // A node opened twice delivers every event twice.
            let mut unique = indices.to_vec();
            unique.sort_unstable();
            unique.dedup();
            unique
        } else {
            (0..MAX_EVENT_DEVICES).collect()
        };

        let mut sources = Vec::new();
        for index in candidates {
            let path = dir.join(format!("event{index}"));
            match open_nonblocking(&path) {
                Ok(file) => {
                    let name = device_name(&path);
                    info!(
                        path = %path.display(),
                        name = name.as_deref().unwrap_or("?"),
                        "opened event device"
                    );
                    sources.push(InputSource {
                        path,
                        file,
                        kind: SourceKind::Device { index, name },
                    });
                }
                Err(e) if !explicit && e.kind() == io::ErrorKind::NotFound => {
                    trace!(path = %path.display(), "no such device");
                }
                Err(e) => warn!(path = %path.display(), "skipping input device: {e}"),
            }
        }

        if sources.is_empty() {
            return Err(InputError::NoSources);
        }
        Ok(Self::from_sources(sources))
    }

    /// Opens (creating if absent) the FIFO at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NotAFifo`] if `path` is some other kind of file,
    /// or an open/create error.
    pub fn open_fifo(path: &Path) -> Result<Self, InputError> {
        let shown = path.display().to_string();
        match std::fs::metadata(path) {
            Ok(meta) if !meta.file_type().is_fifo() => return Err(InputError::NotAFifo(shown)),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                make_fifo(path).map_err(|source| InputError::CreateFifo {
                    path: shown.clone(),
                    source,
                })?;
                info!(path = %shown, "created fifo");
            }
            Err(source) => {
                return Err(InputError::Open {
                    path: shown,
                    source,
                })
            }
        }

        let open_err = |source: io::Error| InputError::Open {
            path: shown.clone(),
            source,
        };
        let file = open_nonblocking(path).map_err(open_err)?;
        // The read end is already open, so this cannot fail with ENXIO.
        let writer = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(open_err)?;
        info!(path = %shown, "opened fifo for reading");

        Ok(Self::from_sources(vec![InputSource {
            path: path.to_path_buf(),
            file,
            kind: SourceKind::Fifo { _writer: writer },
        }]))
    }

    fn from_sources(sources: Vec<InputSource>) -> Self {
        Self {
            sources,
            ready: Vec::new(),
        }
    }

    pub fn sources(&self) -> &[InputSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl InputMultiplexer for SourceSet {
    fn wait_ready(&mut self, timeout: Duration) -> Result<usize, InputError> {
        self.ready.clear();
        let mut fds: Vec<PollFd<'_>> = self
            .sources
            .iter()
            .map(|s| PollFd::new(&s.file, PollFlags::IN))
            .collect();

        match poll(&mut fds, poll_timeout_ms(timeout)) {
            Ok(0) => return Ok(0),
            Ok(_) => {}
            Err(e) if e == rustix::io::Errno::INTR => return Ok(0),
            Err(e) => return Err(InputError::Wait(e.into())),
        }

        let wake = PollFlags::IN | PollFlags::HUP | PollFlags::ERR;
        self.ready = fds
            .iter()
            .enumerate()
            .filter(|(_, fd)| fd.revents().intersects(wake))
            .map(|(i, _)| i)
            .collect();
        Ok(self.ready.len())
    }

    fn read_ready(&mut self) -> Vec<RawInputEvent> {
        let mut events = Vec::with_capacity(self.ready.len());
        let mut gone = Vec::new();
        for &i in &self.ready {
            match self.sources[i].read_record() {
                ReadOutcome::Event(event) => events.push(event),
                ReadOutcome::Nothing => {}
                ReadOutcome::Gone(e) => gone.push((i, e)),
            }
        }
        self.ready.clear();

        // Indices ascend, so removing from the back keeps the rest valid.
        for (i, e) in gone.into_iter().rev() {
            let source = self.sources.remove(i);
            warn!(path = %source.path.display(), "input device went away: {e}");
        }
        events
    }
}

/// Rounds up so that sub-millisecond waits still block briefly instead of spinning.
fn poll_timeout_ms(timeout: Duration) -> i32 {
    if timeout.is_zero() {
        return 0;
    }
    let ms = timeout.as_micros().div_ceil(1000);
    i32::try_from(ms).unwrap_or(i32::MAX)
}

fn open_nonblocking(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

fn make_fifo(path: &Path) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), libc::S_IRUSR | libc::S_IWUSR) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn device_name(path: &Path) -> Option<String> {
    evdev::Device::open(path)
        .ok()
        .and_then(|d| d.name().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bthid-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_poll_timeout_rounds_sub_millisecond_up() {
        assert_eq!(poll_timeout_ms(Duration::ZERO), 0);
        assert_eq!(poll_timeout_ms(Duration::from_micros(500)), 1);
        assert_eq!(poll_timeout_ms(Duration::from_millis(1000)), 1000);
        assert_eq!(poll_timeout_ms(Duration::from_secs(u64::MAX)), i32::MAX);
    }

    #[test]
    fn test_open_devices_with_nothing_present_is_no_sources() {
        let dir = temp_dir("nodev");
        let err = SourceSet::open_devices(&dir, &[]).unwrap_err();
        assert!(matches!(err, InputError::NoSources));
    }

    #[test]
    fn test_open_devices_opens_repeated_index_once() {
        // Arrange
        let dir = temp_dir("dupdev");
        std::fs::write(dir.join("event0"), b"").unwrap();
        std::fs::write(dir.join("event2"), b"").unwrap();

        // Act
        let set = SourceSet::open_devices(&dir, &[2, 0, 2, 0]).unwrap();

        // Assert
        let paths: Vec<PathBuf> = set.sources().iter().map(|s| s.path().to_path_buf()).collect();
        assert_eq!(paths, vec![dir.join("event0"), dir.join("event2")]);
    }

    #[test]
    fn test_open_fifo_rejects_regular_file() {
        // Arrange
        let dir = temp_dir("notfifo");
        let path = dir.join("plain");
        std::fs::write(&path, b"x").unwrap();

        // Act
        let err = SourceSet::open_fifo(&path).unwrap_err();

        // Assert
        assert!(matches!(err, InputError::NotAFifo(_)));
    }

    #[test]
    fn test_fifo_delivers_whole_records_and_drops_partial_ones() {
        // Arrange
        let dir = temp_dir("fifo");
        let path = dir.join("input");
        let mut set = SourceSet::open_fifo(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().file_type().is_fifo());
        let mut writer = OpenOptions::new().write(true).open(&path).unwrap();

        // Act
        writer.write_all(&RawInputEvent::key_down(30).to_record()).unwrap();
        let ready = set.wait_ready(Duration::from_millis(200)).unwrap();
        let events = set.read_ready();

        // Assert
        assert_eq!(ready, 1);
        assert_eq!(events, vec![RawInputEvent::key_down(30)]);

        // A partial record is read and discarded.
        writer.write_all(&[0u8; 3]).unwrap();
        assert_eq!(set.wait_ready(Duration::from_millis(200)).unwrap(), 1);
        assert!(set.read_ready().is_empty());
    }

    #[test]
    fn test_fifo_does_not_report_ready_after_writer_closes() {
        let dir = temp_dir("fifohup");
        let path = dir.join("input");
        let mut set = SourceSet::open_fifo(&path).unwrap();

        drop(OpenOptions::new().write(true).open(&path).unwrap());

        assert_eq!(set.wait_ready(Duration::from_millis(20)).unwrap(), 0);
    }
}
