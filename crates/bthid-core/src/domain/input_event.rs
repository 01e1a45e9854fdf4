//! Raw input events as delivered by the Linux input subsystem.
//!
//! Each read from `/dev/input/eventN` (or from the FIFO, which carries the
//! same records) yields whole `struct input_event` records:
//!
//! ```text
//! [tv_sec: c_long][tv_usec: c_long][type: u16][code: u16][value: i32]
//! ```
//!
//! All fields are native-endian.  The timestamp is ignored.

use std::ffi::c_long;
use std::mem::size_of;

/// Size in bytes of one `struct input_event` on this platform.
pub const RECORD_SIZE: usize = 2 * size_of::<c_long>() + 8;

// ── Event type codes ──────────────────────────────────────────────────────────

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;

// ── Relative axes ─────────────────────────────────────────────────────────────

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_Z: u16 = 0x02;
pub const REL_WHEEL: u16 = 0x08;

// ── Key codes with special handling ───────────────────────────────────────────

pub const KEY_LEFTCTRL: u16 = 29;
pub const KEY_LEFTALT: u16 = 56;
pub const KEY_PAUSE: u16 = 119;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;

// ── Key values ────────────────────────────────────────────────────────────────

pub const KEY_RELEASED: i32 = 0;
pub const KEY_PRESSED: i32 = 1;
pub const KEY_REPEATED: i32 = 2;

/// Coarse classification of an input event's type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Key,
    RelativeMove,
    Sync,
    /// Any other type (absolute axes, misc, LEDs ...), kept for logging.
    Other(u16),
}

impl EventKind {
    pub fn from_type(ev_type: u16) -> Self {
        match ev_type {
            EV_SYN => EventKind::Sync,
            EV_KEY => EventKind::Key,
            EV_REL => EventKind::RelativeMove,
            other => EventKind::Other(other),
        }
    }

    pub fn as_type(self) -> u16 {
        match self {
            EventKind::Sync => EV_SYN,
            EventKind::Key => EV_KEY,
            EventKind::RelativeMove => EV_REL,
            EventKind::Other(t) => t,
        }
    }
}

/// One input event, stripped of its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInputEvent {
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

impl RawInputEvent {
    pub fn new(kind: EventKind, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }

    /// Key press (`value == 1`) of the given evdev key code.
    pub fn key_down(code: u16) -> Self {
        Self::new(EventKind::Key, code, KEY_PRESSED)
    }

    /// Key release (`value == 0`) of the given evdev key code.
    pub fn key_up(code: u16) -> Self {
        Self::new(EventKind::Key, code, KEY_RELEASED)
    }

    /// Relative motion along `axis`.
    pub fn relative(axis: u16, delta: i32) -> Self {
        Self::new(EventKind::RelativeMove, axis, delta)
    }

    /// Parses one record.
    ///
    /// Returns `None` unless `bytes` is exactly [`RECORD_SIZE`] long; partial
    /// records are malformed and dropped by the caller.
    pub fn from_record(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != RECORD_SIZE {
            return None;
        }
        let tail = &bytes[RECORD_SIZE - 8..];
        let ev_type = u16::from_ne_bytes([tail[0], tail[1]]);
        let code = u16::from_ne_bytes([tail[2], tail[3]]);
        let value = i32::from_ne_bytes([tail[4], tail[5], tail[6], tail[7]]);
        Some(Self::new(EventKind::from_type(ev_type), code, value))
    }

    /// Serialises this event as a record with a zero timestamp.
    pub fn to_record(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        let tail = &mut buf[RECORD_SIZE - 8..];
        tail[0..2].copy_from_slice(&self.kind.as_type().to_ne_bytes());
        tail[2..4].copy_from_slice(&self.code.to_ne_bytes());
        tail[4..8].copy_from_slice(&self.value.to_ne_bytes());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_size_matches_kernel_layout() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(RECORD_SIZE, 24);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(RECORD_SIZE, 16);
    }

    #[test]
    fn test_from_record_reads_type_code_value() {
        // Arrange
        let mut record = [0u8; RECORD_SIZE];
        record[0] = 0xAA; // timestamp bytes are ignored
        let tail = RECORD_SIZE - 8;
        record[tail..tail + 2].copy_from_slice(&EV_REL.to_ne_bytes());
        record[tail + 2..tail + 4].copy_from_slice(&REL_Y.to_ne_bytes());
        record[tail + 4..].copy_from_slice(&(-3i32).to_ne_bytes());

        // Act
        let event = RawInputEvent::from_record(&record).unwrap();

        // Assert
        assert_eq!(event, RawInputEvent::relative(REL_Y, -3));
    }

    #[test]
    fn test_partial_record_is_rejected() {
        let record = RawInputEvent::key_down(30).to_record();
        assert_eq!(RawInputEvent::from_record(&record[..RECORD_SIZE - 1]), None);
        assert_eq!(RawInputEvent::from_record(&[]), None);
    }

    #[test]
    fn test_unknown_event_type_is_other() {
        let event = RawInputEvent::new(EventKind::from_type(0x03), 0, 100);
        assert_eq!(event.kind, EventKind::Other(0x03));
        assert_eq!(event.kind.as_type(), 0x03);
    }
}
