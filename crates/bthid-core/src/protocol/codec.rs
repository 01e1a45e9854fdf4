//! Binary codec for the two HID input reports.
//!
//! Wire format:
//! ```text
//! mouse:    [0xA1][0x01][buttons:1][dx:i8][dy:i8][wheel:i8]          6 bytes
//! keyboard: [0xA1][0x02][modifiers:1][key0..key7:8]                 11 bytes
//! ```
//! Encoding is infallible: every field already has its wire width.

use crate::protocol::report::{
    HidReport, MouseButtons, ReportId, DATA_FRAME, KEYBOARD_REPORT_LEN, KEY_SLOTS,
    MOUSE_REPORT_LEN,
};

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a mouse report into its 6-byte frame.
///
/// Buttons above bit 2 are masked off.
///
/// # Examples
///
/// ```rust
/// use bthid_core::protocol::encode_mouse;
///
/// assert_eq!(encode_mouse(0b001, 5, 0, 0), [0xA1, 0x01, 0x01, 0x05, 0x00, 0x00]);
/// ```
pub fn encode_mouse(buttons: u8, dx: i8, dy: i8, wheel: i8) -> [u8; MOUSE_REPORT_LEN] {
    [
        DATA_FRAME,
        ReportId::Mouse as u8,
        buttons & MouseButtons::MASK,
        dx as u8,
        dy as u8,
        wheel as u8,
    ]
}

/// Encodes a keyboard report into its 11-byte frame.
///
/// # Examples
///
/// ```rust
/// use bthid_core::protocol::encode_keyboard;
///
/// let frame = encode_keyboard(0x02, [0x04, 0, 0, 0, 0, 0, 0, 0]);
/// assert_eq!(frame[..4], [0xA1, 0x02, 0x02, 0x04]);
/// ```
pub fn encode_keyboard(modifiers: u8, keys: [u8; KEY_SLOTS]) -> [u8; KEYBOARD_REPORT_LEN] {
    let mut buf = [0u8; KEYBOARD_REPORT_LEN];
    buf[0] = DATA_FRAME;
    buf[1] = ReportId::Keyboard as u8;
    buf[2] = modifiers;
    buf[3..].copy_from_slice(&keys);
    buf
}

impl HidReport {
    /// Encodes this report into a freshly allocated frame.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            HidReport::Mouse(m) => encode_mouse(m.buttons.0, m.dx, m.dy, m.wheel).to_vec(),
            HidReport::Keyboard(k) => encode_keyboard(k.modifiers.0, k.keys).to_vec(),
        }
    }
}
