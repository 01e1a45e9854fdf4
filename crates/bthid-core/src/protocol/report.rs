//! HID input report types exchanged over the Bluetooth interrupt channel.
//!
//! Two fixed-layout reports exist: one for the mouse (report ID 1) and one for
//! the keyboard (report ID 2).  Both layouts are declared to the remote host
//! by [`REPORT_DESCRIPTOR`], which is published through the service record.
//! Any change here must be mirrored there byte-for-byte.

/// HIDP transaction header for a DATA frame on the input channel.
pub const DATA_FRAME: u8 = 0xA1;

/// Total encoded size of a mouse report, including frame marker and report ID.
pub const MOUSE_REPORT_LEN: usize = 6;

/// Total encoded size of a keyboard report, including frame marker and report ID.
pub const KEYBOARD_REPORT_LEN: usize = 11;

/// Number of simultaneous non-modifier keys a keyboard report can carry.
pub const KEY_SLOTS: usize = 8;

/// Report identifiers as declared by the `REPORT_ID` items of the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReportId {
    Mouse = 0x01,
    Keyboard = 0x02,
}

/// Keyboard modifier bitmask in HID bit order (bit `n` = usage `0xE0 + n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_META: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// Returns `true` if every bit in `mask` is set.
    pub fn contains(&self, mask: u8) -> bool {
        self.0 & mask == mask
    }
}

/// Mouse button bitmask.  Only the low three bits are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const MIDDLE: u8 = 1 << 2;
    pub const MASK: u8 = Self::LEFT | Self::RIGHT | Self::MIDDLE;
}

/// Report ID 1: three buttons plus relative X, Y and wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseReport {
    pub buttons: MouseButtons,
    pub dx: i8,
    pub dy: i8,
    pub wheel: i8,
}

/// Report ID 2: modifier byte plus up to eight held keys.
///
/// Empty slots hold 0x00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    pub modifiers: ModifierFlags,
    pub keys: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// A report with every key and modifier released.
    pub const RELEASED: KeyboardReport = KeyboardReport {
        modifiers: ModifierFlags(0),
        keys: [0; KEY_SLOTS],
    };
}

/// One HID input report ready to be framed and sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidReport {
    Mouse(MouseReport),
    Keyboard(KeyboardReport),
}

/// HID report descriptor advertised in the service record (attribute 0x0206).
///
/// Collection 1: mouse, report ID 1, 3 buttons + 5 bits padding, X/Y/wheel as
/// signed bytes.  Collection 2: keyboard, report ID 2, 8 modifier bits followed
/// by an 8-byte key array with usages 0x00–0x65.
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Buttons)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x75, 0x05, //     Report Size (5)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x01, //     Input (Constant)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //         End Collection
    0xC0, //       End Collection
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x07, //     Usage Page (Keyboard)
    0x19, 0xE0, //     Usage Minimum (224)
    0x29, 0xE7, //     Usage Maximum (231)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x08, //     Report Count (8)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x08, //     Report Count (8)
    0x75, 0x08, //     Report Size (8)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x65, //     Logical Maximum (101)
    0x05, 0x07, //     Usage Page (Keyboard)
    0x19, 0x00, //     Usage Minimum (0)
    0x29, 0x65, //     Usage Maximum (101)
    0x81, 0x00, //     Input (Data, Array)
    0xC0, //         End Collection
    0xC0, //       End Collection
];

/// Returns the descriptor as the uppercase hex string embedded in SDP XML.
pub fn report_descriptor_hex() -> String {
    REPORT_DESCRIPTOR
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}
