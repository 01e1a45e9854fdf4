//! Key code translation tables.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Linux evdev key codes are translated to HID at the ingestion boundary.

pub mod evdev;
pub mod hid;

pub use hid::HidKeyCode;
