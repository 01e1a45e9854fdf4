//! # bthid-core
//!
//! Platform-independent heart of the Bluetooth HID bridge: the report codec,
//! the key/button state tracker, and the event translator.
//!
//! It has no dependencies on sockets, device files or D-Bus; those live in
//! `bthid-client`.
//!
//! # Architecture overview (for beginners)
//!
//! The bridge makes a Linux machine look like a Bluetooth keyboard and mouse.
//! Physical input events are read from the kernel, converted into the compact
//! binary *reports* that the HID standard defines, and streamed to a remote
//! computer that believes it is talking to ordinary Bluetooth peripherals.
//!
//! - **`protocol`** – The two report layouts (mouse and keyboard), their byte
//!   encoding, and the report descriptor that announces them to the host.
//!
//! - **`domain`** – Pure logic: parsing kernel input records, tracking which
//!   keys and buttons are held, and translating one event into one report.
//!
//! - **`keymap`** – The table converting Linux key codes into USB HID Usage IDs.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root.
pub use domain::input_event::{EventKind, RawInputEvent, RECORD_SIZE};
pub use domain::key_state::KeyState;
pub use domain::translator::{translate, ControlSignal, Translation};
pub use keymap::hid::HidKeyCode;
pub use protocol::codec::{encode_keyboard, encode_mouse};
pub use protocol::report::{HidReport, KeyboardReport, MouseReport};
