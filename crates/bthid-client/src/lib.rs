//! bthid-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does bthid-client do? (for beginners)
//!
//! It turns this Linux machine into a Bluetooth keyboard and mouse.  A remote
//! computer (the *host*) pairs with it like with any other HID peripheral,
//! and whatever is typed or moved on the local input devices arrives at the
//! host.
//!
//! The client application:
//!
//! 1. Opens the local event devices (or a named pipe carrying the same
//!    records).
//! 2. Registers a HID service record with BlueZ so hosts can discover it.
//! 3. Listens on the HID control and interrupt L2CAP channels.
//! 4. Once a host is connected, translates every input event into a HID
//!    keyboard or mouse report (see `bthid_core`) and sends it on the
//!    interrupt channel.
//! 5. Drops the host when PAUSE is released and exits on
//!    LeftCtrl+LeftAlt+PAUSE or a termination signal.

/// Application layer: the session lifecycle and its collaborators' traits.
pub mod application;

/// Infrastructure layer: devices, sockets, D-Bus and configuration.
pub mod infrastructure;
