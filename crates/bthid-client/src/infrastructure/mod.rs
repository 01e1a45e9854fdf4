//! Infrastructure layer for the HID bridge.
//!
//! Contains the OS-facing adapters: Linux input devices, raw Bluetooth
//! sockets, the BlueZ D-Bus API, the `xinput` tool and the config file.
//!
//! **Dependency rule**: this layer may depend on `application` and `bthid_core`,
//! but MUST NOT be imported by the `application` or domain layers (tests and
//! the in-tree mocks excepted).
//!
//! # Sub-modules
//!
//! - **`input`** – Event devices and the named pipe, multiplexed with `poll(2)`.
//!   Implements `InputMultiplexer`.  A scripted mock is provided for tests.
//!
//! - **`bluetooth`** – The two listening L2CAP sockets.  Implements
//!   `HidTransport`, again with a mock.
//!
//! - **`sdp`** – The HID service record and its registration with BlueZ.
//!
//! - **`devices`** – The `--list` inventory of event devices.
//!
//! - **`xinput`** – Disabling forwarded devices in the local X session.
//!
//! - **`console`** – Dropping console input typed while it was being forwarded.
//!
//! - **`storage`** – TOML configuration.

pub mod bluetooth;
pub mod console;
pub mod devices;
pub mod input;
pub mod sdp;
pub mod storage;
pub mod xinput;
