//! Domain logic for the HID bridge.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from OS APIs, sockets, D-Bus or device files.
//! - Can be compiled and tested on any machine without a Bluetooth adapter.
//!
//! Here the domain is the journey of a single input event: parsed from a
//! kernel record ([`input_event`]), folded into the held-key picture
//! ([`key_state`]), and turned into a HID report plus a control signal
//! ([`translator`]).

pub mod input_event;
pub mod key_state;
pub mod translator;
