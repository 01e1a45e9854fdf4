//! Application layer use cases for the HID bridge.
//!
//! # What use cases does the bridge have?
//!
//! - **`session`** – The connection lifecycle.  Accepts one host at a time on
//!   the control and interrupt channels, feeds local input through the
//!   translator and sends the resulting reports.  The input sources and the
//!   Bluetooth listeners are injected behind traits, so the whole lifecycle
//!   runs against scripted fakes in tests.
//!
//! - **`service`** – Publishes the HID service record before the lifecycle
//!   starts and withdraws it afterwards.
//!
//! - **`shutdown`** – The process-wide "please stop" flag raised by signals
//!   and by the kill chord.

pub mod service;
pub mod session;
pub mod shutdown;
